//! # Escalonador de threads de kernel (multi-core)
//!
//! Coordena as transições de estado das threads (Ready, Running, Blocked,
//! Dying) e decide quem ocupa cada núcleo.
//!
//! ## Mecanismos de Execução:
//! - **Cooperativo:** threads cedem o núcleo via `yield_now()`, `block()`,
//!   `sleep()` ou `exit()`.
//! - **Preemptivo:** o kernel chama `tick()` no timer e `yield_now()` na
//!   saída da interrupção.
//!
//! ## Sincronização:
//! Um lock por lista (todas as threads, prontos de cada núcleo, sleep) mais
//! o lock de IDs. Nenhum caminho segura dois deles ao mesmo tempo, e nenhum
//! lock atravessa uma troca de contexto. `yield_now()` exige interrupções
//! desabilitadas.

use spin::Once;

use super::cpu::CpuSlot;
use super::idle;
use super::runqueue::{QueueLink, ThreadQueue};
use super::sleep_queue::{SleepQueue, SweepStep};
use super::switch;
use crate::arch::irq::{self, InterruptGuard};
use crate::arch::traits::CpuOps;
use crate::arch::{Cpu, CpuContext};
use crate::core::smp::percpu::{PerCpu, MAX_CPUS};
use crate::klib::list::NodeId;
use crate::mm::UnitAllocator;
use crate::sched::config::{
    millis_to_ticks, ReadyPolicy, SchedConfig, PRIORITY_IDLE, TIMEKEEPER_CPU,
};
use crate::sched::thread::{unit, Thread, ThreadEntry, ThreadParams, ThreadRef, ThreadStatus, ThreadTable};
use crate::sync::Spinlock;
use crate::sys::{CoreId, Errno, Tid};

/// O escalonador.
///
/// O kernel usa uma única instância estática (`KERNEL_SCHED`); os testes
/// criam instâncias próprias.
pub struct Scheduler {
    config: Once<SchedConfig>,
    units: Once<&'static dyn UnitAllocator>,
    /// Próximo TID (lock de IDs)
    next_tid: Spinlock<u64>,
    pub(crate) table: ThreadTable,
    /// Todas as threads vivas
    pub(crate) all: ThreadQueue,
    pub(crate) ready: PerCpu<ThreadQueue>,
    pub(crate) sleep: Spinlock<SleepQueue>,
    pub(crate) cpus: PerCpu<CpuSlot>,
}

impl Scheduler {
    pub const fn new() -> Self {
        Self {
            config: Once::new(),
            units: Once::new(),
            next_tid: Spinlock::new("tid", 1),
            table: ThreadTable::new(),
            all: ThreadQueue::new("all", QueueLink::All),
            ready: PerCpu::new([const { ThreadQueue::new("ready", QueueLink::Ready) }; MAX_CPUS]),
            sleep: Spinlock::new("sleep", SleepQueue::new()),
            cpus: PerCpu::new([const { CpuSlot::new() }; MAX_CPUS]),
        }
    }

    // =========================================================================
    // INICIALIZAÇÃO
    // =========================================================================

    /// Registra a configuração e o alocador de unidades e cria uma thread
    /// idle por núcleo. Só pode ser chamado uma vez.
    pub fn init(&'static self, config: SchedConfig, units: &'static dyn UnitAllocator) {
        if !config.is_valid() {
            crate::kfatal!("(Sched) número de núcleos inválido: ", config.cpus);
        }

        let mut first = false;
        self.config.call_once(|| {
            first = true;
            config
        });
        if !first {
            crate::kfatal!("(Sched) thread_init chamado duas vezes");
        }
        self.units.call_once(|| units);

        crate::kinfo!("(Sched) Inicializando escalonador. Núcleos=", config.cpus);

        for core in 0..config.cpus {
            let core = CoreId(core as u32);
            let thread = match self.spawn(
                "idle",
                PRIORITY_IDLE,
                idle::idle_entry,
                self as *const Scheduler as usize,
                Some(core),
            ) {
                Ok(thread) => thread,
                Err(err) => crate::kfatal!("(Sched) sem unidade para a thread idle: ", err.as_usize()),
            };
            self.all.push_back(&self.table, thread.slot());
            self.cpus.get_for(core).set_idle(thread.slot());
            crate::kdebug!("(Idle) idle criada para o núcleo ", core.index());
        }

        #[cfg(feature = "self_test")]
        crate::sched::test::run_self_tests();

        crate::kok!("(Sched) Escalonador pronto");
    }

    /// Configuração registrada em `init`.
    pub fn config(&self) -> SchedConfig {
        match self.config.get() {
            Some(config) => *config,
            None => crate::kfatal!("(Sched) escalonador usado antes de thread_init"),
        }
    }

    pub(crate) fn units(&self) -> &'static dyn UnitAllocator {
        match self.units.get() {
            Some(units) => *units,
            None => crate::kfatal!("(Sched) escalonador usado antes de thread_init"),
        }
    }

    // =========================================================================
    // CRIAÇÃO
    // =========================================================================

    /// Cria uma thread pronta para rodar `entry(arg)`.
    ///
    /// Retorna `ENOMEM` se não há unidade livre e `EAGAIN` se a tabela de
    /// threads está cheia. Nada fica visível em caso de erro.
    pub fn create(
        &'static self,
        name: &str,
        priority: i32,
        entry: ThreadEntry,
        arg: usize,
    ) -> Result<ThreadRef, Errno> {
        let thread = self.spawn(name, priority, entry, arg, None)?;

        self.all.push_back(&self.table, thread.slot());
        self.ready_queue(thread.home_cpu())
            .push_back(&self.table, thread.slot());

        crate::kinfo!("(Sched) Thread criada TID=", thread.tid().as_u64());
        Ok(ThreadRef::new(thread.slot(), thread.tid()))
    }

    /// Aloca a unidade, reserva o slot, atribui o TID, monta o TCB e o
    /// publica na tabela. Não enfileira.
    fn spawn(
        &'static self,
        name: &str,
        priority: i32,
        entry: ThreadEntry,
        arg: usize,
        idle_of: Option<CoreId>,
    ) -> Result<&'static Thread, Errno> {
        let units = self.units();

        let Some(base) = units.alloc_unit() else {
            crate::kwarn!("(Sched) create: sem memória");
            return Err(Errno::ENOMEM);
        };

        let Some(slot) = self.table.reserve() else {
            crate::kwarn!("(Sched) create: tabela de threads cheia");
            // SAFETY: a unidade ainda não foi usada
            unsafe { units.free_unit(base) };
            return Err(Errno::EAGAIN);
        };

        let tid = self.allocate_tid();
        let home_cpu = idle_of.unwrap_or_else(|| self.home_for_new(tid));

        let thread = Thread::new(ThreadParams {
            tid,
            slot,
            name,
            priority,
            entry,
            arg,
            home_cpu,
            idle: idle_of.is_some(),
        });

        // SAFETY: unidade nova, exclusiva, ainda não publicada
        let tcb = unsafe { unit::install(base, thread) };
        // SAFETY: ainda não publicado; só este caminho toca no TCB
        let thread = unsafe { &*tcb.as_ptr() };
        unsafe {
            (*thread.context_ptr()).prepare(
                unit::stack_top(base),
                self as *const Scheduler as u64,
                thread.entry() as usize as u64,
                thread.arg() as u64,
            );
        }

        self.table.publish(slot, tcb);
        Ok(thread)
    }

    fn allocate_tid(&self) -> Tid {
        let mut next = self.next_tid.lock();
        let tid = Tid(*next);
        *next += 1;
        tid
    }

    /// Núcleo de origem de uma thread nova.
    fn home_for_new(&self, tid: Tid) -> CoreId {
        let config = self.config();
        match config.ready_policy {
            ReadyPolicy::PerCore => CoreId((tid.as_u64() % config.cpus as u64) as u32),
            ReadyPolicy::Shared => CoreId::BSP,
        }
    }

    /// Fila de prontos que atende `core` sob a política configurada.
    pub(crate) fn ready_queue(&self, core: CoreId) -> &ThreadQueue {
        match self.config().ready_policy {
            ReadyPolicy::PerCore => self.ready.get_for(core),
            ReadyPolicy::Shared => self.ready.get_for(CoreId::BSP),
        }
    }

    // =========================================================================
    // ESCALONAMENTO
    // =========================================================================

    pub(crate) fn thread(&self, slot: NodeId) -> &Thread {
        match self.table.get(slot) {
            Some(thread) => thread,
            None => crate::kfatal!("(Sched) slot sem thread: ", slot),
        }
    }

    fn current_thread(&self) -> Option<&Thread> {
        self.cpus.get().current().map(|slot| self.thread(slot))
    }

    fn current_or_fatal(&self) -> &Thread {
        match self.current_thread() {
            Some(thread) => thread,
            None => crate::kfatal!("(Sched) núcleo sem thread corrente (start() não chamado)"),
        }
    }

    /// Próxima thread para este núcleo: a frente da fila de prontos, ou a
    /// idle do núcleo se a fila estiver vazia.
    pub(crate) fn get_ready(&self) -> NodeId {
        let core = Cpu::current_id();
        if let Some(slot) = self.ready_queue(core).pop_front(&self.table) {
            return slot;
        }
        match self.cpus.get_for(core).idle() {
            Some(idle) => idle,
            None => crate::kfatal!("(Sched) núcleo sem thread idle: ", core.index()),
        }
    }

    /// Cede o núcleo.
    ///
    /// Exige interrupções desabilitadas e nenhum spinlock seguro. Se a
    /// thread atual ainda está RUNNING ela volta para o fim da fila deste
    /// núcleo; se não há mais ninguém pronto ela continua rodando.
    pub fn yield_now(&self) {
        if Cpu::are_interrupts_enabled() {
            crate::kfatal!("(Sched) yield com interrupções habilitadas");
        }
        let held = irq::locks_held();
        if held != 0 {
            crate::kfatal!("(Sched) yield segurando spinlocks: ", held);
        }

        let cur = self.current_or_fatal();
        let next_slot = self.get_ready();

        if next_slot == cur.slot() {
            // Desbloqueada e reenfileirada antes de sair do núcleo
            cur.set_status(ThreadStatus::Running);
            return;
        }

        let next = self.thread(next_slot);
        let cur_running = cur.status() == ThreadStatus::Running;

        // A idle é só fallback: quem ainda pode rodar continua
        if next.is_idle() && cur_running && !cur.is_idle() {
            return;
        }

        if cur_running {
            cur.set_status(ThreadStatus::Ready);
            if !cur.is_idle() {
                let core = Cpu::current_id();
                cur.set_home_cpu(core);
                self.ready_queue(core).push_back(&self.table, cur.slot());
            }
        }

        switch::switch_to(self, cur, next);
    }

    /// Bloqueia a thread atual até um `unblock`.
    pub fn block(&self) {
        let _irq = InterruptGuard::new();
        let cur = self.current_or_fatal();
        if cur.is_idle() {
            crate::kfatal!("(Sched) block na thread idle");
        }

        crate::kdebug!("(Sched) block TID=", cur.tid().as_u64());
        cur.set_status(ThreadStatus::Blocked);
        self.yield_now();
    }

    /// Torna `target` pronta de novo. Cancela um sleep pendente.
    ///
    /// Pode ser chamado de qualquer núcleo ou de contexto de interrupção.
    /// Handle obsoleto ou thread fora de BLOCKED é fatal.
    pub fn unblock(&self, target: ThreadRef) {
        let Some(thread) = self.table.resolve(target) else {
            crate::kfatal!("(Sched) unblock de handle obsoleto TID=", target.tid().as_u64());
        };
        if thread.status() != ThreadStatus::Blocked {
            crate::kerror!(thread.status().name());
            crate::kfatal!("(Sched) unblock de thread fora de BLOCKED TID=", target.tid().as_u64());
        }

        let _irq = InterruptGuard::new();
        let woke = {
            // Mesmo lock da varredura: só um dos dois faz BLOCKED → READY
            let mut sleep = self.sleep.lock();
            sleep.cancel(&self.table, target);
            self.table
                .resolve(target)
                .is_some_and(|t| t.transition(ThreadStatus::Blocked, ThreadStatus::Ready))
        };

        if woke {
            self.enqueue_ready(thread);
        } else {
            // A varredura do tick acordou primeiro
            crate::kdebug!("(Sched) unblock: já acordada TID=", target.tid().as_u64());
        }
    }

    /// Enfileira uma thread já READY no núcleo de origem.
    fn enqueue_ready(&self, thread: &Thread) {
        self.ready_queue(thread.home_cpu())
            .push_back(&self.table, thread.slot());
        crate::kdebug!("(Sched) wakeup TID=", thread.tid().as_u64());
    }

    /// Termina o wakeup de uma thread devolvida por `sweep_step`.
    ///
    /// Handle obsoleto é ignorado: o slot pode já ser de outra thread.
    pub(crate) fn wake_expired(&self, handle: ThreadRef) {
        match self.table.resolve(handle) {
            Some(thread) => self.enqueue_ready(thread),
            None => {
                crate::kdebug!("(Sleep) wakeup de handle obsoleto TID=", handle.tid().as_u64());
            }
        }
    }

    // =========================================================================
    // SLEEP / TICK
    // =========================================================================

    /// Dorme por `ticks` ticks do timer. `ticks <= 0` não faz nada.
    pub fn sleep(&self, ticks: i64) {
        if ticks <= 0 {
            return;
        }

        let _irq = InterruptGuard::new();
        let cur = self.current_or_fatal();
        if cur.is_idle() {
            crate::kfatal!("(Sched) sleep na thread idle");
        }

        {
            let mut sleep = self.sleep.lock();
            // BLOCKED sob o lock: a varredura nunca vê uma thread RUNNING
            cur.set_status(ThreadStatus::Blocked);
            sleep.arm(&self.table, cur.slot(), ticks);
        }
        crate::kdebug!("(Sleep) dormindo ticks=", ticks);

        self.yield_now();
    }

    /// Dorme por pelo menos `ms` milissegundos.
    pub fn sleep_ms(&self, ms: u64) {
        let ticks = millis_to_ticks(ms).min(i64::MAX as u64) as i64;
        self.sleep(ticks);
    }

    /// Tick do timer: avança o relógio e acorda quem venceu.
    ///
    /// Só o núcleo `TIMEKEEPER_CPU` avança o relógio; nos demais é no-op.
    pub fn tick(&self) {
        if Cpu::current_id() != TIMEKEEPER_CPU {
            return;
        }

        let now = self.sleep.lock().begin_sweep();
        crate::ktrace!("(Sleep) tick ", now);

        loop {
            let step = self.sleep.lock().sweep_step(&self.table);
            match step {
                SweepStep::Done => break,
                SweepStep::Pending => {}
                SweepStep::Expired(handle) => self.wake_expired(handle),
            }
        }
    }

    /// Ticks desde o boot.
    pub fn ticks(&self) -> u64 {
        self.sleep.lock().now()
    }

    // =========================================================================
    // TÉRMINO / BOOT DOS NÚCLEOS
    // =========================================================================

    /// Marca a thread atual como DYING e sai do núcleo. A unidade é liberada
    /// pelo sucessor.
    ///
    /// No bare-metal nunca retorna; na plataforma hosted retorna já como o
    /// sucessor.
    pub(crate) fn retire_current(&self) {
        unsafe { Cpu::disable_interrupts() };

        let cur = self.current_or_fatal();
        if cur.is_idle() {
            crate::kfatal!("(Sched) exit na thread idle");
        }

        crate::kdebug!("(Sched) exit TID=", cur.tid().as_u64());
        cur.set_status(ThreadStatus::Dying);
        self.all.remove(&self.table, cur.slot());

        self.yield_now();
    }

    /// Termina a thread atual. Nunca retorna.
    pub fn exit(&self) -> ! {
        self.retire_current();
        crate::kfatal!("(Sched) thread DYING voltou a executar");
    }

    /// Entra no escalonador neste núcleo.
    ///
    /// No bare-metal nunca retorna; na plataforma hosted retorna já como a
    /// primeira thread escolhida.
    pub(crate) fn launch(&'static self) {
        let core = Cpu::current_id();
        if core.index() >= self.config().cpus {
            crate::kfatal!("(Sched) start() em núcleo não configurado: ", core.index());
        }
        if self.cpus.get().mark_online() {
            crate::kfatal!("(Sched) start() chamado duas vezes no núcleo ", core.index());
        }

        unsafe { Cpu::disable_interrupts() };

        let next = self.thread(self.get_ready());
        crate::kinfo!("(Sched) Núcleo online: ", core.index());

        let mut boot = CpuContext::new();
        switch::enter(self, &mut boot, next);
    }

    /// Entra no escalonador neste núcleo. Nunca retorna.
    pub fn start(&'static self) -> ! {
        self.launch();
        crate::kfatal!("(Sched) contexto de boot retomado");
    }

    // =========================================================================
    // CONSULTA
    // =========================================================================

    /// Thread corrente deste núcleo.
    pub fn current(&self) -> Option<ThreadRef> {
        self.current_thread()
            .map(|thread| ThreadRef::new(thread.slot(), thread.tid()))
    }

    /// Threads vivas (inclui as idle).
    pub fn live_threads(&self) -> usize {
        self.table.live()
    }

    /// Contexto salvo de uma thread.
    #[cfg(test)]
    pub(crate) fn saved_context(&self, target: ThreadRef) -> Option<CpuContext> {
        self.table
            .resolve(target)
            .map(|thread| unsafe { *thread.context_ptr() })
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
