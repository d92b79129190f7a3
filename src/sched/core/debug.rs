//! Ferramentas de Debug para o Scheduler
//!
//! Nada aqui altera o estado de escalonamento. `dump` usa apenas
//! `try_lock` e nunca bloqueia, então pode ser chamado de um handler de
//! pânico ou de interrupção.

use bitflags::bitflags;

use super::scheduler::Scheduler;
use crate::sched::thread::{Thread, ThreadName, ThreadRef, ThreadStatus};
use crate::sys::{CoreId, Tid};

bitflags! {
    /// Listas incluídas em um `dump`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct DumpLists: u8 {
        const ALL = 1 << 0;
        const READY = 1 << 1;
        const SLEEP = 1 << 2;
        const CPUS = 1 << 3;
    }
}

/// Lista a enumerar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    All,
    Ready(CoreId),
    Sleep,
}

/// Retrato de uma thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadInfo {
    pub handle: ThreadRef,
    pub tid: Tid,
    pub name: ThreadName,
    pub status: ThreadStatus,
    pub priority: i32,
    pub sleep_ticks: i64,
    pub home_cpu: CoreId,
    pub runs: u64,
    pub idle: bool,
}

impl ThreadInfo {
    fn of(thread: &Thread) -> Self {
        Self {
            handle: ThreadRef::new(thread.slot(), thread.tid()),
            tid: thread.tid(),
            name: thread.name(),
            status: thread.status(),
            priority: thread.priority(),
            sleep_ticks: thread.sleep_ticks(),
            home_cpu: thread.home_cpu(),
            runs: thread.runs(),
            idle: thread.is_idle(),
        }
    }
}

impl Scheduler {
    /// Retrato de uma thread viva. `None` para handle obsoleto.
    pub fn thread_info(&self, target: ThreadRef) -> Option<ThreadInfo> {
        self.table.resolve(target).map(ThreadInfo::of)
    }

    /// Visita cada thread de uma lista, na ordem da lista.
    ///
    /// O lock da lista fica seguro durante as chamadas: `f` não pode chamar
    /// o escalonador.
    pub fn enumerate(&self, kind: ListKind, mut f: impl FnMut(ThreadInfo)) {
        match kind {
            ListKind::All => self
                .all
                .for_each(&self.table, |thread| f(ThreadInfo::of(thread))),
            ListKind::Ready(core) => self
                .ready
                .get_for(core)
                .for_each(&self.table, |thread| f(ThreadInfo::of(thread))),
            ListKind::Sleep => {
                let sleep = self.sleep.lock();
                sleep.for_each(&self.table, |slot| f(ThreadInfo::of(self.thread(slot))));
            }
        }
    }

    /// Imprime as listas selecionadas na serial.
    pub fn dump(&self, lists: DumpLists) {
        crate::kinfo!("(Sched) --- DUMP DO ESCALONADOR ---");

        if lists.contains(DumpLists::CPUS) {
            for (core, cpu) in self.cpus.iter() {
                if !cpu.is_online() {
                    continue;
                }
                crate::klog!("  [CPU] núcleo=", core.index(), " slot corrente=", cpu.current().map_or(u64::MAX, u64::from));
                crate::knl!();
            }
        }

        if lists.contains(DumpLists::ALL) {
            crate::klog!("  [ALL]");
            crate::knl!();
            if !self.all.try_for_each(&self.table, dump_thread) {
                crate::kwarn!("  [ALL] ocupada");
            }
        }

        if lists.contains(DumpLists::READY) {
            for (core, queue) in self.ready.iter() {
                crate::klog!("  [READY] núcleo=", core.index());
                crate::knl!();
                if !queue.try_for_each(&self.table, dump_thread) {
                    crate::kwarn!("  [READY] ocupada");
                }
            }
        }

        if lists.contains(DumpLists::SLEEP) {
            crate::klog!("  [SLEEP]");
            crate::knl!();
            match self.sleep.try_lock() {
                Some(sleep) => {
                    crate::klog!("    now=", sleep.now());
                    crate::knl!();
                    sleep.for_each(&self.table, |slot| {
                        if let Some(thread) = self.table.get(slot) {
                            dump_thread(thread);
                        }
                    });
                }
                None => crate::kwarn!("  [SLEEP] ocupada"),
            }
        }

        crate::kinfo!("(Sched) --- FIM DO DUMP ---");
    }
}

fn dump_thread(thread: &Thread) {
    crate::klog!("    -> TID=", thread.tid().as_u64(), " status=", thread.status().as_u8());
    crate::klog!(" ");
    crate::klog!(thread.name().as_str());
    if thread.status() == ThreadStatus::Blocked {
        crate::klog!(" sleep=", thread.sleep_ticks());
    }
    crate::knl!();
}
