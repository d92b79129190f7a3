//! Núcleo do escalonador e API global do kernel.
//!
//! O kernel usa a instância estática `KERNEL_SCHED` através das funções
//! livres deste módulo:
//!
//! ```text
//! boot:     thread_init(config, units) → start()        (uma vez por núcleo)
//! threads:  thread_create / yield_now / block / unblock / sleep / exit
//! timer:    timer_tick()                                 (a cada interrupção)
//! ```

pub mod cpu;
pub mod debug;
pub mod entry;
pub mod idle;
pub mod runqueue;
pub mod scheduler;
pub mod sleep_queue;
pub mod switch;

#[cfg(test)]
mod tests;

pub use debug::{DumpLists, ListKind, ThreadInfo};
pub use scheduler::Scheduler;

use crate::mm::UnitAllocator;
use crate::sched::config::SchedConfig;
use crate::sched::thread::{ThreadEntry, ThreadRef};
use crate::sys::Errno;

/// Escalonador do kernel.
pub static KERNEL_SCHED: Scheduler = Scheduler::new();

/// Inicializa o escalonador (uma vez, no BSP, antes de qualquer `start`).
pub fn thread_init(config: SchedConfig, units: &'static dyn UnitAllocator) {
    KERNEL_SCHED.init(config, units);
}

/// Cria uma thread de kernel pronta para rodar.
pub fn thread_create(
    name: &str,
    priority: i32,
    entry: ThreadEntry,
    arg: usize,
) -> Result<ThreadRef, Errno> {
    KERNEL_SCHED.create(name, priority, entry, arg)
}

/// Cede o núcleo (interrupções devem estar desabilitadas).
pub fn yield_now() {
    KERNEL_SCHED.yield_now();
}

/// Bloqueia a thread atual até um `unblock`.
pub fn block() {
    KERNEL_SCHED.block();
}

/// Acorda uma thread bloqueada.
pub fn unblock(target: ThreadRef) {
    KERNEL_SCHED.unblock(target);
}

/// Dorme por `ticks` ticks.
pub fn sleep(ticks: i64) {
    KERNEL_SCHED.sleep(ticks);
}

/// Dorme por pelo menos `ms` milissegundos.
pub fn sleep_ms(ms: u64) {
    KERNEL_SCHED.sleep_ms(ms);
}

/// Chamado pelo handler do timer.
pub fn timer_tick() {
    KERNEL_SCHED.tick();
}

/// Termina a thread atual.
pub fn exit() -> ! {
    KERNEL_SCHED.exit()
}

/// Entra no escalonador no núcleo atual.
pub fn start() -> ! {
    KERNEL_SCHED.start()
}

/// Thread corrente deste núcleo.
pub fn current() -> Option<ThreadRef> {
    KERNEL_SCHED.current()
}

/// Imprime o estado do escalonador.
pub fn dump(lists: DumpLists) {
    KERNEL_SCHED.dump(lists);
}
