//! Thread Idle - fallback permanente de cada núcleo
//!
//! Cada núcleo tem a sua idle, criada em `thread_init` e nunca colocada em
//! fila de prontos. `get_ready` a devolve quando a fila do núcleo está
//! vazia. Ela roda em busy-wait: tenta ceder o núcleo com interrupções
//! desligadas e relaxa com elas ligadas, para que o timer possa acordar
//! alguém.

use crate::arch::traits::CpuOps;
use crate::arch::Cpu;

use super::scheduler::Scheduler;

/// Entry da idle. `arg` é o ponteiro do escalonador dono.
pub(crate) fn idle_entry(arg: usize) {
    // SAFETY: `init` passa `&'static Scheduler` como argumento
    let sched = unsafe { &*(arg as *const Scheduler) };
    crate::kinfo!("(Idle) idle iniciada no núcleo ", Cpu::current_id().index());

    loop {
        idle_pass(sched);
        Cpu::relax();
    }
}

/// Uma volta do loop da idle.
pub(crate) fn idle_pass(sched: &Scheduler) {
    unsafe { Cpu::disable_interrupts() };
    sched.yield_now();
    unsafe { Cpu::enable_interrupts() };
}
