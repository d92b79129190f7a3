//! Entry point de threads novas
//!
//! A primeira troca para uma thread nova cai em `kthread_trampoline`
//! (assembly da plataforma), que chama `kthread_entry` com
//! (escalonador, entry, arg) vindos do contexto preparado na criação.

use crate::arch::irq;
use crate::arch::traits::CpuOps;
use crate::arch::Cpu;
use crate::sched::thread::ThreadEntry;

use super::scheduler::Scheduler;
use super::switch;

/// Chamado pelo trampolim na primeira execução de uma thread.
#[no_mangle]
pub extern "C" fn kthread_entry(sched: *const Scheduler, entry: usize, arg: usize) -> ! {
    // SAFETY: valores gravados por `Scheduler::spawn` no contexto inicial
    let sched = unsafe { &*sched };
    let entry = unsafe { core::mem::transmute::<usize, ThreadEntry>(entry) };

    run_thread_body(sched, entry, arg);
    crate::kfatal!("(Sched) thread DYING voltou a executar");
}

/// Corpo de uma thread: conclui a troca que a trouxe até aqui, liga as
/// interrupções, roda `entry(arg)` e termina a thread.
pub(crate) fn run_thread_body(sched: &Scheduler, entry: ThreadEntry, arg: usize) {
    switch::finish_switch(sched);
    irq::reset_nesting();
    unsafe { Cpu::enable_interrupts() };

    entry(arg);

    sched.retire_current();
}
