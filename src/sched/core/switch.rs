//! Lógica de Troca de Contexto (Context Switching)
//!
//! Fluxo de uma troca no núcleo N:
//!
//! 1. `switch_to`: espera o sucessor sair de qualquer outro núcleo
//!    (`on_cpu`), publica `current`/`prev` do núcleo, confere o canário de
//!    quem sai e chama a troca de baixo nível.
//! 2. A troca retorna dentro do sucessor (ou no trampolim, se ele é novo).
//! 3. `finish_switch`: no sucessor, libera `prev.on_cpu` e, se `prev` está
//!    DYING, libera a unidade dele. É o único ponto de reclamação.
//!
//! O aninhamento de interrupções é estado do caminho de execução: é salvo
//! antes da troca e restaurado quando a thread volta.

use crate::arch::irq;
use crate::arch::traits::CpuOps;
use crate::arch::{switch_context, Cpu, CpuContext};
use crate::sched::thread::{unit, Thread, ThreadStatus};

use super::scheduler::Scheduler;

/// Troca `cur` por `next` neste núcleo.
///
/// Retorna quando `cur` for escalonada de novo (na plataforma hosted,
/// retorna imediatamente agindo como `next`).
pub(crate) fn switch_to(sched: &Scheduler, cur: &Thread, next: &Thread) {
    if !unit::canary_intact(cur) {
        crate::kfatal!("(Sched) stack overflow: canário destruído TID=", cur.tid().as_u64());
    }

    claim(sched, next);
    sched.cpus.get().set_prev(cur.slot());

    crate::ktrace!("(Sched) switch para TID=", next.tid().as_u64());

    let nesting = irq::save_nesting();
    // SAFETY: interrupções desabilitadas; ambos os contextos vivem nas
    // unidades das threads, e `cur` só é liberada depois desta troca
    unsafe { switch_context(cur.context_ptr(), next.context_ptr()) };
    irq::restore_nesting(nesting);

    finish_switch(sched);
}

/// Primeira entrada de um núcleo: troca a partir de um contexto descartável.
pub(crate) fn enter(sched: &Scheduler, boot: &mut CpuContext, next: &Thread) {
    claim(sched, next);

    crate::ktrace!("(Sched) entrando em TID=", next.tid().as_u64());

    // SAFETY: interrupções desabilitadas; `boot` nunca é retomado no bare-metal
    unsafe { switch_context(boot, next.context_ptr()) };

    finish_switch(sched);
}

/// Torna `next` a thread corrente deste núcleo.
fn claim(sched: &Scheduler, next: &Thread) {
    // Outro núcleo ainda pode estar salvando o contexto desta thread
    while next.on_cpu() {
        Cpu::relax();
    }
    next.set_on_cpu(true);
    next.set_status(ThreadStatus::Running);
    next.note_run();
    sched.cpus.get().set_current(next.slot());
}

/// Pós-troca, executado pelo sucessor.
pub(crate) fn finish_switch(sched: &Scheduler) {
    let Some(prev_slot) = sched.cpus.get().take_prev() else {
        return;
    };

    let prev = sched.thread(prev_slot);
    let dying = prev.status() == ThreadStatus::Dying;
    prev.set_on_cpu(false);

    if dying {
        reclaim(sched, prev);
    }
}

/// Libera o TCB e a stack de uma thread DYING.
fn reclaim(sched: &Scheduler, thread: &Thread) {
    let slot = thread.slot();
    let tid = thread.tid();

    for (core, cpu) in sched.cpus.iter() {
        if cpu.current() == Some(slot) {
            crate::kerror!("(Sched) reclaim: ainda corrente no núcleo ", core.index());
            crate::kfatal!("(Sched) reclaim de thread em execução TID=", tid.as_u64());
        }
    }

    let base = unit::unit_base(thread);
    sched.table.release(slot);
    thread.poison();

    // SAFETY: fora da tabela e de todas as listas; ninguém roda nesta stack
    unsafe { sched.units().free_unit(base) };

    crate::kdebug!("(Sched) unidade liberada TID=", tid.as_u64());
}
