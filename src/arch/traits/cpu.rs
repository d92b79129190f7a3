//! Interface Abstrata de CPU (HAL).
//! Define as operações que qualquer plataforma (x86_64 bare-metal, hosted) deve implementar.

use crate::arch::irq::IrqNesting;
use crate::sys::CoreId;

pub trait CpuOps {
    /// Retorna o ID lógico do núcleo atual (índice nos arrays Per-CPU).
    fn current_id() -> CoreId;

    /// Para a execução da CPU até a próxima interrupção (instrução HLT).
    /// Economiza energia em loops ociosos.
    fn halt();

    /// Dica para a CPU de que estamos em spin loop (PAUSE).
    fn relax();

    /// Desabilita interrupções locais (CLI).
    /// Crítico para seções atômicas no kernel.
    ///
    /// # Safety
    /// Requer privilégio de kernel.
    unsafe fn disable_interrupts();

    /// Habilita interrupções locais (STI).
    ///
    /// # Safety
    /// Requer privilégio de kernel. Pode causar preempção imediata.
    unsafe fn enable_interrupts();

    /// Verifica se as interrupções estão habilitadas.
    fn are_interrupts_enabled() -> bool;

    /// Estado de aninhamento push_off/pop_off deste núcleo.
    fn irq_nesting() -> &'static IrqNesting;

    /// Entra em loop infinito de halt com interrupções desabilitadas.
    /// Usado em pânicos irrecuperáveis.
    fn hang() -> ! {
        unsafe { Self::disable_interrupts() };
        loop {
            Self::halt();
        }
    }
}
