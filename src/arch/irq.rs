//! Aninhamento de desabilitação de interrupções (push_off / pop_off).
//!
//! Cada núcleo mantém um contador de profundidade. Interrupções só são
//! realmente reabilitadas quando a profundidade volta a zero E estavam
//! habilitadas quando a profundidade saiu de zero.
//!
//! O contador é estado do *caminho de execução*, não da CPU: antes de uma
//! troca de contexto o escalonador salva o snapshot e o restaura depois
//! (ver `save_nesting` / `restore_nesting`).

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use super::traits::CpuOps;
use super::Cpu;

/// Estado de aninhamento de um núcleo.
///
/// Só é tocado pelo próprio núcleo com interrupções desabilitadas; os
/// atômicos existem para que o array Per-CPU seja `Sync`.
pub struct IrqNesting {
    depth: AtomicU32,
    enabled_before: AtomicBool,
    locks_held: AtomicU32,
}

impl IrqNesting {
    pub const fn new() -> Self {
        Self {
            depth: AtomicU32::new(0),
            enabled_before: AtomicBool::new(false),
            locks_held: AtomicU32::new(0),
        }
    }

    /// Volta ao estado de boot (sem push_off, sem locks).
    pub(crate) fn clear(&self) {
        self.depth.store(0, Ordering::Relaxed);
        self.enabled_before.store(false, Ordering::Relaxed);
        self.locks_held.store(0, Ordering::Relaxed);
    }
}

impl Default for IrqNesting {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot do aninhamento, preservado através de uma troca de contexto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NestingSnapshot {
    depth: u32,
    enabled_before: bool,
}

/// Desabilita interrupções e incrementa a profundidade.
pub fn push_off() {
    let was_enabled = Cpu::are_interrupts_enabled();
    unsafe { Cpu::disable_interrupts() };

    let nesting = Cpu::irq_nesting();
    if nesting.depth.load(Ordering::Relaxed) == 0 {
        nesting.enabled_before.store(was_enabled, Ordering::Relaxed);
    }
    nesting.depth.fetch_add(1, Ordering::Relaxed);
}

/// Decrementa a profundidade; reabilita interrupções ao chegar em zero.
pub fn pop_off() {
    if Cpu::are_interrupts_enabled() {
        crate::kfatal!("(IRQ) pop_off: interrupções habilitadas");
    }

    let nesting = Cpu::irq_nesting();
    let depth = nesting.depth.load(Ordering::Relaxed);
    if depth == 0 {
        crate::kfatal!("(IRQ) pop_off sem push_off correspondente");
    }
    nesting.depth.store(depth - 1, Ordering::Relaxed);

    if depth == 1 && nesting.enabled_before.load(Ordering::Relaxed) {
        unsafe { Cpu::enable_interrupts() };
    }
}

/// Profundidade atual de push_off neste núcleo.
pub fn depth() -> u32 {
    Cpu::irq_nesting().depth.load(Ordering::Relaxed)
}

/// Quantos spinlocks este núcleo segura agora.
pub fn locks_held() -> u32 {
    Cpu::irq_nesting().locks_held.load(Ordering::Relaxed)
}

pub(crate) fn note_lock_acquired() {
    Cpu::irq_nesting().locks_held.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn note_lock_released() {
    Cpu::irq_nesting().locks_held.fetch_sub(1, Ordering::Relaxed);
}

/// Captura o aninhamento do caminho atual antes de trocar de contexto.
pub fn save_nesting() -> NestingSnapshot {
    let nesting = Cpu::irq_nesting();
    NestingSnapshot {
        depth: nesting.depth.load(Ordering::Relaxed),
        enabled_before: nesting.enabled_before.load(Ordering::Relaxed),
    }
}

/// Restaura o aninhamento capturado por `save_nesting`.
pub fn restore_nesting(snapshot: NestingSnapshot) {
    let nesting = Cpu::irq_nesting();
    nesting.depth.store(snapshot.depth, Ordering::Relaxed);
    nesting
        .enabled_before
        .store(snapshot.enabled_before, Ordering::Relaxed);
}

/// Zera o aninhamento (primeira execução de uma thread nova).
pub fn reset_nesting() {
    restore_nesting(NestingSnapshot {
        depth: 0,
        enabled_before: false,
    });
}

/// Guard RAII: salva o estado de interrupções e desabilita; restaura no drop.
pub struct InterruptGuard {
    _private: (),
}

impl InterruptGuard {
    pub fn new() -> Self {
        push_off();
        Self { _private: () }
    }
}

impl Default for InterruptGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        pop_off();
    }
}
