//! Plataforma hosted: núcleo simulado para builds fora do bare-metal.
//!
//! Usada quando o crate é compilado para um sistema operacional hospedeiro
//! (ex: `cargo test` no Linux). Cada thread do host é tratada como um
//! "caminho de execução" em um núcleo simulado:
//!
//! - Flag de interrupção, ID de núcleo e aninhamento de IRQ são thread-local.
//! - A troca de contexto apenas grava um snapshot no contexto de saída e
//!   retorna. O código que segue a troca passa a agir como a thread que
//!   acabou de entrar (o escalonador já atualizou o `current` do núcleo).
//! - O trampolim de threads novas nunca é executado automaticamente.

use std::boxed::Box;
use std::cell::Cell;

use super::irq::IrqNesting;
use super::traits::CpuOps;
use crate::sys::CoreId;

std::thread_local! {
    static CORE: Cell<u32> = const { Cell::new(0) };
    static INTERRUPTS: Cell<bool> = const { Cell::new(true) };
    static NESTING: &'static IrqNesting = Box::leak(Box::new(IrqNesting::new()));
    static SWITCHES: Cell<u64> = const { Cell::new(0) };
}

/// CPU simulada.
pub struct HostedCpu;

impl CpuOps for HostedCpu {
    fn current_id() -> CoreId {
        CoreId(CORE.with(|c| c.get()))
    }

    fn halt() {
        std::thread::yield_now();
    }

    fn relax() {
        core::hint::spin_loop();
    }

    unsafe fn disable_interrupts() {
        INTERRUPTS.with(|i| i.set(false));
    }

    unsafe fn enable_interrupts() {
        INTERRUPTS.with(|i| i.set(true));
    }

    fn are_interrupts_enabled() -> bool {
        INTERRUPTS.with(|i| i.get())
    }

    fn irq_nesting() -> &'static IrqNesting {
        NESTING.with(|n| *n)
    }
}

/// Coloca o caminho atual no núcleo `core`, com o estado de IRQ dado e sem
/// nenhum push_off pendente.
pub fn reset_cpu(core: u32, interrupts_enabled: bool) {
    CORE.with(|c| c.set(core));
    INTERRUPTS.with(|i| i.set(interrupts_enabled));
    NESTING.with(|n| n.clear());
    SWITCHES.with(|s| s.set(0));
}

/// Migra o caminho atual para outro núcleo simulado.
pub fn set_current_core(core: u32) {
    CORE.with(|c| c.set(core));
}

/// Trocas de contexto efetuadas por este caminho desde o último `reset_cpu`.
pub fn switch_count() -> u64 {
    SWITCHES.with(|s| s.get())
}

/// Marca gravada em `resume_at` quando o contexto é salvo dentro da troca.
pub const RESUME_IN_SWITCH: u64 = 0x5157_1C40;

/// Marca do ponto de entrada de threads novas.
pub const RESUME_IN_TRAMPOLINE: u64 = 0x7A4D_0001;

/// Contexto simulado.
///
/// Mesma API do `CpuContext` do x86_64; os campos apenas registram o que
/// a troca real salvaria.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuContext {
    pub rsp: u64,
    pub resume_at: u64,
    pub args: [u64; 3],
    pub saves: u64,
}

impl CpuContext {
    pub const fn new() -> Self {
        Self {
            rsp: 0,
            resume_at: 0,
            args: [0; 3],
            saves: 0,
        }
    }

    /// Prepara o contexto de uma thread nova: ao ser retomada, entraria no
    /// trampolim com (scheduler, entry, arg).
    pub fn prepare(&mut self, stack_top: u64, scheduler: u64, entry: u64, arg: u64) {
        self.rsp = stack_top - 16;
        self.resume_at = RESUME_IN_TRAMPOLINE;
        self.args = [scheduler, entry, arg];
    }
}

impl Default for CpuContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Troca de contexto simulada.
///
/// # Safety
/// `old` e `new` devem ser ponteiros válidos (mesmo contrato do x86_64).
pub unsafe fn switch_context(old: *mut CpuContext, new: *const CpuContext) {
    let _ = &*new;
    let old = &mut *old;
    old.resume_at = RESUME_IN_SWITCH;
    old.saves += 1;
    SWITCHES.with(|s| s.set(s.get() + 1));
}
