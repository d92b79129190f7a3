//! Implementação x86_64 das operações de CPU (HAL).
//!
//! Usa Assembly inline para acesso direto ao hardware e controle de interrupções.
//!
//! # Segurança
//! Esta implementação assume que o código está rodando em modo longo (64-bit)
//! e nível de privilégio de kernel (Ring 0).

use bitflags::bitflags;
use core::arch::asm;

use crate::arch::irq::IrqNesting;
use crate::arch::traits::cpu::CpuOps;
use crate::core::smp::percpu::{PerCpu, MAX_CPUS};
use crate::sys::CoreId;

bitflags! {
    /// Bits de RFLAGS relevantes para o escalonador.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Rflags: u64 {
        /// Interrupt Flag (IF)
        const INTERRUPT_FLAG = 1 << 9;
    }
}

/// Aninhamento push_off/pop_off de cada núcleo.
static NESTING: PerCpu<IrqNesting> = PerCpu::new([const { IrqNesting::new() }; MAX_CPUS]);

pub struct X64Cpu;

impl X64Cpu {
    /// Executa a instrução CPUID.
    pub fn cpuid(leaf: u32, subleaf: u32) -> CpuidResult {
        let eax: u32;
        let ebx: u32;
        let ecx: u32;
        let edx: u32;

        unsafe {
            asm!(
                "push rbx",
                "cpuid",
                "mov {0:e}, ebx",
                "pop rbx",
                out(reg) ebx,
                inout("eax") leaf => eax,
                inout("ecx") subleaf => ecx,
                out("edx") edx,
                options(nomem, preserves_flags),
            );
        }
        CpuidResult { eax, ebx, ecx, edx }
    }

    /// Lê RFLAGS.
    #[inline]
    pub fn rflags() -> Rflags {
        let rflags: u64;
        unsafe {
            // PUSHFQ empilha RFLAGS, POP retira para registrador.
            asm!("pushfq; pop {}", out(reg) rflags, options(nomem, preserves_flags));
        }
        Rflags::from_bits_truncate(rflags)
    }
}

/// Resultado de uma execução do CPUID (EAX, EBX, ECX, EDX).
#[derive(Debug, Clone, Copy)]
pub struct CpuidResult {
    pub eax: u32,
    pub ebx: u32,
    pub ecx: u32,
    pub edx: u32,
}

impl CpuOps for X64Cpu {
    /// Retorna o ID do núcleo atual.
    ///
    /// Usa o Initial APIC ID (CPUID folha 1, bits 24-31 de EBX). Assume APIC IDs
    /// contíguos a partir de 0, como o QEMU entrega.
    fn current_id() -> CoreId {
        let id = Self::cpuid(1, 0).ebx >> 24;
        if id as usize >= MAX_CPUS {
            crate::kfatal!("(Arch) APIC ID acima de MAX_CPUS");
        }
        CoreId(id)
    }

    /// Para a execução da CPU até a próxima interrupção (HLT).
    #[inline]
    fn halt() {
        unsafe {
            asm!("hlt", options(nomem, nostack, preserves_flags));
        }
    }

    /// Dica para a CPU que estamos em um spinloop (PAUSE).
    #[inline]
    fn relax() {
        unsafe {
            asm!("pause", options(nomem, nostack, preserves_flags));
        }
    }

    /// Desabilita interrupções (CLI).
    ///
    /// # Safety
    /// Requer privilégios de Ring 0.
    #[inline]
    unsafe fn disable_interrupts() {
        asm!("cli", options(nomem, nostack, preserves_flags));
    }

    /// Habilita interrupções (STI).
    ///
    /// # Safety
    /// Requer privilégios de Ring 0. Pode causar preempção imediata.
    #[inline]
    unsafe fn enable_interrupts() {
        asm!("sti", options(nomem, nostack, preserves_flags));
    }

    /// Verifica se as interrupções estão habilitadas (RFLAGS.IF).
    #[inline]
    fn are_interrupts_enabled() -> bool {
        Self::rflags().contains(Rflags::INTERRUPT_FLAG)
    }

    fn irq_nesting() -> &'static IrqNesting {
        NESTING.get()
    }
}
