//! # Hardware Abstraction Layer (HAL)
//!
//! O módulo `arch` atua como a **única** ponte entre o escalonador (lógica agnóstica) e o hardware.
//! Toda interação com registradores, instruções privilegiadas e troca de contexto passa por aqui.
//!
//! ## 🎯 Propósito e Responsabilidade
//! - **Isolamento:** `sched` não sabe em qual CPU está rodando; usa `crate::arch::Cpu`.
//! - **Abstração:** `traits/` define o contrato (`CpuOps`); cada plataforma o implementa.
//! - **Seleção de Plataforma:** `cfg` escolhe a implementação concreta.
//!
//! ## 🏗️ Plataformas
//! - `x86_64` (bare-metal, `target_os = "none"`): CLI/STI, CPUID, `context_switch_asm`.
//! - `hosted` (qualquer SO hospedeiro): núcleo simulado, usado pelos testes.
//!
//! Cada plataforma exporta `Cpu`, `CpuContext` e `switch_context` com a mesma forma.

pub mod irq;
pub mod traits;

// Seleção de Arquitetura: x86_64 bare-metal
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
pub mod x86_64;

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
pub use x86_64 as platform;

// Seleção de Arquitetura: hosted (testes / ferramentas)
#[cfg(not(target_os = "none"))]
pub mod hosted;

#[cfg(not(target_os = "none"))]
pub use hosted as platform;

#[cfg(not(target_os = "none"))]
pub use hosted::HostedCpu as Cpu;

// Re-exports globais para o kernel usar
#[cfg(all(target_arch = "x86_64", target_os = "none"))]
pub use platform::Cpu;
pub use platform::{switch_context, CpuContext};
pub use traits::*;
