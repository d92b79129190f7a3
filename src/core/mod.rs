//! Core Module
//!
//! Infraestrutura independente de arquitetura usada pelo escalonador:
//! logging, panic e variáveis Per-CPU.

pub mod logging;
#[cfg(all(target_os = "none", not(test)))]
pub mod panic;
pub mod smp;
