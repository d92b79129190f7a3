//! Implementação x86_64 (bare-metal)

pub mod context;
pub mod cpu;

pub use context::{switch_context, CpuContext};
pub use cpu::X64Cpu as Cpu;
