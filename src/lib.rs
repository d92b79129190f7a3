//! Forge kthreads.
//!
//! Escalonador preemptivo de threads de kernel para múltiplos núcleos.
//! No bare-metal (`target_os = "none"`) roda sobre x86_64; em qualquer
//! outro alvo usa a CPU simulada de `arch::hosted`, que é onde os testes
//! rodam.

#![cfg_attr(target_os = "none", no_std)]

// --- Hardware ---
pub mod arch; // HAL (CPU, IRQ, troca de contexto)
pub mod drivers; // Serial (saída de log)

// --- Base ---
pub mod core; // Logging, Panic, Per-CPU
pub mod klib; // Lista intrusiva, testes de boot
pub mod mm; // Unidades TCB + stack
pub mod sync; // Spinlock
pub mod sys; // Erros e tipos

// --- Escalonador ---
pub mod sched;
