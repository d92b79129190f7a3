//! # Escalonador de Threads de Kernel
//!
//! Transforma os núcleos da máquina em executores de várias threads de
//! kernel "simultâneas".
//!
//! ## 🎯 Propósito e Responsabilidade
//! - **Threads:** TCB e stack numa única unidade de memória (`thread`).
//! - **Troca de Contexto:** salva/restaura registradores via `arch` e libera
//!   threads mortas no sucessor (`core::switch`).
//! - **Política:** Round-Robin FIFO por núcleo, com a idle como fallback.
//!
//! ## 🏗️ Arquitetura: Cooperative + Preemptive
//! 1. **Preemptivo:** o timer chama `timer_tick()` e o kernel chama
//!    `yield_now()` na saída da interrupção.
//! 2. **Cooperativo:** threads cedem via `yield_now()`, `block()`, `sleep()`.
//!
//! ## Fora de escopo
//! Prioridades (o campo é só armazenado), balanceamento entre núcleos,
//! processos e modo usuário.

pub mod config;
pub mod core;
pub mod thread;

pub use self::core::{
    block, current, dump, exit, sleep, sleep_ms, start, thread_create, thread_init, timer_tick,
    unblock, yield_now, DumpLists, ListKind, Scheduler, ThreadInfo, KERNEL_SCHED,
};
pub use config::{ReadyPolicy, SchedConfig};
pub use thread::{ThreadRef, ThreadStatus};
