//! # Synchronization Primitives
//!
//! Primitivas de sincronização para ambiente SMP.
//!
//! ## Regras
//!
//! - **Spinlock**: seções críticas curtas; desabilita interrupções no núcleo
//!   enquanto seguro.
//! - **Ordem de Lock**: Sempre adquirir na mesma ordem para evitar deadlock.
//!   No escalonador: sleep → ready, e nunca dois locks de ready ao mesmo tempo.
//! - Nenhum Spinlock pode estar seguro durante uma troca de contexto.

/// Spinlock (busy-wait, não dorme)
pub mod spinlock;

pub use spinlock::{Spinlock, SpinlockGuard};
