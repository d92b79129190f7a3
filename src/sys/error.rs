//! # Standard Error Codes (Errno)
//!
//! Códigos de erro recuperáveis retornados pelo subsistema de threads.
//! Baseado no padrão POSIX para manter a numeração do resto do kernel.
//!
//! ## 🎯 Propósito e Responsabilidade
//! - **Uniformidade:** Falhas recuperáveis (ex: `thread_create` sem memória) retornam `Errno`.
//! - **Fatal ≠ Errno:** Violações de protocolo (yield com IRQs ligadas, unblock de thread
//!   não bloqueada) NUNCA viram `Errno`; elas param o sistema via `kfatal!`.
//!
//! --------------------------------------------------------------------------------
//!
//! Valores negativos são usados quando o erro cruza uma fronteira ABI (isize).

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Errno {
    EAGAIN = 11, // Try again (tabela de threads cheia)
    ENOMEM = 12, // Out of memory (alocador de unidades esgotado)
}

impl Errno {
    pub fn as_usize(self) -> usize {
        self as usize
    }

    pub fn as_isize(self) -> isize {
        -(self as i32) as isize
    }

    /// Nome curto do erro (para logs sem `core::fmt`)
    pub const fn name(self) -> &'static str {
        match self {
            Self::EAGAIN => "EAGAIN",
            Self::ENOMEM => "ENOMEM",
        }
    }
}
