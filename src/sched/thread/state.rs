//! Estados de thread

/// Estado de uma thread
///
/// ```text
/// create ──► Ready ──(escolhida)──► Running ──(yield)──► Ready
///                                      │
///                  block/sleep ◄───────┤
///                     │                └──(exit)──► Dying ──► unidade liberada
///                     ▼
///                  Blocked ──(unblock / fim do sleep)──► Ready
/// ```
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadStatus {
    /// Pronta para executar (numa fila de prontos, ou idle fora de uso)
    Ready = 0,
    /// Executando em algum núcleo
    Running = 1,
    /// Esperando unblock ou fim do sleep
    Blocked = 2,
    /// Terminou; a unidade é liberada pelo sucessor
    Dying = 3,
}

impl ThreadStatus {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Ready,
            1 => Self::Running,
            2 => Self::Blocked,
            3 => Self::Dying,
            _ => crate::kfatal!("(Sched) status de thread corrompido: ", raw),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Running => "RUNNING",
            Self::Blocked => "BLOCKED",
            Self::Dying => "DYING",
        }
    }
}
