//! Tipos fundamentais do sistema

/// Thread ID
///
/// Atribuído sob o lock de IDs na criação. Monotônico e nunca reutilizado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Tid(pub u64);

impl Tid {
    /// Valor reservado: nenhuma thread válida recebe TID 0.
    pub const NONE: Tid = Tid(0);

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Identificador lógico de núcleo (índice em arrays Per-CPU)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct CoreId(pub u32);

impl CoreId {
    pub const BSP: CoreId = CoreId(0);

    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
