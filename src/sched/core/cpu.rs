//! Estado por núcleo do escalonador

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::klib::list::NodeId;

/// Sentinela: nenhum slot.
const NONE: usize = usize::MAX;

/// Slot Per-CPU.
///
/// `current` e `prev` só são escritos pelo próprio núcleo com interrupções
/// desabilitadas; outros núcleos apenas leem (diagnóstico, conferência na
/// reclamação).
pub struct CpuSlot {
    /// Thread RUNNING neste núcleo
    current: AtomicUsize,
    /// Thread idle deste núcleo
    idle: AtomicUsize,
    /// Thread que acabou de sair, à espera do pós-troca
    prev: AtomicUsize,
    /// `start()` já foi chamado
    online: AtomicBool,
}

fn decode(raw: usize) -> Option<NodeId> {
    (raw != NONE).then_some(raw as NodeId)
}

impl CpuSlot {
    pub const fn new() -> Self {
        Self {
            current: AtomicUsize::new(NONE),
            idle: AtomicUsize::new(NONE),
            prev: AtomicUsize::new(NONE),
            online: AtomicBool::new(false),
        }
    }

    pub fn current(&self) -> Option<NodeId> {
        decode(self.current.load(Ordering::Acquire))
    }

    pub(crate) fn set_current(&self, slot: NodeId) {
        self.current.store(slot as usize, Ordering::Release);
    }

    pub fn idle(&self) -> Option<NodeId> {
        decode(self.idle.load(Ordering::Acquire))
    }

    pub(crate) fn set_idle(&self, slot: NodeId) {
        self.idle.store(slot as usize, Ordering::Release);
    }

    pub(crate) fn set_prev(&self, slot: NodeId) {
        self.prev.store(slot as usize, Ordering::Release);
    }

    /// Retira a thread pendente de pós-troca (no máximo uma vez por troca).
    pub(crate) fn take_prev(&self) -> Option<NodeId> {
        decode(self.prev.swap(NONE, Ordering::AcqRel))
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    /// Marca o núcleo como online. Retorna `true` se ele JÁ estava.
    pub(crate) fn mark_online(&self) -> bool {
        self.online.swap(true, Ordering::AcqRel)
    }
}

impl Default for CpuSlot {
    fn default() -> Self {
        Self::new()
    }
}
