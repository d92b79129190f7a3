//! Filas de threads (registro por lista)
//!
//! `ThreadQueue` é dona do próprio `Spinlock` e só expõe push/pop/remove e
//! enumeração. As threads são encadeadas pelo índice do slot; cada tipo de
//! fila usa um link diferente do TCB.

use crate::klib::list::{IntrusiveList, Link, LinkAdapter, NodeId};
use crate::sched::thread::{Thread, ThreadTable};
use crate::sync::Spinlock;

/// Qual link do TCB uma fila usa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueLink {
    All,
    Ready,
    Sleep,
}

/// Adaptador slot → link, válido enquanto o lock da fila estiver seguro.
pub(crate) struct ThreadLinks<'a> {
    table: &'a ThreadTable,
    kind: QueueLink,
}

impl<'a> ThreadLinks<'a> {
    pub(crate) fn new(table: &'a ThreadTable, kind: QueueLink) -> Self {
        Self { table, kind }
    }

    fn cell(&self, node: NodeId) -> *mut Link {
        let thread: &Thread = match self.table.get(node) {
            Some(thread) => thread,
            None => crate::kfatal!("(Sched) link para slot vazio: ", node),
        };
        match self.kind {
            QueueLink::All => thread.all_link.get(),
            QueueLink::Ready => thread.ready_link.get(),
            QueueLink::Sleep => thread.sleep_link.get(),
        }
    }
}

impl LinkAdapter for ThreadLinks<'_> {
    fn link(&self, node: NodeId) -> Link {
        // SAFETY: o lock da fila dona deste link está seguro
        unsafe { *self.cell(node) }
    }

    fn set_link(&self, node: NodeId, link: Link) {
        // SAFETY: idem
        unsafe { *self.cell(node) = link }
    }
}

/// Fila de threads com lock próprio.
pub struct ThreadQueue {
    kind: QueueLink,
    list: Spinlock<IntrusiveList>,
}

impl ThreadQueue {
    pub const fn new(name: &'static str, kind: QueueLink) -> Self {
        Self {
            kind,
            list: Spinlock::new(name, IntrusiveList::new()),
        }
    }

    /// Adiciona no fim (FIFO)
    pub fn push_back(&self, table: &ThreadTable, slot: NodeId) {
        let links = ThreadLinks::new(table, self.kind);
        self.list.lock().push_back(&links, slot);
    }

    /// Remove a próxima thread (FIFO)
    pub fn pop_front(&self, table: &ThreadTable) -> Option<NodeId> {
        let links = ThreadLinks::new(table, self.kind);
        self.list.lock().pop_front(&links)
    }

    /// Remove uma thread específica. `false` se ela não estava na fila.
    pub fn remove(&self, table: &ThreadTable, slot: NodeId) -> bool {
        let links = ThreadLinks::new(table, self.kind);
        self.list.lock().remove(&links, slot)
    }

    /// Número de threads na fila
    pub fn len(&self) -> usize {
        self.list.lock().len()
    }

    /// Verifica se está vazia
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visita cada thread na ordem da fila, com o lock seguro.
    ///
    /// `f` não pode tomar nenhum lock do escalonador.
    pub fn for_each(&self, table: &ThreadTable, mut f: impl FnMut(&Thread)) {
        let links = ThreadLinks::new(table, self.kind);
        let list = self.list.lock();
        for slot in list.iter(&links) {
            if let Some(thread) = table.get(slot) {
                f(thread);
            }
        }
    }

    /// Como `for_each`, mas desiste se o lock estiver ocupado.
    pub fn try_for_each(&self, table: &ThreadTable, mut f: impl FnMut(&Thread)) -> bool {
        let links = ThreadLinks::new(table, self.kind);
        let Some(list) = self.list.try_lock() else {
            return false;
        };
        for slot in list.iter(&links) {
            if let Some(thread) = table.get(slot) {
                f(thread);
            }
        }
        true
    }
}
