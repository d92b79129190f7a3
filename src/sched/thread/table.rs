//! Tabela de threads (arena de slots).
//!
//! Cada slot guarda um ponteiro atômico para um TCB vivo. As listas
//! encadeiam threads pelo índice do slot, e `ThreadRef` (slot + TID) é o
//! handle entregue para fora do escalonador: um handle cujo slot foi
//! liberado ou reaproveitado não resolve mais.

use core::ptr::{self, NonNull};
use core::sync::atomic::{AtomicPtr, Ordering};

use super::entity::Thread;
use crate::klib::list::NodeId;
use crate::sched::config::MAX_THREADS;
use crate::sync::Spinlock;
use crate::sys::Tid;

// O mapa de reserva é um u64
const _: () = assert!(MAX_THREADS <= 64);

/// Handle estável para uma thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadRef {
    slot: NodeId,
    tid: Tid,
}

impl ThreadRef {
    pub(crate) const fn new(slot: NodeId, tid: Tid) -> Self {
        Self { slot, tid }
    }

    pub fn tid(&self) -> Tid {
        self.tid
    }

    pub fn slot(&self) -> NodeId {
        self.slot
    }
}

pub struct ThreadTable {
    slots: [AtomicPtr<Thread>; MAX_THREADS],
    /// Bit N = slot N reservado (publicado ou em construção)
    claimed: Spinlock<u64>,
}

impl ThreadTable {
    pub const fn new() -> Self {
        Self {
            slots: [const { AtomicPtr::new(ptr::null_mut()) }; MAX_THREADS],
            claimed: Spinlock::new("thread_table", 0),
        }
    }

    /// Reserva um slot livre. `None` se a tabela está cheia.
    pub fn reserve(&self) -> Option<NodeId> {
        let mut claimed = self.claimed.lock();
        let free = (!*claimed).trailing_zeros() as usize;
        if free >= MAX_THREADS {
            return None;
        }
        *claimed |= 1 << free;
        Some(free as NodeId)
    }

    /// Devolve um slot reservado que nunca foi publicado.
    pub fn unreserve(&self, slot: NodeId) {
        *self.claimed.lock() &= !(1u64 << slot);
    }

    /// Torna o TCB visível no slot.
    pub fn publish(&self, slot: NodeId, thread: NonNull<Thread>) {
        self.slots[slot as usize].store(thread.as_ptr(), Ordering::Release);
    }

    /// Esvazia o slot e o devolve para reuso.
    pub fn release(&self, slot: NodeId) {
        self.slots[slot as usize].store(ptr::null_mut(), Ordering::Release);
        self.unreserve(slot);
    }

    /// TCB publicado no slot, se houver.
    pub fn get(&self, slot: NodeId) -> Option<&Thread> {
        let thread = self.slots.get(slot as usize)?.load(Ordering::Acquire);
        // SAFETY: ponteiros publicados apontam para TCBs vivos até `release`
        unsafe { thread.as_ref() }
    }

    /// Resolve um handle: o slot precisa ainda conter a mesma thread.
    pub fn resolve(&self, handle: ThreadRef) -> Option<&Thread> {
        self.get(handle.slot)
            .filter(|thread| thread.tid() == handle.tid && thread.is_valid())
    }

    /// Slots ocupados.
    pub fn live(&self) -> usize {
        self.claimed.lock().count_ones() as usize
    }
}

impl Default for ThreadTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::hosted;
    use crate::sched::thread::entity::ThreadParams;
    use crate::sys::CoreId;
    use std::boxed::Box;

    fn nop(_: usize) {}

    fn leak_thread(tid: u64, slot: NodeId) -> NonNull<Thread> {
        let thread = Thread::new(ThreadParams {
            tid: Tid(tid),
            slot,
            name: "t",
            priority: 0,
            entry: nop,
            arg: 0,
            home_cpu: CoreId(0),
            idle: false,
        });
        NonNull::from(Box::leak(Box::new(thread)))
    }

    #[test]
    fn reserve_hands_out_lowest_free_slot() {
        hosted::reset_cpu(0, true);
        let table = ThreadTable::new();
        assert_eq!(table.reserve(), Some(0));
        assert_eq!(table.reserve(), Some(1));
        table.unreserve(0);
        assert_eq!(table.reserve(), Some(0));
        assert_eq!(table.live(), 2);
    }

    #[test]
    fn full_table_refuses() {
        hosted::reset_cpu(0, true);
        let table = ThreadTable::new();
        for _ in 0..MAX_THREADS {
            assert!(table.reserve().is_some());
        }
        assert_eq!(table.reserve(), None);
    }

    #[test]
    fn stale_handle_does_not_resolve() {
        hosted::reset_cpu(0, true);
        let table = ThreadTable::new();
        let slot = table.reserve().unwrap();
        table.publish(slot, leak_thread(5, slot));

        let handle = ThreadRef::new(slot, Tid(5));
        assert!(table.resolve(handle).is_some());
        assert!(table.resolve(ThreadRef::new(slot, Tid(6))).is_none());

        table.release(slot);
        assert!(table.resolve(handle).is_none());

        // Slot reaproveitado por outra thread
        let again = table.reserve().unwrap();
        assert_eq!(again, slot);
        table.publish(again, leak_thread(9, again));
        assert!(table.resolve(handle).is_none());
    }
}
