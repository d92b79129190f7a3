//! Alocador de unidades de thread (TCB + stack).
//!
//! Cada thread ocupa uma única unidade de `THREAD_UNIT_SIZE` bytes, alinhada
//! em página. O escalonador só enxerga o trait `UnitAllocator`; o kernel
//! hospedeiro entrega a implementação em `thread_init`.
//!
//! `HeapUnits` é a implementação padrão: um `linked_list_allocator::Heap`
//! sobre uma região fornecida pelo kernel, guardado por um `Spinlock`.

use core::alloc::Layout;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};

use linked_list_allocator::Heap;

use crate::sched::config::{PAGE_SIZE, THREAD_UNIT_SIZE};
use crate::sync::Spinlock;

/// Layout de uma unidade: tamanho fixo, alinhada em página.
pub const UNIT_LAYOUT: Layout = match Layout::from_size_align(THREAD_UNIT_SIZE, PAGE_SIZE) {
    Ok(layout) => layout,
    Err(_) => panic!("THREAD_UNIT_SIZE/PAGE_SIZE inválidos"),
};

/// Fonte de unidades para o escalonador.
///
/// Pode ser chamado de qualquer núcleo, com ou sem interrupções ligadas.
pub trait UnitAllocator: Sync {
    /// Retorna uma unidade ZERADA, alinhada em `PAGE_SIZE`, ou `None` se
    /// a memória acabou.
    fn alloc_unit(&self) -> Option<NonNull<u8>>;

    /// Devolve uma unidade.
    ///
    /// # Safety
    /// `unit` deve ter vindo de `alloc_unit` deste alocador e não pode ser
    /// usada depois.
    unsafe fn free_unit(&self, unit: NonNull<u8>);
}

/// `Heap` com ponteiros crus; só é tocado com o `Spinlock` seguro.
struct UnitHeap(Heap);

// SAFETY: acesso serializado pelo Spinlock de `HeapUnits`
unsafe impl Send for UnitHeap {}

/// Contadores do alocador.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitStats {
    pub allocated: usize,
    pub freed: usize,
    pub failed: usize,
}

impl UnitStats {
    /// Unidades vivas agora.
    pub fn in_use(&self) -> usize {
        self.allocated - self.freed
    }
}

/// Alocador de unidades baseado em lista encadeada.
pub struct HeapUnits {
    heap: Spinlock<UnitHeap>,
    allocated: AtomicUsize,
    freed: AtomicUsize,
    failed: AtomicUsize,
}

impl HeapUnits {
    /// Alocador vazio; precisa de `init` antes do primeiro uso.
    pub const fn empty() -> Self {
        Self {
            heap: Spinlock::new("units", UnitHeap(Heap::empty())),
            allocated: AtomicUsize::new(0),
            freed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    /// Entrega a região `[start, start + size)` ao alocador.
    ///
    /// # Safety
    /// A região deve ser memória válida, não usada por mais ninguém e viver
    /// enquanto houver threads. Só pode ser chamado uma vez.
    pub unsafe fn init(&self, start: *mut u8, size: usize) {
        self.heap.lock().0.init(start, size);
        crate::kinfo!("(Units) região de unidades: bytes=", size);
    }

    pub fn stats(&self) -> UnitStats {
        UnitStats {
            allocated: self.allocated.load(Ordering::Relaxed),
            freed: self.freed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

impl Default for HeapUnits {
    fn default() -> Self {
        Self::empty()
    }
}

impl UnitAllocator for HeapUnits {
    fn alloc_unit(&self) -> Option<NonNull<u8>> {
        let result = self.heap.lock().0.allocate_first_fit(UNIT_LAYOUT);

        match result {
            Ok(unit) => {
                // SAFETY: a unidade acabou de ser reservada com UNIT_LAYOUT
                unsafe { core::ptr::write_bytes(unit.as_ptr(), 0, UNIT_LAYOUT.size()) };
                self.allocated.fetch_add(1, Ordering::Relaxed);
                Some(unit)
            }
            Err(()) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                crate::kwarn!("(Units) sem memória para nova unidade");
                None
            }
        }
    }

    unsafe fn free_unit(&self, unit: NonNull<u8>) {
        self.heap.lock().0.deallocate(unit, UNIT_LAYOUT);
        self.freed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Região alinhada em página para testes de host.
#[cfg(test)]
pub(crate) fn leak_test_units(units: usize) -> &'static HeapUnits {
    use std::boxed::Box;
    use std::vec::Vec;

    #[repr(C, align(4096))]
    struct Page([u8; PAGE_SIZE]);

    // Uma página extra para os metadados do Heap
    let pages = units * (THREAD_UNIT_SIZE / PAGE_SIZE) + 1;
    let mut region: Vec<Page> = Vec::with_capacity(pages);
    for _ in 0..pages {
        region.push(Page([0; PAGE_SIZE]));
    }
    let region = Box::leak(region.into_boxed_slice());

    let heap = Box::leak(Box::new(HeapUnits::empty()));
    unsafe { heap.init(region.as_mut_ptr() as *mut u8, pages * PAGE_SIZE) };
    heap
}
