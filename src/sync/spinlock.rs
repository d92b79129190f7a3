//! Spinlock - bloqueio com busy-wait e aninhamento de interrupções

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::arch::irq;
use crate::arch::traits::CpuOps;
use crate::arch::Cpu;

/// Nenhum núcleo segura o lock.
const NO_OWNER: usize = 0;

/// Spinlock - usa busy-wait, NÃO pode dormir
///
/// Adquirir desabilita interrupções no núcleo (via `push_off`) e liberar
/// restaura o estado anterior (via `pop_off`), então locks aninhados só
/// religam interrupções quando o mais externo é solto.
///
/// # Contrato
///
/// - Adquirir um lock que o próprio núcleo já segura é fatal.
/// - Soltar um lock que o núcleo não segura é fatal.
/// - Nunca chamar o escalonador (`yield_now`) segurando um Spinlock.
pub struct Spinlock<T> {
    locked: AtomicBool,
    /// ID do núcleo dono + 1 (0 = livre)
    owner: AtomicUsize,
    name: &'static str,
    data: UnsafeCell<T>,
}

// SAFETY: Spinlock protege acesso com lock atômico
unsafe impl<T: Send> Send for Spinlock<T> {}
unsafe impl<T: Send> Sync for Spinlock<T> {}

impl<T> Spinlock<T> {
    /// Cria novo spinlock
    pub const fn new(name: &'static str, data: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            owner: AtomicUsize::new(NO_OWNER),
            name,
            data: UnsafeCell::new(data),
        }
    }

    /// Nome para diagnóstico
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Adquire o lock
    pub fn lock(&self) -> SpinlockGuard<'_, T> {
        // Desabilitar interrupções antes de adquirir
        irq::push_off();

        if self.holding() {
            crate::kerror!(self.name);
            crate::kfatal!("(Spinlock) aquisição dupla no mesmo núcleo");
        }

        // Spin até conseguir o lock
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            Cpu::relax();
        }

        self.claim()
    }

    /// Tenta adquirir sem bloquear
    ///
    /// Retorna `None` se o lock estiver ocupado (inclusive pelo próprio núcleo).
    pub fn try_lock(&self) -> Option<SpinlockGuard<'_, T>> {
        irq::push_off();

        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(self.claim())
        } else {
            // Não conseguiu, restaurar interrupções
            irq::pop_off();
            None
        }
    }

    /// O núcleo atual segura este lock?
    ///
    /// Só é confiável com interrupções desabilitadas.
    pub fn holding(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
            && self.owner.load(Ordering::Relaxed) == owner_tag()
    }

    fn claim(&self) -> SpinlockGuard<'_, T> {
        self.owner.store(owner_tag(), Ordering::Relaxed);
        irq::note_lock_acquired();
        SpinlockGuard { lock: self }
    }

    fn release(&self) {
        if !self.holding() {
            crate::kerror!(self.name);
            crate::kfatal!("(Spinlock) release de lock que o núcleo não segura");
        }

        self.owner.store(NO_OWNER, Ordering::Relaxed);
        irq::note_lock_released();
        self.locked.store(false, Ordering::Release);

        // Restaurar interrupções (se este era o push_off mais externo)
        irq::pop_off();
    }
}

#[inline]
fn owner_tag() -> usize {
    Cpu::current_id().index() + 1
}

/// Guard do spinlock - libera ao sair do escopo
pub struct SpinlockGuard<'a, T> {
    lock: &'a Spinlock<T>,
}

impl<T> Deref for SpinlockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: Lock está adquirido
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for SpinlockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: Lock está adquirido
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for SpinlockGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.release();
    }
}
