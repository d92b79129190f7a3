//! Layout da unidade de uma thread.
//!
//! ```text
//! base                                               base + THREAD_UNIT_SIZE
//! ├── Thread (TCB) ──┬─ canário ─┬──────── stack (cresce para baixo) ◄──┤
//!                    CANARY_OFFSET  STACK_BOTTOM_OFFSET                   stack_top
//! ```
//!
//! A unidade inteira vem de uma única alocação; liberar a unidade libera o
//! TCB e a stack juntos. O canário fica no endereço mais baixo que a stack
//! pode alcançar e é conferido a cada troca de contexto.

use core::mem::size_of;
use core::ptr::NonNull;

use volatile::VolatilePtr;

use super::entity::Thread;
use crate::klib::align_up;
use crate::sched::config::{STACK_CANARY, THREAD_UNIT_SIZE};

/// Offset da palavra canário.
pub const CANARY_OFFSET: usize = align_up(size_of::<Thread>(), 16);

/// Primeiro byte utilizável da stack.
pub const STACK_BOTTOM_OFFSET: usize = CANARY_OFFSET + 16;

/// Bytes de stack disponíveis para a thread.
pub const STACK_SIZE: usize = THREAD_UNIT_SIZE - STACK_BOTTOM_OFFSET;

/// Stack mínima aceitável (garantido em compilação).
pub const MIN_STACK_SIZE: usize = 8 * 1024;

const _: () = assert!(STACK_SIZE >= MIN_STACK_SIZE);

/// Topo da stack (endereço exclusivo; a stack cresce para baixo).
pub fn stack_top(base: NonNull<u8>) -> u64 {
    base.as_ptr() as u64 + THREAD_UNIT_SIZE as u64
}

/// Escreve o TCB na base da unidade e planta o canário.
///
/// # Safety
/// `base` deve ser uma unidade recém-alocada, alinhada em página, com
/// `THREAD_UNIT_SIZE` bytes, ainda não publicada.
pub unsafe fn install(base: NonNull<u8>, thread: Thread) -> NonNull<Thread> {
    let tcb = base.cast::<Thread>();
    tcb.as_ptr().write(thread);
    canary(base).write(STACK_CANARY);
    tcb
}

/// Base da unidade que contém `thread`.
pub fn unit_base(thread: &Thread) -> NonNull<u8> {
    NonNull::from(thread).cast::<u8>()
}

/// O canário da stack de `thread` está intacto?
pub fn canary_intact(thread: &Thread) -> bool {
    // SAFETY: todo Thread publicado vive no início de uma unidade completa
    unsafe { canary(unit_base(thread)).read() == STACK_CANARY }
}

/// Acesso volátil ao canário de uma unidade.
///
/// # Safety
/// `base` deve apontar para uma unidade válida.
unsafe fn canary<'a>(base: NonNull<u8>) -> VolatilePtr<'a, u64> {
    let word = NonNull::new_unchecked(base.as_ptr().add(CANARY_OFFSET)).cast::<u64>();
    VolatilePtr::new(word)
}

/// Simula um estouro de stack (testes).
#[cfg(test)]
pub(crate) fn clobber_canary(thread: &Thread) {
    unsafe { canary(unit_base(thread)).write(0) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::klib::is_aligned;
    use crate::sched::config::PAGE_SIZE;

    #[test]
    fn layout_leaves_room_for_the_stack() {
        assert!(CANARY_OFFSET >= size_of::<Thread>());
        assert!(is_aligned(STACK_BOTTOM_OFFSET, 16));
        assert_eq!(STACK_BOTTOM_OFFSET + STACK_SIZE, THREAD_UNIT_SIZE);
        assert!(STACK_SIZE < THREAD_UNIT_SIZE);
    }

    #[test]
    fn stack_top_is_end_of_unit() {
        let base = NonNull::new(PAGE_SIZE as *mut u8).unwrap();
        assert_eq!(stack_top(base), (PAGE_SIZE + THREAD_UNIT_SIZE) as u64);
        assert!(is_aligned(stack_top(base) as usize, 16));
    }
}
