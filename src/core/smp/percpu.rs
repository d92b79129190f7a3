//! Arquivo: core/smp/percpu.rs
//!
//! Propósito: Variáveis Por-CPU (Per-CPU variables).
//! Dados com uma instância separada para cada núcleo, evitando contenda
//! de cache entre núcleos.
//!
//! Detalhes de Implementação:
//! - Abordagem baseada em Array: `PerCpu<T>` mantém um array `[T; MAX_CPUS]`.
//! - O acesso é indexado pelo ID do núcleo atual (`Cpu::current_id()`).
//! - Só entrega referências compartilhadas: mutabilidade fica por conta do
//!   próprio `T` (atômicos, `Spinlock`). Por isso `PerCpu<T>` é `Sync`
//!   exatamente quando `T` é.

use crate::arch::traits::CpuOps;
use crate::arch::Cpu;
use crate::sys::CoreId;

/// Número máximo de CPUs suportadas.
pub const MAX_CPUS: usize = 8;

/// Wrapper para dados que são replicados por CPU.
///
/// # Exemplo
///
/// ```ignore
/// static RUNS: PerCpu<AtomicU64> = PerCpu::new([const { AtomicU64::new(0) }; MAX_CPUS]);
///
/// fn inc() {
///     RUNS.get().fetch_add(1, Ordering::Relaxed);
/// }
/// ```
pub struct PerCpu<T> {
    slots: [T; MAX_CPUS],
}

impl<T> PerCpu<T> {
    /// Cria uma nova variável PerCpu a partir dos valores de cada núcleo.
    pub const fn new(slots: [T; MAX_CPUS]) -> Self {
        Self { slots }
    }

    /// Slot do núcleo atual.
    ///
    /// Um ID acima de `MAX_CPUS` é topologia inválida: fatal.
    pub fn get(&self) -> &T {
        self.get_for(Cpu::current_id())
    }

    /// Slot de um núcleo específico.
    pub fn get_for(&self, core: CoreId) -> &T {
        match self.slots.get(core.index()) {
            Some(slot) => slot,
            None => crate::kfatal!("(PerCpu) núcleo fora de MAX_CPUS: ", core.index()),
        }
    }

    /// Todos os slots, em ordem de núcleo.
    pub fn iter(&self) -> impl Iterator<Item = (CoreId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (CoreId(i as u32), slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::hosted;
    use core::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn each_core_sees_its_own_slot() {
        let counters: PerCpu<AtomicU32> = PerCpu::new([const { AtomicU32::new(0) }; MAX_CPUS]);

        hosted::reset_cpu(0, true);
        counters.get().fetch_add(1, Ordering::Relaxed);
        hosted::set_current_core(3);
        counters.get().fetch_add(5, Ordering::Relaxed);

        assert_eq!(counters.get_for(CoreId(0)).load(Ordering::Relaxed), 1);
        assert_eq!(counters.get_for(CoreId(3)).load(Ordering::Relaxed), 5);
        assert_eq!(counters.iter().count(), MAX_CPUS);
    }

    #[test]
    #[should_panic]
    fn core_beyond_max_cpus_is_fatal() {
        let counters: PerCpu<AtomicU32> = PerCpu::new([const { AtomicU32::new(0) }; MAX_CPUS]);
        counters.get_for(CoreId(MAX_CPUS as u32));
    }
}
