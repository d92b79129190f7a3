//! Constantes de configuração do Scheduler

use crate::sys::CoreId;

pub use crate::core::smp::percpu::MAX_CPUS;

/// Máximo de threads vivas (tamanho da tabela de slots)
pub const MAX_THREADS: usize = 64;

/// Tamanho máximo do nome (bytes, UTF-8)
pub const MAX_NAME_LEN: usize = 16;

/// Tamanho da página física
pub const PAGE_SIZE: usize = 4096;

/// Unidade de uma thread: TCB no início, stack crescendo a partir do fim
pub const THREAD_UNIT_SIZE: usize = 4 * PAGE_SIZE; // 16KB

/// Prioridade padrão (armazenada, ignorada pela política)
pub const PRIORITY_DEFAULT: i32 = 10;

/// Prioridade da thread Idle
pub const PRIORITY_IDLE: i32 = 0;

/// Frequência do timer (ticks por segundo)
pub const TICK_HZ: u64 = 100;

/// Único núcleo que avança o relógio de sleep
pub const TIMEKEEPER_CPU: CoreId = CoreId::BSP;

/// Palavra gravada no fundo da stack de cada thread
pub const STACK_CANARY: u64 = 0x57AC_CA4A_12FE_D00D;

/// Assinatura de um TCB válido
pub const THREAD_MAGIC: u64 = 0x5448_5245_4144_0001;

/// Assinatura gravada no TCB antes de devolver a unidade
pub const THREAD_POISON: u64 = 0xDEAD_DEAD_DEAD_DEAD;

/// Converte milissegundos em ticks, arredondando para cima.
pub const fn millis_to_ticks(ms: u64) -> u64 {
    ms.saturating_mul(TICK_HZ).div_ceil(1000)
}

/// Onde threads prontas são enfileiradas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadyPolicy {
    /// Uma fila por núcleo. Threads novas vão para o núcleo `tid % cpus`,
    /// threads desbloqueadas voltam para o núcleo de origem e quem faz
    /// yield fica no núcleo atual.
    #[default]
    PerCore,
    /// Uma única fila (a do núcleo 0) servindo todos os núcleos.
    Shared,
}

/// Configuração de runtime, entregue em `thread_init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedConfig {
    /// Núcleos que vão chamar `start()` (1..=MAX_CPUS)
    pub cpus: usize,
    pub ready_policy: ReadyPolicy,
}

impl SchedConfig {
    pub const fn new(cpus: usize) -> Self {
        Self {
            cpus,
            ready_policy: ReadyPolicy::PerCore,
        }
    }

    pub const fn with_policy(mut self, ready_policy: ReadyPolicy) -> Self {
        self.ready_policy = ready_policy;
        self
    }

    pub const fn is_valid(&self) -> bool {
        self.cpus >= 1 && self.cpus <= MAX_CPUS
    }
}

impl Default for SchedConfig {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_round_up_to_whole_ticks() {
        assert_eq!(millis_to_ticks(0), 0);
        assert_eq!(millis_to_ticks(1), 1);
        assert_eq!(millis_to_ticks(10), 1);
        assert_eq!(millis_to_ticks(15), 2);
        assert_eq!(millis_to_ticks(1000), TICK_HZ);
    }

    #[test]
    fn config_bounds() {
        assert!(SchedConfig::default().is_valid());
        assert!(SchedConfig::new(MAX_CPUS).is_valid());
        assert!(!SchedConfig::new(0).is_valid());
        assert!(!SchedConfig::new(MAX_CPUS + 1).is_valid());
        assert_eq!(
            SchedConfig::new(2).with_policy(ReadyPolicy::Shared).ready_policy,
            ReadyPolicy::Shared
        );
    }
}
