/// Arquivo: core/smp/mod.rs
///
/// Propósito: Suporte a Multiprocessamento Simétrico (SMP).
///
/// Módulos contidos:
/// - `percpu`: Variáveis locais de CPU.
///
/// A descoberta e o boot dos núcleos (APs) são feitos pelo kernel
/// hospedeiro; cada núcleo entra no escalonador via `sched::start()`.

pub mod percpu;
