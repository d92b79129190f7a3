//! Panic Handler (bare-metal).
//!
//! O "Airbag" do sistema. Todo `kfatal!` termina aqui.
//!
//! # Comportamento
//! 1. Desabilita interrupções (evita loop de panics).
//! 2. Loga o local e a mensagem na Serial.
//! 3. Trava o núcleo (hlt loop).
//!
//! Em builds hosted o panic padrão do `std` é usado e desenrola a pilha,
//! então este módulo só existe para `target_os = "none"`.

use crate::arch::traits::CpuOps;
use crate::arch::Cpu;
use crate::drivers::serial::SerialWriter;
use core::fmt::Write;
use core::panic::PanicInfo;

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    // 1. Segurança imediata: parar interrupções
    unsafe { Cpu::disable_interrupts() };

    // 2. Log (Serial é o mais confiável aqui)
    crate::kerror!("================ KERNEL PANIC ================");

    match info.location() {
        Some(location) => {
            crate::klog!("Location: ");
            crate::klog!(location.file());
            crate::kerror!(" linha ", location.line());
        }
        None => crate::kerror!("Location: Unknown"),
    }

    // A mensagem do panic é formatada: único ponto que usa core::fmt
    crate::klog!("Reason:   ");
    let _ = write!(SerialWriter, "{}", info.message());
    crate::knl!();
    crate::kerror!("==============================================");

    // 3. Morrer com dignidade
    Cpu::hang();
}
