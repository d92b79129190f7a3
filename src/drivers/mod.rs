//! # Drivers
//!
//! O escalonador só depende de um driver: a saída serial usada pelos
//! macros de log (`kinfo!`, `kerror!`, ...).
//!
//! | Driver   | Arquivo      | Status |
//! |----------|--------------|--------|
//! | Serial   | `serial.rs`  | COM1 no bare-metal, stderr no host |
//!
//! O timer não mora aqui: quem programa o PIT/APIC é o kernel hospedeiro,
//! que chama `sched::timer_tick()` a cada interrupção.

pub mod serial;
