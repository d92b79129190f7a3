//! # Memory Management
//!
//! O escalonador não gerencia memória física nem virtual. Ele só precisa de
//! unidades de tamanho fixo (TCB + stack), pedidas através do trait
//! `UnitAllocator`.

pub mod units;

pub use units::{HeapUnits, UnitAllocator, UnitStats, UNIT_LAYOUT};
