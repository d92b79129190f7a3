//! Threads de kernel: TCB, estados, unidade (TCB + stack) e tabela de slots.

pub mod entity;
pub mod state;
pub mod table;
pub mod unit;

pub use entity::{Thread, ThreadEntry, ThreadName, ThreadParams};
pub use state::ThreadStatus;
pub use table::{ThreadRef, ThreadTable};
