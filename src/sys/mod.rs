//! System Definitions.
//!
//! Contém as constantes e tipos que definem a interface entre o subsistema de threads e o resto do kernel.

pub mod error;
pub mod types;

pub use error::Errno;
pub use types::{CoreId, Tid};
