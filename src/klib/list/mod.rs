//! Listas do kernel.

pub mod intrusive;

pub use intrusive::{IntrusiveList, Link, LinkAdapter, NodeId};
