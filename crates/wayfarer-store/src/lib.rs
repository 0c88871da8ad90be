//! Session, context and page store.

pub mod handles;
pub mod memory;

pub use handles::MemoryHandleTable;
pub use memory::{MemorySessionBackend, SharedSessionBackend};
