pub mod memory;

pub use memory::{LinkEnd, MemoryTransport, link};
