//! Document store adapters

pub mod file;
pub mod memory;

pub use file::FileDocumentStore;
pub use memory::MemoryDocumentStore;
