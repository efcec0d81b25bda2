//! Event store implementations.

pub mod memory;

pub use memory::InMemoryEventStore;
