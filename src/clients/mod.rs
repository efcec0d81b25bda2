//! Collaborator client implementations.

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
