//! Client traits for the external services a job talks to.
//!
//! Implementations live in [`crate::backend`]; tests provide in-memory fakes.

pub mod annotate;
pub mod image;
pub mod text;
pub mod upload;
