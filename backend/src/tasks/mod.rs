//! Periodic maintenance tasks.

pub mod cleanup;
