//! Background jobs started on demand and tracked by id.

pub mod state;
