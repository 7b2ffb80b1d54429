//! Types shared across the HTTP boundary of the registration service.

pub mod jobs;
pub mod model;
pub mod requests;
