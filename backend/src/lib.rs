//! Self-service user registration.
//!
//! Visitors request an account and fill in a registration form generated
//! from an XML Schema template. Administrators review the requests, manage
//! the templates and decide which accounts are activated.

pub mod components;
pub mod config;
pub mod db;
pub mod error;
pub mod job_controller;
pub mod notifications;
pub mod password;
pub mod services;
pub mod system;
pub mod tasks;
pub mod xsd;
