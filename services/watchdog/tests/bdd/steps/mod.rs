//! BDD step definitions for the watchdog service

pub mod session_steps;
pub mod watchdog_steps;
