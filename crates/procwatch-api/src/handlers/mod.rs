//! API route handlers

pub mod health;
pub mod monitoring;
pub mod processes;
