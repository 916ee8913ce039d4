// src/models/mod.rs

pub mod metrics;
pub mod question;
pub mod session;
