//! Support utilities

pub mod logger;
