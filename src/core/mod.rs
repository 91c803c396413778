//! Configuration, shared data types and the outbound gateway seam

pub mod config;
pub mod gateway;
pub mod models;
