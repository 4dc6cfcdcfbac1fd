//! services/showroom/src/lib.rs
//!
//! This file makes the showroom's modules available as a library so the binary
//! and the tests share them.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
