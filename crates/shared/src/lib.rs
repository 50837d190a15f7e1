//! Shared types, report options, and configuration for Tallyline.
//!
//! This crate provides common types used across all other crates:
//! - Commodity amounts and multi-commodity balances with decimal precision
//! - Typed IDs for journal entities
//! - The report option set read by the chain builder
//! - Configuration management

pub mod config;
pub mod options;
pub mod types;

pub use config::AppConfig;
pub use options::{KeepPolicy, ReportOptions};
