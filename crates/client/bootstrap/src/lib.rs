//! Shared bootstrap utilities for lighthouse clients.
//!
//! Provides environment-driven configuration and session assembly that any
//! front-end (headless driver, UI shell) can reuse.
pub mod builder;
pub mod config;

pub use builder::{SessionBuilder, SessionSetup, default_data_dir};
pub use config::BootstrapConfig;
