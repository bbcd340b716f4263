//! PinBridge firmware library.
//!
//! Exposes the connection supervisor, command routing and reporting
//! logic for integration testing on the host.  ESP-IDF-specific code is
//! guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod liveness;
pub mod runtime;
pub mod state;
pub mod status;
pub mod supervisor;
