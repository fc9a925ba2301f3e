//! Rink Rental Core - Shared types library.
//!
//! This crate provides common types used across all Rink Rental components:
//! - `storefront` - Cart interceptors, toast notifier and page model
//! - `cli` - Command-line driver for the cart endpoints
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no timers.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Toast severities, cart actions and the JSON result returned
//!   by the background cart endpoints

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
