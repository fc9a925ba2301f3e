//! Rink Rental Storefront library.
//!
//! Progressive enhancement for the rental cart: add-to-cart forms, remove
//! buttons and the checkout button are intercepted, sent as background
//! requests, and their results shown in a single toast slot.
//!
//! # Architecture
//!
//! - [`events`] - Delegated bindings: "run handler H for events of kind T on
//!   elements matching predicate P"
//! - [`interceptors`] - The three cart interceptors and their response routing
//! - [`client`] - `reqwest` client for the background endpoints
//! - [`toast`] - Single-slot toast notifier with cancel-and-replace hide timer
//! - [`cookies`] - CSRF token lookup from the cookie string
//! - [`dom`] - Page abstraction plus an in-memory page used by the CLI and tests
//! - [`config`] - Endpoint paths and element identifiers from the environment

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod config;
pub mod cookies;
pub mod dom;
pub mod error;
pub mod events;
pub mod interceptors;
pub mod toast;

pub use client::{ActionResponse, CartClient};
pub use config::{ConfigError, EnhanceConfig, StatusPolicy};
pub use cookies::{CsrfToken, get_cookie};
pub use dom::{Document, Element, MemoryDocument, NodeId};
pub use error::ActionError;
pub use events::{Dispatcher, DomEvent, EventHandler, EventKind, Matcher};
pub use interceptors::{ActionInterceptor, Effect, Outcome, install, resolve_outcome};
pub use toast::{MemorySurface, ToastNotifier, ToastSurface};
