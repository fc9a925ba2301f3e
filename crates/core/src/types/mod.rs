//! Core types for Rink Rental.
//!
//! This module provides type-safe wrappers for the values exchanged with the
//! background cart endpoints.

pub mod action;
pub mod rental_id;
pub mod severity;

pub use action::{ActionResult, CartAction};
pub use rental_id::RentalId;
pub use severity::{Severity, SeverityError};
