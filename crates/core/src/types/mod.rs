//! Core types for Vivero.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod product;
pub mod role;

pub use id::*;
pub use price::{CurrencyCode, Price};
pub use product::{DEFAULT_CATEGORY, DEFAULT_NAME, Product};
pub use role::UserRole;
