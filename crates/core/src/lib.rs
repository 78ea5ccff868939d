//! Vivero Core - Shared types library.
//!
//! This crate provides common types used across all Vivero components:
//! - `storefront` - App core (cart, checkout, favorites, catalog)
//! - `cli` - Command-line tools for seeding and inventory management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no backend access, no
//! subscriptions. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, products, and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
