//! CLI command implementations.

pub mod product;
pub mod seed;
