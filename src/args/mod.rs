// src/args/mod.rs

//! Argument declarations and their resolution against operation schemas.

pub mod argument;
pub mod coerce;
pub mod resolver;

pub use argument::{Argument, Binding, merge_overrides};
pub use resolver::{ArgumentError, Resolution, join_errors, resolve};
