//! Internal utilities for the Splice plugin bridge.
//!
//! Low-level helpers shared by `splice-core` and `splice-auv3`. This crate
//! has no external dependencies.
//!
//! # Contents
//!
//! - [`fnv1a_32`] / [`address_from_identifier`] - stable parameter addresses
//! - [`copy_str_to_char_array`] - bounded, null-terminated copies into C buffers
//! - [`StackString`] - allocation-free `fmt::Write` sink

pub mod hash;
pub mod string;

pub use hash::{address_from_identifier, fnv1a_32};
pub use string::{copy_str_to_char_array, StackString};
