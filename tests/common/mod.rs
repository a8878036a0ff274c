//! Common utilities for integration tests

#![allow(dead_code)]

pub mod fixtures;
pub mod test_helpers;

// Re-export commonly used items
pub use fixtures::{ldpe_reference_solver, polymer_layer, two_layer_stack};
pub use test_helpers::{
    assert_non_decreasing,
    max_abs,
    receiving_mass,
    relative_error,
};
