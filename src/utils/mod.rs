//! Shared utilities: reference normalization.

pub mod interpolation;

pub use interpolation::{normalize, qualify, resource_reference, strip_interpolation, ResourceId};
