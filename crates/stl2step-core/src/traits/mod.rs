//! Trait definitions for pluggable backends.

pub mod converter;
