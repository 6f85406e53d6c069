//! Core type definitions used across the catalog workspace.

pub mod id;

pub use id::*;
