//! Utility functions and helpers.

pub mod sql_classifier;

pub use sql_classifier::{SqlClassifier, StatementKind};
