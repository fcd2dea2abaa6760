//! Core library for the task-list service
//!
//! This crate contains the task data model and its persistence layer.

pub mod error;
pub mod task;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
