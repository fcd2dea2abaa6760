//! Task module
//!
//! This module contains the task model and its storage.

mod file_store;
mod model;
mod repository;

pub use file_store::FileTaskStore;
pub use model::Task;
pub use repository::TaskRepository;
