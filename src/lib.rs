pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod records;
pub mod render;
pub mod scheduler;
pub mod utils;

pub use error::{AppError, Result};
