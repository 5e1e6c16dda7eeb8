pub mod config;
pub mod discretization;
pub mod error;
pub mod models;
pub mod numerics;
pub mod physics;
pub mod processing;

pub use config::CroConfig;
pub use error::{CroError, Result};
