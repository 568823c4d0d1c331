pub mod application;
pub mod domain;
pub mod infrastructure;

pub mod config;
pub mod error;

pub use error::Error;
