pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod guard;
pub mod issuance;
pub mod middleware;
pub mod models;
pub mod services;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
