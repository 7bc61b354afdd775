pub mod auth;
pub mod config;
pub mod error;
pub mod healthcheck;
pub mod logging;
pub mod server;
pub mod store;
pub mod utils;
pub mod web;

pub use error::{AError, AResult};
pub use web::{app, AppState};
