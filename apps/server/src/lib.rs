pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
mod main_lib;
pub mod render;
pub mod scheduler;

pub use main_lib::{build_state, init_tracing, AppState};
