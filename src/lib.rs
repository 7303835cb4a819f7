pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod progress;
pub mod services;
pub mod source;
pub mod state;
