pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod models;
pub mod services;
pub mod store;
pub mod stream;
