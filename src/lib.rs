pub mod cli;
pub mod config;
pub mod editor;
pub mod logging;
pub mod models;
pub mod server;
pub mod store;
