pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod harvest;
pub mod logging;
pub mod store;
pub mod utils;
