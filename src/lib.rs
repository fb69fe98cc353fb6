pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod migrate;
pub mod models;
pub mod reconcile;
pub mod ui;
