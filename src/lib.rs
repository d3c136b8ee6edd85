pub mod config;
pub mod crypto;
pub mod engine;
pub mod env;
pub mod error;
pub mod logview;
pub mod payload;
pub mod service;
pub mod ui;
pub mod updater;
