pub mod app;
pub mod config;
pub mod error;
pub mod migration;
pub mod progress;
pub mod storage;
pub mod time_utils;
pub mod todos;
pub mod types;
pub mod views;
