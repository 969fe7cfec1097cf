pub mod api;
pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod db;
pub mod global;
pub mod notify;
pub mod providers;
pub mod workflow;
