pub mod components;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod submission;
pub mod tree;
pub mod types;
