pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod manifest;
pub mod routes;
pub mod state;
