pub mod cache;
pub mod config;
pub mod continent;
pub mod error;
pub mod fetch;
pub mod geo;
pub mod process;
pub mod schema;
pub mod views;
