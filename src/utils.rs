pub mod config;
pub mod error;
pub mod tools;
pub mod user;
