pub mod board;
pub mod catalog;
pub mod constants;
pub mod engine;
pub mod error;
pub mod input;
pub mod puzzle;
pub mod records_store;
pub mod robot;
pub mod server_protocol;
pub mod server_utils;
pub mod session;
pub mod types;
