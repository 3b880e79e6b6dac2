pub mod config;
pub mod favorites_file;
pub mod runner;
