pub mod analysis;
pub mod config;
pub mod engine;
pub mod feed;
pub mod publish;
pub mod tui;
