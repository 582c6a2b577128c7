pub mod cli;
pub mod config;
pub mod data_io;
pub mod error;
pub mod fetch;
pub mod genres;
pub mod identity;
pub mod images;
pub mod listing;
pub mod orchestrator;
pub mod overview;
pub mod poster;
pub mod results;
pub mod runtime;
pub mod types;
