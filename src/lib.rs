pub mod aggregate;
pub mod app;
pub mod collector;
pub mod config;
pub mod domain;
pub mod download;
pub mod error;
pub mod output;
pub mod overview;
pub mod rank;
pub mod report;
pub mod store;
pub mod xeno;
