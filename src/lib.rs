#![forbid(unsafe_code)]

pub mod aggregate;
pub mod cli;
pub mod client;
pub mod codec;
pub mod config;
pub mod crawl;
pub mod logging;
pub mod mapping;
pub mod stream;
pub mod tree;
