pub mod config;
pub mod logging;

pub mod checksum;
pub mod fetcher;
pub mod hub;
pub mod proxy;
pub mod retry;
