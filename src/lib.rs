pub mod batch;
pub mod browser;
pub mod config;
pub mod error;
pub mod models;
pub mod parsers;
pub mod scrapers;
pub mod sheet;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod testing;
