//! Batch extraction of address points from the Slovak register of addresses
//! open-data catalog into CSV tables, one aggregate file and one per region.

pub mod catalog;
pub mod config;
pub mod data;
pub mod fetch;
pub mod logging;
pub mod pipeline;
pub mod processing;
pub mod regions;
pub mod types;
pub mod writer;
