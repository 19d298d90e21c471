#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod convert;
pub mod crawl;
pub mod detail;
pub mod fetch;
pub mod formats;
pub mod list_page;
pub mod logging;
pub mod normalize;
pub mod output;
pub mod sampling;
