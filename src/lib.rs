pub mod browser;
pub mod cli;
pub mod error;
pub mod report;
pub mod spec;
