pub mod context;
pub mod executor;
pub mod handlers;
pub mod runner;
pub mod spec_model;
