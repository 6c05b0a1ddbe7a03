pub mod app;
pub mod capture;
pub mod classifier;
pub mod config;
pub mod library;
pub mod region;
pub mod registry;
pub mod worker;
