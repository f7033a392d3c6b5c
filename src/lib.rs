// Library for tests to access modules

pub mod config;
pub mod display;
pub mod error;
pub mod host_info;
pub mod models;
pub mod orchestrator;
pub mod scheduler;
pub mod sink;
pub mod source;
pub mod version;
