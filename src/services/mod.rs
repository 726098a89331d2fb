pub mod data_source_service;
pub mod job_runner;
pub mod report_generator;
pub mod report_service;

pub use data_source_service::*;
pub use job_runner::*;
pub use report_generator::*;
pub use report_service::*;
