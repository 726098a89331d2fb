pub mod data_sources;
pub mod report_jobs;
pub mod reports;
