pub mod data_source;
pub mod report;
pub mod report_job;
pub mod value;

pub use data_source::*;
pub use report::*;
pub use report_job::*;
pub use value::*;
