pub mod coerce;
pub mod dashboard;
pub mod export;
pub mod normalizer;
pub mod service;

pub use crate::domain::model::{NormalizedResult, PerformanceRecord, Report};
pub use crate::domain::ports::ReportingApi;
pub use crate::utils::error::Result;
