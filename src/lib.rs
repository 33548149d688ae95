pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliConfig;

pub use crate::adapters::everflow::EverflowClient;
pub use crate::config::{AppConfig, EverflowConfig, ServerConfig};
pub use crate::core::{normalizer::normalize, service::EverflowService};
pub use crate::domain::model::{
    DateRange, EntityKind, NormalizedResult, PerformanceRecord, Report, SourceShape, Totals,
};
pub use crate::utils::error::{DashError, Result};
