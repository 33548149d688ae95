use std::sync::Arc;

use crate::adapters::everflow::EverflowClient;
use crate::config::AppConfig;
use crate::core::service::EverflowService;
use crate::utils::error::Result;

pub struct AppState {
    pub config: AppConfig,
    pub service: EverflowService<EverflowClient>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Arc<Self>> {
        let client = EverflowClient::new(&config.everflow)?;
        let service = EverflowService::new(client, &config.everflow);

        Ok(Arc::new(Self { config, service }))
    }
}
