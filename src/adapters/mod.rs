//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
#[cfg(feature = "yahoo")]
pub mod yahoo_adapter;
#[cfg(feature = "web")]
pub mod web;

use std::sync::Arc;

use crate::domain::error::MetalcorrError;
use crate::ports::data_port::MarketDataPort;
use crate::settings::{ProviderKind, ProviderSettings};

pub type SharedDataPort = Arc<dyn MarketDataPort + Send + Sync>;

/// Build the data source selected by `[provider] kind`.
pub fn data_port_from_settings(settings: &ProviderSettings) -> Result<SharedDataPort, MetalcorrError> {
    match settings.kind {
        ProviderKind::Csv => {
            let path = settings
                .csv_path
                .clone()
                .ok_or_else(|| MetalcorrError::ConfigMissing {
                    section: "provider".into(),
                    key: "csv_path".into(),
                })?;
            Ok(Arc::new(csv_adapter::CsvAdapter::new(path)))
        }
        #[cfg(feature = "yahoo")]
        ProviderKind::Yahoo => {
            let config = yahoo_adapter::YahooConfig::from(settings);
            Ok(Arc::new(yahoo_adapter::YahooAdapter::new(&config)?))
        }
        #[cfg(not(feature = "yahoo"))]
        ProviderKind::Yahoo => Err(MetalcorrError::ConfigInvalid {
            section: "provider".into(),
            key: "kind".into(),
            reason: "yahoo feature is required for the yahoo provider".into(),
        }),
    }
}
