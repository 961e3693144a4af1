//! Typed runtime settings read from the INI configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::error::MetalcorrError;
use crate::domain::ticker::TickerTable;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:5000";
pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) metalcorr/0.1";
pub const DEFAULT_LOOKBACK_DAYS: i64 = 730;
pub const DEFAULT_METALS_LOOKBACK_DAYS: i64 = 1095;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
/// Upper bound for any trailing window, about a century.
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Yahoo,
    Csv,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub csv_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub listen: SocketAddr,
    pub provider: ProviderSettings,
    pub lookback_days: i64,
    pub metals_lookback_days: i64,
    pub log_level: String,
    pub tickers: TickerTable,
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> MetalcorrError {
    MetalcorrError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason: reason.into(),
    }
}

/// Check a trailing-window length in days.
pub fn validate_lookback(days: i64) -> Result<i64, String> {
    if days <= 0 {
        return Err(format!("must be positive, got {days}"));
    }
    if days > MAX_LOOKBACK_DAYS {
        return Err(format!("must be at most {MAX_LOOKBACK_DAYS}, got {days}"));
    }
    Ok(days)
}

fn read_lookback(config: &dyn ConfigPort, key: &str, default: i64) -> Result<i64, MetalcorrError> {
    validate_lookback(config.get_int("analysis", key, default))
        .map_err(|reason| invalid("analysis", key, reason))
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, MetalcorrError> {
        let listen_str = config
            .get_string("web", "listen")
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let listen: SocketAddr = listen_str
            .trim()
            .parse()
            .map_err(|e: std::net::AddrParseError| invalid("web", "listen", e.to_string()))?;

        let kind = match config
            .get_string("provider", "kind")
            .map(|k| k.trim().to_lowercase())
            .as_deref()
        {
            None | Some("yahoo") => ProviderKind::Yahoo,
            Some("csv") => ProviderKind::Csv,
            Some(other) => {
                return Err(invalid(
                    "provider",
                    "kind",
                    format!("expected yahoo or csv, got {other}"),
                ));
            }
        };

        let csv_path = config
            .get_string("provider", "csv_path")
            .map(|p| PathBuf::from(p.trim()));
        if kind == ProviderKind::Csv && csv_path.is_none() {
            return Err(MetalcorrError::ConfigMissing {
                section: "provider".into(),
                key: "csv_path".into(),
            });
        }

        let timeout_secs =
            config.get_double("provider", "timeout_secs", DEFAULT_TIMEOUT.as_secs_f64());
        let timeout = Duration::try_from_secs_f64(timeout_secs)
            .ok()
            .filter(|t| !t.is_zero())
            .ok_or_else(|| invalid("provider", "timeout_secs", "must be a positive number"))?;

        Ok(Self {
            listen,
            provider: ProviderSettings {
                kind,
                base_url: config
                    .get_string("provider", "base_url")
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                user_agent: config
                    .get_string("provider", "user_agent")
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
                timeout,
                csv_path,
            },
            lookback_days: read_lookback(config, "lookback_days", DEFAULT_LOOKBACK_DAYS)?,
            metals_lookback_days: read_lookback(
                config,
                "metals_lookback_days",
                DEFAULT_METALS_LOOKBACK_DAYS,
            )?,
            log_level: config
                .get_string("logging", "level")
                .unwrap_or_else(|| "info".to_string()),
            tickers: TickerTable::from_config(config),
        })
    }
}
