//! Domain error types.

/// Top-level error type for metalcorr.
#[derive(Debug, thiserror::Error)]
pub enum MetalcorrError {
    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("provider error for {symbol}: {reason}")]
    Provider { symbol: String, reason: String },

    #[error("Could not fetch data for metal: {name}")]
    MetalNotFound { name: String },

    #[error("Missing stock_ids")]
    MissingStockIds,

    #[error("invalid {field} date {value:?}: expected YYYY-MM-DD")]
    InvalidDate { field: String, value: String },

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: String, end: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MetalcorrError {
    pub fn provider(symbol: impl Into<String>, reason: impl ToString) -> Self {
        Self::Provider {
            symbol: symbol.into(),
            reason: reason.to_string(),
        }
    }

    pub fn no_data(symbol: impl Into<String>) -> Self {
        Self::NoData {
            symbol: symbol.into(),
        }
    }
}

impl From<&MetalcorrError> for std::process::ExitCode {
    fn from(err: &MetalcorrError) -> Self {
        let code: u8 = match err {
            MetalcorrError::Io(_) => 1,
            MetalcorrError::ConfigParse { .. }
            | MetalcorrError::ConfigMissing { .. }
            | MetalcorrError::ConfigInvalid { .. } => 2,
            MetalcorrError::Provider { .. } => 3,
            MetalcorrError::MissingStockIds
            | MetalcorrError::InvalidDate { .. }
            | MetalcorrError::InvalidRange { .. } => 4,
            MetalcorrError::NoData { .. } | MetalcorrError::MetalNotFound { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metal_not_found_message_names_the_metal() {
        let err = MetalcorrError::MetalNotFound {
            name: "Unobtainium".into(),
        };
        assert_eq!(
            err.to_string(),
            "Could not fetch data for metal: Unobtainium"
        );
    }

    #[test]
    fn provider_helper_keeps_reason() {
        let err = MetalcorrError::provider("GC=F", "timed out");
        assert_eq!(err.to_string(), "provider error for GC=F: timed out");
    }
}
