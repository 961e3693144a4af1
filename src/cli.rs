//! CLI definition and dispatch.

use chrono::Local;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::{SharedDataPort, data_port_from_settings};
use crate::domain::analysis::{AnalysisRequest, AnalyzeParams, DisplayName, analyze};
use crate::domain::candles::metals_overview;
use crate::domain::date_range::DateRange;
use crate::domain::error::MetalcorrError;
use crate::domain::health::SeriesHealth;
use crate::domain::ticker::resolve_stock_ticker;
use crate::logging;
use crate::ports::data_port::MarketDataPort;
use crate::settings::{Settings, validate_lookback};

#[derive(Parser, Debug)]
#[command(name = "metalcorr", about = "Stock and metal price correlation service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web server
    Serve {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Correlate stocks against each other and optionally a metal
    Analyze {
        #[arg(short, long = "stock", required = true)]
        stocks: Vec<String>,
        #[arg(short, long)]
        metal: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print candle data for every metal and steel ticker
    Metals {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Fetch every configured ticker and report whether its prices look sane
    CheckTickers {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        days: Option<i64>,
    },
    /// Show the provider ticker and display name for stock identifiers
    Resolve {
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Serve { config } => run_serve(config.as_ref()),
        Command::Analyze {
            stocks,
            metal,
            start,
            end,
            config,
        } => {
            let params = AnalyzeParams {
                stock_ids: Some(stocks),
                stock_id: None,
                metal,
                start_date: start,
                end_date: end,
            };
            run_analyze(params, config.as_ref())
        }
        Command::Metals { config } => run_metals(config.as_ref()),
        Command::CheckTickers { config, days } => run_check_tickers(config.as_ref(), days),
        Command::Resolve { ids, config } => run_resolve(&ids, config.as_ref()),
    }
}

/// Load the INI file at `path`, or an empty configuration when none is given.
pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, ExitCode> {
    let Some(path) = path else {
        return Ok(FileConfigAdapter::empty());
    };
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = MetalcorrError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        fail(&err)
    })
}

fn fail(err: &MetalcorrError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

/// Load settings, start logging and build the configured data provider.
fn prepare(config_path: Option<&PathBuf>) -> Result<(Settings, SharedDataPort), ExitCode> {
    let config = load_config(config_path)?;
    let settings = Settings::from_config(&config).map_err(|e| fail(&e))?;
    logging::init(&settings.log_level);
    let data_port = data_port_from_settings(&settings.provider).map_err(|e| fail(&e))?;
    Ok((settings, data_port))
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize output: {e}");
            ExitCode::from(1)
        }
    }
}

fn run_analyze(params: AnalyzeParams, config_path: Option<&PathBuf>) -> ExitCode {
    let (settings, data_port) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let request =
        match AnalysisRequest::from_params(params, Local::now().date_naive(), settings.lookback_days)
        {
            Ok(r) => r,
            Err(e) => return fail(&e),
        };

    match analyze(&*data_port, &settings.tickers, &request) {
        Ok(result) => print_json(&result),
        Err(e) => fail(&e),
    }
}

fn run_metals(config_path: Option<&PathBuf>) -> ExitCode {
    let (settings, data_port) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let range = DateRange::trailing(Local::now().date_naive(), settings.metals_lookback_days);
    print_json(&metals_overview(&*data_port, &settings.tickers, range))
}

/// One line of the `check-tickers` report.
pub fn health_line(name: &str, ticker: &str, health: &Result<SeriesHealth, MetalcorrError>) -> String {
    match health {
        Ok(h) => format!(
            "{name:<16} {ticker:<10} rows={:<5} latest={:<12.4} mean={:<12.4} {}",
            h.rows, h.latest, h.mean, h.status
        ),
        Err(e) => format!("{name:<16} {ticker:<10} ERROR {e}"),
    }
}

fn run_check_tickers(config_path: Option<&PathBuf>, days: Option<i64>) -> ExitCode {
    let (settings, data_port) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let days = match validate_lookback(days.unwrap_or(settings.metals_lookback_days)) {
        Ok(d) => d,
        Err(reason) => {
            eprintln!("error: --days {reason}");
            return ExitCode::from(4);
        }
    };
    let range = DateRange::trailing(Local::now().date_naive(), days);
    eprintln!("Checking tickers from {} to {}", range.start, range.end);

    for (name, ticker) in settings.tickers.all() {
        let health = data_port
            .fetch_history(ticker, range.start, range.end)
            .map(|raw| SeriesHealth::of(&raw));
        println!("{}", health_line(name, ticker, &health));
    }
    ExitCode::SUCCESS
}

fn run_resolve(ids: &[String], config_path: Option<&PathBuf>) -> ExitCode {
    let (_, data_port) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };

    for id in ids {
        let ticker = resolve_stock_ticker(id);
        let name = DisplayName::resolve(&*data_port, &ticker, id);
        println!("{id}\t{ticker}\t{}", name.as_str());
    }
    ExitCode::SUCCESS
}

fn run_serve(config_path: Option<&PathBuf>) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, build_router};
        use std::sync::Arc;

        let (settings, data_port) = match prepare(config_path) {
            Ok(p) => p,
            Err(code) => return code,
        };

        let addr = settings.listen;
        let router = build_router(AppState::new(Arc::clone(&data_port), &settings));

        let runtime = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => return fail(&MetalcorrError::Io(e)),
        };

        eprintln!("Starting web server on {addr}");
        let result = runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            tracing::info!(%addr, "listening");
            axum::serve(listener, router).await
        });

        // The blocking HTTP client must be released outside the runtime.
        drop(runtime);
        drop(data_port);

        match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => fail(&MetalcorrError::Io(e)),
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::health::HealthStatus;

    #[test]
    fn parses_analyze_with_repeated_stocks() {
        let cli = Cli::try_parse_from([
            "metalcorr", "analyze", "--stock", "AAPL", "--stock", "MSFT", "--metal", "Gold",
        ])
        .unwrap();
        match cli.command {
            Command::Analyze { stocks, metal, start, .. } => {
                assert_eq!(stocks, vec!["AAPL", "MSFT"]);
                assert_eq!(metal.as_deref(), Some("Gold"));
                assert!(start.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn analyze_requires_a_stock() {
        assert!(Cli::try_parse_from(["metalcorr", "analyze", "--metal", "Gold"]).is_err());
    }

    #[test]
    fn parses_check_tickers_days() {
        let cli = Cli::try_parse_from(["metalcorr", "check-tickers", "--days", "30"]).unwrap();
        assert!(matches!(cli.command, Command::CheckTickers { days: Some(30), .. }));
    }

    #[test]
    fn oversized_days_is_rejected_before_fetching() {
        let cli = Cli::try_parse_from(["metalcorr", "check-tickers", "--days", "1000000000000"])
            .unwrap();
        let Command::CheckTickers { days: Some(days), .. } = cli.command else {
            panic!("expected check-tickers");
        };
        assert!(validate_lookback(days).is_err());
    }

    #[test]
    fn parses_resolve_ids() {
        let cli = Cli::try_parse_from(["metalcorr", "resolve", "2330.tw", "7203.JP"]).unwrap();
        match cli.command {
            Command::Resolve { ids, config } => {
                assert_eq!(ids, vec!["2330.tw", "7203.JP"]);
                assert!(config.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn load_config_without_path_is_empty() {
        assert!(load_config(None).is_ok());
    }

    #[test]
    fn health_line_shows_status() {
        let health = SeriesHealth {
            rows: 3,
            latest: 2050.5,
            mean: 2040.0,
            status: HealthStatus::Ok,
        };
        let line = health_line("Gold", "GC=F", &Ok(health));
        assert!(line.starts_with("Gold"));
        assert!(line.contains("rows=3"));
        assert!(line.ends_with("OK"));
    }

    #[test]
    fn health_line_shows_error() {
        let line = health_line("Tin", "TIN.L", &Err(MetalcorrError::provider("TIN.L", "timeout")));
        assert!(line.contains("ERROR"));
        assert!(line.contains("timeout"));
    }
}
