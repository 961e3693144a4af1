//! Pairing orchestrator.
//!
//! One [`analyze`] call fetches every requested stock (and optionally one
//! metal), correlates each stock against the metal, then correlates every
//! unique pair of successfully fetched stocks. Every value here lives for a
//! single request.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::domain::align::{AlignedPoint, align};
use crate::domain::correlation::{CorrelationResult, correlate};
use crate::domain::date_range::DateRange;
use crate::domain::error::MetalcorrError;
use crate::domain::series::{PricePoint, Series, normalize_history};
use crate::domain::ticker::{TickerTable, resolve_stock_ticker};
use crate::ports::data_port::MarketDataPort;

/// Request body of `POST /analyze`, as sent by clients.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzeParams {
    #[serde(default)]
    pub stock_ids: Option<Vec<String>>,
    /// Legacy single-stock form.
    #[serde(default)]
    pub stock_id: Option<String>,
    #[serde(default)]
    pub metal: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Validated analysis input.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    /// Trimmed, non-empty and unique, in caller order.
    pub stock_ids: Vec<String>,
    pub metal: Option<String>,
    pub range: DateRange,
}

impl AnalysisRequest {
    pub fn from_params(
        params: AnalyzeParams,
        today: NaiveDate,
        lookback_days: i64,
    ) -> Result<Self, MetalcorrError> {
        let mut ids = params.stock_ids.unwrap_or_default();
        if ids.is_empty() {
            ids.extend(params.stock_id);
        }

        let mut stock_ids: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.trim();
            if !id.is_empty() && !stock_ids.iter().any(|s| s == id) {
                stock_ids.push(id.to_string());
            }
        }
        if stock_ids.is_empty() {
            return Err(MetalcorrError::MissingStockIds);
        }

        let range = DateRange::resolve(
            params.start_date.as_deref(),
            params.end_date.as_deref(),
            today,
            lookback_days,
        )?;

        Ok(Self {
            stock_ids,
            metal: params
                .metal
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
            range,
        })
    }
}

/// Where a stock's display name came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayName {
    Provider(String),
    /// The provider had no usable name; the caller's identifier stands in.
    Identifier(String),
}

impl DisplayName {
    pub fn resolve(port: &dyn MarketDataPort, ticker: &str, stock_id: &str) -> Self {
        match port.fetch_display_name(ticker) {
            Ok(Some(name)) if !name.trim().is_empty() => Self::Provider(name.trim().to_string()),
            Ok(_) => Self::Identifier(stock_id.to_string()),
            Err(e) => {
                debug!(ticker, error = %e, "display name unavailable");
                Self::Identifier(stock_id.to_string())
            }
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Provider(name) | Self::Identifier(name) => name,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            Self::Provider(name) | Self::Identifier(name) => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub stock_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metal_price: Option<f64>,
}

impl From<&PricePoint> for ChartPoint {
    fn from(p: &PricePoint) -> Self {
        Self {
            date: p.date,
            stock_price: p.price,
            metal_price: None,
        }
    }
}

impl From<&AlignedPoint> for ChartPoint {
    fn from(p: &AlignedPoint) -> Self {
        Self {
            date: p.date,
            stock_price: p.a,
            metal_price: Some(p.b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairPoint {
    pub date: NaiveDate,
    pub price1: f64,
    pub price2: f64,
}

impl From<&AlignedPoint> for PairPoint {
    fn from(p: &AlignedPoint) -> Self {
        Self {
            date: p.date,
            price1: p.a,
            price2: p.b,
        }
    }
}

fn coefficient<S: Serializer>(r: &CorrelationResult, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(r.coefficient)
}

fn optional_coefficient<S: Serializer>(
    r: &Option<CorrelationResult>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match r {
        Some(r) => s.serialize_f64(r.coefficient),
        None => s.serialize_none(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockAnalysis {
    pub stock_id: String,
    #[serde(rename = "stock_name")]
    pub display_name: String,
    #[serde(rename = "ticker")]
    pub resolved_ticker: String,
    /// `None` when no metal was requested: there was nothing to compare.
    #[serde(serialize_with = "optional_coefficient")]
    pub correlation: Option<CorrelationResult>,
    #[serde(rename = "data")]
    pub aligned_points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockFailure {
    pub stock_id: String,
    pub stock_name: String,
    pub error: String,
}

impl StockFailure {
    fn new(stock_id: &str, err: &MetalcorrError) -> Self {
        let error = match err {
            MetalcorrError::NoData { .. } => "No data".to_string(),
            other => other.to_string(),
        };
        Self {
            stock_id: stock_id.to_string(),
            stock_name: stock_id.to_string(),
            error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StockOutcome {
    Analyzed(StockAnalysis),
    Failed(StockFailure),
}

impl StockOutcome {
    pub fn stock_id(&self) -> &str {
        match self {
            Self::Analyzed(a) => &a.stock_id,
            Self::Failed(f) => &f.stock_id,
        }
    }

    pub fn analyzed(&self) -> Option<&StockAnalysis> {
        match self {
            Self::Analyzed(a) => Some(a),
            Self::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairResult {
    #[serde(rename = "stock1")]
    pub stock_id_a: String,
    #[serde(rename = "stock2")]
    pub stock_id_b: String,
    #[serde(serialize_with = "coefficient")]
    pub correlation: CorrelationResult,
    #[serde(rename = "data")]
    pub aligned_points: Vec<PairPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    #[serde(rename = "metal_ticker")]
    pub metal_ticker_used: Option<String>,
    #[serde(rename = "stock_results")]
    pub per_stock: Vec<StockOutcome>,
    #[serde(rename = "stock_vs_stock")]
    pub per_pair: Vec<PairResult>,
}

/// Every unordered pair `(items[i], items[j])` with `i < j`, in input order.
pub fn unique_pairs<T>(items: &[T]) -> Vec<(&T, &T)> {
    items
        .iter()
        .enumerate()
        .flat_map(|(i, a)| items[i + 1..].iter().map(move |b| (a, b)))
        .collect()
}

pub fn fetch_series(
    port: &dyn MarketDataPort,
    ticker: &str,
    range: DateRange,
) -> Result<Series, MetalcorrError> {
    let raw = port.fetch_history(ticker, range.start, range.end)?;
    normalize_history(&raw)
}

fn fetch_metal(
    port: &dyn MarketDataPort,
    tickers: &TickerTable,
    name: &str,
    range: DateRange,
) -> Result<(String, Series), MetalcorrError> {
    let not_found = || MetalcorrError::MetalNotFound {
        name: name.to_string(),
    };
    let ticker = tickers.metal_ticker(name).ok_or_else(not_found)?;
    match fetch_series(port, ticker, range) {
        Ok(series) => Ok((ticker.to_string(), series)),
        Err(e) => {
            warn!(metal = name, ticker, error = %e, "metal fetch failed");
            Err(not_found())
        }
    }
}

/// Run one analysis request.
///
/// Fails only when the requested metal cannot be resolved or fetched. Stock
/// fetch failures become [`StockOutcome::Failed`] entries and are left out
/// of the pair comparisons.
pub fn analyze(
    port: &dyn MarketDataPort,
    tickers: &TickerTable,
    request: &AnalysisRequest,
) -> Result<AnalysisResult, MetalcorrError> {
    info!(
        stocks = request.stock_ids.len(),
        metal = request.metal.as_deref().unwrap_or("none"),
        start = %request.range.start,
        end = %request.range.end,
        "analysis started"
    );

    let metal = match request.metal.as_deref() {
        Some(name) => Some(fetch_metal(port, tickers, name, request.range)?),
        None => None,
    };

    let mut per_stock = Vec::with_capacity(request.stock_ids.len());
    let mut fetched: Vec<(&str, Series)> = Vec::with_capacity(request.stock_ids.len());

    for stock_id in &request.stock_ids {
        let ticker = resolve_stock_ticker(stock_id);
        let series = match fetch_series(port, &ticker, request.range) {
            Ok(series) => series,
            Err(e) => {
                warn!(stock_id = %stock_id, ticker = %ticker, error = %e, "stock fetch failed");
                per_stock.push(StockOutcome::Failed(StockFailure::new(stock_id, &e)));
                continue;
            }
        };
        let display_name = DisplayName::resolve(port, &ticker, stock_id);

        let (correlation, aligned_points) = match &metal {
            Some((_, metal_series)) => {
                let pair = align(&series, metal_series);
                let points = pair.points.iter().map(ChartPoint::from).collect();
                (Some(correlate(&pair)), points)
            }
            None => (None, series.points().iter().map(ChartPoint::from).collect()),
        };
        debug!(
            stock_id = %stock_id,
            ticker = %ticker,
            points = series.len(),
            coefficient = correlation.map(|c| c.coefficient),
            "stock analyzed"
        );

        per_stock.push(StockOutcome::Analyzed(StockAnalysis {
            stock_id: stock_id.clone(),
            display_name: display_name.into_string(),
            resolved_ticker: ticker,
            correlation,
            aligned_points,
        }));
        fetched.push((stock_id.as_str(), series));
    }

    let per_pair: Vec<PairResult> = unique_pairs(&fetched)
        .into_iter()
        .map(|((id_a, a), (id_b, b))| {
            let pair = align(a, b);
            PairResult {
                stock_id_a: id_a.to_string(),
                stock_id_b: id_b.to_string(),
                correlation: correlate(&pair),
                aligned_points: pair.points.iter().map(PairPoint::from).collect(),
            }
        })
        .collect();

    info!(
        analyzed = fetched.len(),
        failed = per_stock.len() - fetched.len(),
        pairs = per_pair.len(),
        "analysis finished"
    );

    Ok(AnalysisResult {
        metal_ticker_used: metal.map(|(ticker, _)| ticker),
        per_stock,
        per_pair,
    })
}
