//! Logical instrument names mapped to provider ticker symbols.

use crate::ports::config_port::ConfigPort;

const DEFAULT_METALS: &[(&str, &str)] = &[
    ("Gold", "GC=F"),
    ("Silver", "SI=F"),
    ("Copper", "HG=F"),
    ("Platinum", "PL=F"),
    ("Palladium", "PA=F"),
    ("Aluminium", "ALI=F"),
    // ETF proxies: the futures for these are unavailable or frozen.
    ("Nickel", "NICK.L"),
    ("Zinc", "ZINC.L"),
    ("Lead", "LEED.L"),
    ("Tin", "TIN.L"),
];

const DEFAULT_STEEL: &[(&str, &str)] = &[
    ("CRU Index", "HRC=F"),
    ("DJUSST", "^DJUSST"),
    ("HRC Futures", "HRC=F"),
    ("SGX Iron Ore", "TIO=F"),
];

/// Ordered name → ticker tables for metals and steel/iron indices.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerTable {
    metals: Vec<(String, String)>,
    steel: Vec<(String, String)>,
}

impl Default for TickerTable {
    fn default() -> Self {
        Self {
            metals: owned(DEFAULT_METALS),
            steel: owned(DEFAULT_STEEL),
        }
    }
}

fn owned(entries: &[(&str, &str)]) -> Vec<(String, String)> {
    entries
        .iter()
        .map(|(name, ticker)| (name.to_string(), ticker.to_string()))
        .collect()
}

fn upsert(table: &mut Vec<(String, String)>, name: String, ticker: String) {
    match table.iter_mut().find(|(n, _)| *n == name) {
        Some(entry) => entry.1 = ticker,
        None => table.push((name, ticker)),
    }
}

impl TickerTable {
    pub fn new(metals: Vec<(String, String)>, steel: Vec<(String, String)>) -> Self {
        Self { metals, steel }
    }

    /// Built-in tables overlaid with the `[metals]` and `[steel]` sections.
    pub fn from_config(config: &dyn ConfigPort) -> Self {
        let mut table = Self::default();
        for (name, ticker) in config.get_section("metals") {
            upsert(&mut table.metals, name, ticker);
        }
        for (name, ticker) in config.get_section("steel") {
            upsert(&mut table.steel, name, ticker);
        }
        table
    }

    pub fn metal_ticker(&self, name: &str) -> Option<&str> {
        self.metals
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t.as_str())
    }

    pub fn metals(&self) -> &[(String, String)] {
        &self.metals
    }

    pub fn steel(&self) -> &[(String, String)] {
        &self.steel
    }

    /// Metals then steel entries, in table order.
    pub fn all(&self) -> impl Iterator<Item = (&str, &str)> {
        self.metals
            .iter()
            .chain(&self.steel)
            .map(|(n, t)| (n.as_str(), t.as_str()))
    }
}

/// Rewrite a user-entered stock identifier into the provider's ticker form.
pub fn resolve_stock_ticker(stock_id: &str) -> String {
    let id = stock_id.trim().to_uppercase();
    if id.ends_with(".TW") || id.ends_with(".TWO") {
        return id;
    }
    if let Some(base) = id.strip_suffix(".JP") {
        return format!("{base}.T");
    }
    id
}
