//! Offline security directory.

use anyhow::{Context, Result};
use market_core::{normalize_ticker, SecurityDirectory, SecurityRecord};
use std::collections::HashMap;
use std::path::Path;

/// In-memory directory; the first record wins when a ticker repeats.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    records: Vec<SecurityRecord>,
    index: HashMap<String, usize>,
}

impl StaticDirectory {
    pub fn new(records: Vec<SecurityRecord>) -> Self {
        let mut kept = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());

        for mut record in records {
            record.ticker = normalize_ticker(&record.ticker);
            if record.ticker.is_empty() || index.contains_key(&record.ticker) {
                continue;
            }
            index.insert(record.ticker.clone(), kept.len());
            kept.push(record);
        }

        Self { records: kept, index }
    }

    /// Load a JSON array of `{ticker, name, sector?, industry?}` records.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read security directory {}", path.display()))?;
        let records: Vec<SecurityRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse security directory {}", path.display()))?;
        tracing::info!("Loaded {} securities from {}", records.len(), path.display());
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl SecurityDirectory for StaticDirectory {
    fn list_all(&self) -> Vec<SecurityRecord> {
        self.records.clone()
    }

    fn lookup_profile(&self, ticker: &str) -> Option<(Option<String>, Option<String>)> {
        let idx = self.index.get(&normalize_ticker(ticker))?;
        let record = self.records.get(*idx)?;
        Some((record.sector.clone(), record.industry.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ticker: &str, sector: Option<&str>, industry: Option<&str>) -> SecurityRecord {
        SecurityRecord {
            ticker: ticker.to_string(),
            name: format!("{} Corp", ticker),
            sector: sector.map(String::from),
            industry: industry.map(String::from),
        }
    }

    #[test]
    fn test_tickers_normalized_and_first_wins() {
        let dir = StaticDirectory::new(vec![
            record("brk.b", Some("Financials"), Some("Insurance")),
            record("BRK-B", Some("Wrong"), None),
            record("  ", None, None),
        ]);
        assert_eq!(dir.len(), 1);
        assert_eq!(
            dir.lookup_profile("BRK.B"),
            Some((Some("Financials".to_string()), Some("Insurance".to_string())))
        );
        assert_eq!(dir.list_all()[0].ticker, "BRK-B");
    }

    #[test]
    fn test_unknown_ticker() {
        let dir = StaticDirectory::new(vec![record("AAPL", Some("Technology"), None)]);
        assert_eq!(dir.lookup_profile("ZZZZ"), None);
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!("security-directory-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[
                {"ticker": "NVDA", "name": "NVIDIA", "sector": "Technology", "industry": "Semiconductors"},
                {"ticker": "XOM", "name": "Exxon Mobil"}
            ]"#,
        )
        .unwrap();

        let dir = StaticDirectory::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(dir.len(), 2);
        assert_eq!(dir.lookup_profile("XOM"), Some((None, None)));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(StaticDirectory::from_json_file("/nonexistent/securities.json").is_err());
    }
}
