//! Sector classification
//!
//! Providers name the same GICS sector in several ways ("Healthcare",
//! "Health Care", "Consumer Cyclical", ...). `Sector::from_raw` is the single
//! place where those strings are folded into the enumeration.

use serde::{Deserialize, Serialize};

/// Broad-market proxy used for the S&P 500 daily move
pub const SP500_PROXY: &str = "SPY";

/// Tokens that leak into sector/industry fields from company-name parsing
const BAD_PROFILE_VALUES: &[&str] = &[
    "inc",
    "inc.",
    "incorporated",
    "corp",
    "corp.",
    "corporation",
    "ltd",
    "ltd.",
    "limited",
    "plc",
    "co",
    "co.",
    "company",
    "group",
    "holdings",
    "holding",
];

/// Validate a free-text sector or industry value.
///
/// Corporate suffixes and single short tokens are treated as missing data.
pub fn clean_profile_str(raw: Option<&str>) -> Option<String> {
    let value = raw?.trim();
    if value.is_empty() {
        return None;
    }
    let lower = value.to_lowercase();
    if BAD_PROFILE_VALUES.contains(&lower.as_str()) {
        return None;
    }
    if value.split_whitespace().count() == 1 && value.chars().count() <= 4 {
        return None;
    }
    Some(value.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    Technology,
    HealthCare,
    Financials,
    ConsumerDiscretionary,
    ConsumerStaples,
    Industrials,
    Energy,
    Utilities,
    RealEstate,
    Materials,
    CommunicationServices,
    #[default]
    Unknown,
}

impl Sector {
    pub const ALL: [Sector; 11] = [
        Sector::Technology,
        Sector::HealthCare,
        Sector::Financials,
        Sector::ConsumerDiscretionary,
        Sector::ConsumerStaples,
        Sector::Industrials,
        Sector::Energy,
        Sector::Utilities,
        Sector::RealEstate,
        Sector::Materials,
        Sector::CommunicationServices,
    ];

    pub fn from_raw(raw: Option<&str>) -> Sector {
        let Some(cleaned) = clean_profile_str(raw) else {
            return Sector::Unknown;
        };
        match cleaned.to_lowercase().as_str() {
            "technology" | "information technology" => Sector::Technology,
            "health care" | "healthcare" => Sector::HealthCare,
            "financials" | "financial services" | "financial" => Sector::Financials,
            "consumer discretionary" | "consumer cyclical" => Sector::ConsumerDiscretionary,
            "consumer staples" | "consumer defensive" => Sector::ConsumerStaples,
            "industrials" => Sector::Industrials,
            "energy" => Sector::Energy,
            "utilities" => Sector::Utilities,
            "real estate" => Sector::RealEstate,
            "materials" | "basic materials" => Sector::Materials,
            "communication services" | "communication" => Sector::CommunicationServices,
            _ => Sector::Unknown,
        }
    }

    /// SPDR sector ETF
    pub fn etf(&self) -> Option<&'static str> {
        match self {
            Sector::Technology => Some("XLK"),
            Sector::HealthCare => Some("XLV"),
            Sector::Financials => Some("XLF"),
            Sector::ConsumerDiscretionary => Some("XLY"),
            Sector::ConsumerStaples => Some("XLP"),
            Sector::Industrials => Some("XLI"),
            Sector::Energy => Some("XLE"),
            Sector::Utilities => Some("XLU"),
            Sector::RealEstate => Some("XLRE"),
            Sector::Materials => Some("XLB"),
            Sector::CommunicationServices => Some("XLC"),
            Sector::Unknown => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Sector::Technology => "Technology",
            Sector::HealthCare => "Health Care",
            Sector::Financials => "Financials",
            Sector::ConsumerDiscretionary => "Consumer Discretionary",
            Sector::ConsumerStaples => "Consumer Staples",
            Sector::Industrials => "Industrials",
            Sector::Energy => "Energy",
            Sector::Utilities => "Utilities",
            Sector::RealEstate => "Real Estate",
            Sector::Materials => "Materials",
            Sector::CommunicationServices => "Communication Services",
            Sector::Unknown => "Unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        *self != Sector::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_variants_map_to_same_sector() {
        assert_eq!(Sector::from_raw(Some("Healthcare")), Sector::HealthCare);
        assert_eq!(Sector::from_raw(Some("Health Care")), Sector::HealthCare);
        assert_eq!(Sector::from_raw(Some("Consumer Cyclical")), Sector::ConsumerDiscretionary);
        assert_eq!(Sector::from_raw(Some("Consumer Defensive")), Sector::ConsumerStaples);
        assert_eq!(Sector::from_raw(Some("Basic Materials")), Sector::Materials);
        assert_eq!(Sector::from_raw(Some("Financial Services")), Sector::Financials);
        assert_eq!(Sector::from_raw(Some("TECHNOLOGY")), Sector::Technology);
    }

    #[test]
    fn test_unknown_sector_has_no_etf() {
        assert_eq!(Sector::from_raw(Some("Conglomerates")), Sector::Unknown);
        assert_eq!(Sector::from_raw(None), Sector::Unknown);
        assert_eq!(Sector::Unknown.etf(), None);
    }

    #[test]
    fn test_every_known_sector_has_an_etf() {
        for sector in Sector::ALL {
            assert!(sector.etf().is_some(), "{:?}", sector);
            assert_eq!(Sector::from_raw(Some(sector.name())), sector);
        }
    }

    #[test]
    fn test_clean_profile_str() {
        assert_eq!(clean_profile_str(Some("Inc.")), None);
        assert_eq!(clean_profile_str(Some("  Holdings ")), None);
        assert_eq!(clean_profile_str(Some("Tech")), None);
        assert_eq!(clean_profile_str(Some("")), None);
        assert_eq!(clean_profile_str(None), None);
        assert_eq!(clean_profile_str(Some(" Energy ")), Some("Energy".to_string()));
        assert_eq!(clean_profile_str(Some("Oil & Gas")), Some("Oil & Gas".to_string()));
    }
}
