//! Industry benchmarks
//!
//! Industries are matched by keyword against an ordered rule table; the first
//! rule that matches wins, so the more specific rules sit at the top
//! ("internet retail" before "internet", "semiconductor" before everything).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndustryBenchmark {
    Semiconductors,
    ConsumerTech,
    Software,
    OnlineRetail,
    Internet,
    Cybersecurity,
    Biotech,
    Retail,
    Banks,
    OilAndGas,
}

const RULES: &[(&[&str], IndustryBenchmark)] = &[
    (&["semiconductor", "semi", "chip"], IndustryBenchmark::Semiconductors),
    (
        &["consumer electronics", "iphone", "smartphone", "wearable"],
        IndustryBenchmark::ConsumerTech,
    ),
    (&["software", "application", "saas", "cloud"], IndustryBenchmark::Software),
    (
        &["internet retail", "e-commerce", "ecommerce", "online retail"],
        IndustryBenchmark::OnlineRetail,
    ),
    (&["internet", "digital"], IndustryBenchmark::Internet),
    (&["cyber", "security"], IndustryBenchmark::Cybersecurity),
    (&["biotech"], IndustryBenchmark::Biotech),
    (&["retail"], IndustryBenchmark::Retail),
    (&["bank"], IndustryBenchmark::Banks),
    (
        &["oil", "gas", "exploration", "drilling", "energy equipment"],
        IndustryBenchmark::OilAndGas,
    ),
];

impl IndustryBenchmark {
    /// First rule whose keyword occurs in the (case-folded) industry string
    pub fn classify(industry: Option<&str>) -> Option<IndustryBenchmark> {
        let industry = industry?.trim().to_lowercase();
        if industry.is_empty() {
            return None;
        }
        RULES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| industry.contains(k)))
            .map(|(_, benchmark)| *benchmark)
    }

    pub fn etf(&self) -> &'static str {
        match self {
            IndustryBenchmark::Semiconductors => "SOXX",
            IndustryBenchmark::ConsumerTech => "VGT",
            IndustryBenchmark::Software => "IGV",
            IndustryBenchmark::OnlineRetail => "IBUY",
            IndustryBenchmark::Internet => "FDN",
            IndustryBenchmark::Cybersecurity => "HACK",
            IndustryBenchmark::Biotech => "IBB",
            IndustryBenchmark::Retail => "XRT",
            IndustryBenchmark::Banks => "KBE",
            IndustryBenchmark::OilAndGas => "XOP",
        }
    }

    /// Display label, e.g. "Semiconductors (SOXX)"
    pub fn label(&self) -> String {
        let name = match self {
            IndustryBenchmark::Semiconductors => "Semiconductors",
            IndustryBenchmark::ConsumerTech => "Consumer Tech",
            IndustryBenchmark::Software => "Software",
            IndustryBenchmark::OnlineRetail => "Online Retail",
            IndustryBenchmark::Internet => "Internet",
            IndustryBenchmark::Cybersecurity => "Cybersecurity",
            IndustryBenchmark::Biotech => "Biotech",
            IndustryBenchmark::Retail => "Retail",
            IndustryBenchmark::Banks => "Banks",
            IndustryBenchmark::OilAndGas => "Oil & Gas",
        };
        format!("{} ({})", name, self.etf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_matches() {
        assert_eq!(
            IndustryBenchmark::classify(Some("Semiconductors")),
            Some(IndustryBenchmark::Semiconductors)
        );
        assert_eq!(
            IndustryBenchmark::classify(Some("Software - Infrastructure")),
            Some(IndustryBenchmark::Software)
        );
        assert_eq!(
            IndustryBenchmark::classify(Some("Banks - Regional")),
            Some(IndustryBenchmark::Banks)
        );
        assert_eq!(
            IndustryBenchmark::classify(Some("Oil & Gas E&P")),
            Some(IndustryBenchmark::OilAndGas)
        );
        assert_eq!(
            IndustryBenchmark::classify(Some("Biotechnology")),
            Some(IndustryBenchmark::Biotech)
        );
    }

    #[test]
    fn test_first_rule_wins() {
        // Matches both the online-retail and internet rules
        assert_eq!(
            IndustryBenchmark::classify(Some("Internet Retail")),
            Some(IndustryBenchmark::OnlineRetail)
        );
        assert_eq!(
            IndustryBenchmark::classify(Some("Semiconductor Equipment & Materials")),
            Some(IndustryBenchmark::Semiconductors)
        );
        assert_eq!(
            IndustryBenchmark::classify(Some("Specialty Retail")),
            Some(IndustryBenchmark::Retail)
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(IndustryBenchmark::classify(Some("Insurance - Life")), None);
        assert_eq!(IndustryBenchmark::classify(Some("   ")), None);
        assert_eq!(IndustryBenchmark::classify(None), None);
    }

    #[test]
    fn test_label() {
        assert_eq!(IndustryBenchmark::Semiconductors.label(), "Semiconductors (SOXX)");
        assert_eq!(IndustryBenchmark::OilAndGas.label(), "Oil & Gas (XOP)");
    }
}
