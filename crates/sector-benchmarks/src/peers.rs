use serde::{Deserialize, Serialize};

use crate::sectors::Sector;

/// Which match tier produced a peer group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerTier {
    Industry,
    Sector,
}

impl PeerTier {
    pub fn label(&self) -> &'static str {
        match self {
            PeerTier::Industry => "Industry peers",
            PeerTier::Sector => "Sector peers",
        }
    }
}

/// A directory entry with whatever profile data could be resolved for it
#[derive(Debug, Clone, PartialEq)]
pub struct PeerCandidate {
    pub ticker: String,
    pub sector: Sector,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeerSelection {
    pub tier: PeerTier,
    /// Largest market cap first
    pub tickers: Vec<String>,
}

fn same_industry(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    !a.is_empty() && a.eq_ignore_ascii_case(b)
}

/// Pick up to `max_peers` comparables for `target`.
///
/// Industry matches are preferred; sector matches are only used when no
/// candidate shares the target's industry. Candidates without a market cap
/// rank last.
pub fn select_peers(
    target: &str,
    target_sector: Sector,
    target_industry: Option<&str>,
    candidates: &[PeerCandidate],
    max_peers: usize,
) -> Option<PeerSelection> {
    if max_peers == 0 {
        return None;
    }
    let others = move || {
        candidates
            .iter()
            .filter(move |c| !c.ticker.eq_ignore_ascii_case(target))
    };

    let industry_matches: Vec<&PeerCandidate> = match target_industry {
        Some(industry) => others()
            .filter(|c| c.industry.as_deref().is_some_and(|i| same_industry(i, industry)))
            .collect(),
        None => Vec::new(),
    };

    let (tier, mut matches) = if !industry_matches.is_empty() {
        (PeerTier::Industry, industry_matches)
    } else if target_sector.is_known() {
        (
            PeerTier::Sector,
            others().filter(|c| c.sector == target_sector).collect(),
        )
    } else {
        return None;
    };

    if matches.is_empty() {
        return None;
    }

    matches.sort_by(|a, b| {
        let cap_a = a.market_cap.unwrap_or(0.0);
        let cap_b = b.market_cap.unwrap_or(0.0);
        cap_b.total_cmp(&cap_a).then_with(|| a.ticker.cmp(&b.ticker))
    });

    let tickers: Vec<String> = matches
        .into_iter()
        .take(max_peers)
        .map(|c| c.ticker.clone())
        .collect();

    Some(PeerSelection { tier, tickers })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(ticker: &str, sector: Sector, industry: &str, cap: Option<f64>) -> PeerCandidate {
        PeerCandidate {
            ticker: ticker.to_string(),
            sector,
            industry: Some(industry.to_string()),
            market_cap: cap,
        }
    }

    fn universe() -> Vec<PeerCandidate> {
        vec![
            candidate("AMD", Sector::Technology, "Semiconductors", Some(2.5e11)),
            candidate("NVDA", Sector::Technology, "Semiconductors", Some(2.0e12)),
            candidate("INTC", Sector::Technology, "semiconductors", Some(1.5e11)),
            candidate("MSFT", Sector::Technology, "Software - Infrastructure", Some(3.0e12)),
            candidate("XOM", Sector::Energy, "Oil & Gas Integrated", Some(4.0e11)),
        ]
    }

    #[test]
    fn test_industry_tier_ranked_by_market_cap() {
        let selection =
            select_peers("AVGO", Sector::Technology, Some("Semiconductors"), &universe(), 10).unwrap();
        assert_eq!(selection.tier, PeerTier::Industry);
        assert_eq!(selection.tickers, vec!["NVDA", "AMD", "INTC"]);
        assert_eq!(selection.tier.label(), "Industry peers");
    }

    #[test]
    fn test_target_is_excluded() {
        let selection =
            select_peers("nvda", Sector::Technology, Some("Semiconductors"), &universe(), 10).unwrap();
        assert!(!selection.tickers.iter().any(|t| t == "NVDA"));
    }

    #[test]
    fn test_sector_tier_when_no_industry_match() {
        let selection =
            select_peers("ORCL", Sector::Technology, Some("Software - Application"), &universe(), 2).unwrap();
        assert_eq!(selection.tier, PeerTier::Sector);
        assert_eq!(selection.tickers, vec!["MSFT", "NVDA"]);
    }

    #[test]
    fn test_unknown_sector_without_industry_match_has_no_peers() {
        assert_eq!(select_peers("ABC", Sector::Unknown, Some("Shell Companies"), &universe(), 10), None);
        assert_eq!(select_peers("ABC", Sector::Utilities, None, &universe(), 10), None);
    }

    #[test]
    fn test_missing_market_cap_ranks_last() {
        let mut pool = universe();
        pool.push(candidate("TINY", Sector::Technology, "Semiconductors", None));
        let selection =
            select_peers("AVGO", Sector::Technology, Some("Semiconductors"), &pool, 10).unwrap();
        assert_eq!(selection.tickers.last().map(String::as_str), Some("TINY"));
    }

    #[test]
    fn test_zero_cap_selects_nothing() {
        assert_eq!(select_peers("AVGO", Sector::Technology, Some("Semiconductors"), &universe(), 0), None);
    }
}
