use market_core::{SecurityDirectory, TickerProfile};
use sector_benchmarks::clean_profile_str;
use std::sync::Arc;

use crate::cache::ResultCache;
use crate::cascade::{DataSourceCascade, RequestState};

/// Resolves sector/industry/fundamentals for a ticker.
///
/// Network lookups are gated by a flag; the offline directory fills in
/// whatever sector or industry is still missing afterwards.
pub struct ProfileResolver {
    cascade: Arc<DataSourceCascade>,
    cache: Arc<ResultCache>,
    directory: Arc<dyn SecurityDirectory>,
    network_enabled: bool,
}

impl ProfileResolver {
    pub fn new(
        cascade: Arc<DataSourceCascade>,
        cache: Arc<ResultCache>,
        directory: Arc<dyn SecurityDirectory>,
        network_enabled: bool,
    ) -> Self {
        Self {
            cascade,
            cache,
            directory,
            network_enabled,
        }
    }

    pub fn network_enabled(&self) -> bool {
        self.network_enabled
    }

    /// Cached provider profile; only successful lookups are cached.
    pub async fn network_profile(&self, ticker: &str, state: &RequestState) -> Option<TickerProfile> {
        if !self.network_enabled {
            return None;
        }
        if let Some(profile) = self.cache.profiles.get(ticker) {
            tracing::debug!("Profile cache hit for {}", ticker);
            return Some(profile);
        }
        match self.cascade.fetch_profile(ticker, state).await {
            Ok(profile) => {
                self.cache.profiles.insert(ticker, profile.clone());
                Some(profile)
            }
            Err(e) => {
                tracing::debug!("Profile unavailable for {}: {}", ticker, e);
                None
            }
        }
    }

    /// Provider profile with cleaned sector/industry, backfilled from the directory.
    pub async fn resolve(&self, ticker: &str, state: &RequestState) -> TickerProfile {
        let mut profile = self.network_profile(ticker, state).await.unwrap_or_default();
        profile.sector = clean_profile_str(profile.sector.as_deref());
        profile.industry = clean_profile_str(profile.industry.as_deref());

        if profile.sector.is_none() || profile.industry.is_none() {
            if let Some((sector, industry)) = self.directory.lookup_profile(ticker) {
                profile.sector = profile.sector.or_else(|| clean_profile_str(sector.as_deref()));
                profile.industry = profile.industry.or_else(|| clean_profile_str(industry.as_deref()));
            }
        }
        profile
    }
}
