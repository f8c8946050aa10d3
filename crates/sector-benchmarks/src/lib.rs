//! Benchmark classification
//!
//! Maps free-text provider sector/industry strings into closed enumerations,
//! each carrying the liquid ETF used as its benchmark, and ranks peer candidates.

pub mod industries;
pub mod peers;
pub mod sectors;

pub use industries::IndustryBenchmark;
pub use peers::{select_peers, PeerCandidate, PeerSelection, PeerTier};
pub use sectors::{clean_profile_str, Sector, SP500_PROXY};
