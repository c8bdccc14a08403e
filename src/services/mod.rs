pub mod aggregator;
pub mod backoff;
pub mod cache;
pub mod fetcher;
pub mod finnhub;
pub mod request_queue;

pub use backoff::BackoffPolicy;
pub use cache::{SharedSnapshotCache, SnapshotCache, SnapshotSource};
pub use fetcher::SnapshotFetcher;
pub use finnhub::{CompanyProfile, FinnhubClient, FinnhubError, Quote, QuoteApi};
pub use request_queue::RequestQueue;
