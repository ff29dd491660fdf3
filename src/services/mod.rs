// Service exports
pub mod cache;
pub mod matching;
pub mod postgres;
pub mod store;

pub use cache::{AttributeCache, CacheKey, CacheStats};
pub use matching::{MatchOutcome, MatchingService};
pub use postgres::PostgresReportStore;
pub use store::{InMemoryReportStore, ReportStore, StoreError};
