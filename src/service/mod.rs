pub mod aggregate;
pub mod enrichment;
pub mod error;
pub mod issues;
pub mod predicate;
pub mod sanitize;

pub use enrichment::{Enrichment, EnrichmentOrchestrator, Relations};
pub use error::ServiceError;
pub use issues::IssueQueryService;
