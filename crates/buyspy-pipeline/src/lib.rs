pub mod analyze;
pub mod coordinator;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod query;
pub mod rank;
pub mod resolver;
mod retry;
pub mod search;
pub mod task;
pub mod tier;

pub use analyze::{ExtractedOffer, HtmlPageAnalyzer, PageAnalysis, PageAnalyzer};
pub use coordinator::{
    CoordinatorReport, CoordinatorSettings, ExtractionCoordinator, ResultsCollector,
};
pub use error::{ExtractionError, ExtractionErrorKind, PipelineError, SearchError};
pub use normalize::{canonicalize_url, normalize_candidates, registrable_domain};
pub use pipeline::{DiscoveryOutcome, PipelineSettings, PricePipeline};
pub use query::formulate_query;
pub use rank::{build_ranked_result, rank_offers};
pub use search::{collect_search_results, SearchCapability, SearchHit, SerperSearchClient};
pub use task::{ExtractionTask, TaskOutcome, TaskState};
pub use tier::TierClassifier;
