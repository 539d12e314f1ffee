pub mod config;
pub mod error;
pub mod extractors;
pub mod ids;
pub mod merge;
pub mod model;
pub mod orchestrator;
pub mod parse;
pub mod proxy;
pub mod report;
pub mod sources;
pub mod transport;

pub use config::{DEFAULT_PROXY_LIST_URL, NovelryConfig, NovelryConfigBuilder};
pub use error::{NovelryError, Result};
pub use ids::SeriesId;
pub use merge::{BOILERPLATE_DESCRIPTION, merge, normalize};
pub use model::{ChapterNo, ChapterRecord, FeedEntry, LinkRef, MetadataRecord, Named, Rating, SearchResult};
pub use orchestrator::Orchestrator;
pub use parse::Document;
pub use proxy::{ProxyEntry, ProxyPool, ProxyProtocol};
pub use report::{ErrorReport, FeedReport, SearchReport, to_json};
pub use sources::{Operation, Source, SourceDescriptor, SourceRegistry, UrlParams};
pub use transport::{FetchAttempt, FetchOutcome, Transport, TransportKind, Transports};
