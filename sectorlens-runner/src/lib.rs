//! SectorLens Runner: everything around the analysis core that touches the
//! outside world.
//!
//! - Price providers (CSV directory, deterministic synthetic data)
//! - In-memory TTL cache in front of any provider
//! - Bounded parallel fetch pool with straggler timeout and symbol fallback
//! - Built-in NSE sector universes
//! - TOML run settings and the end-to-end `run_analysis` pipeline

pub mod cache;
pub mod csv_provider;
pub mod fetch;
pub mod pipeline;
pub mod provider;
pub mod settings;
pub mod synthetic;
pub mod universe;

pub use cache::{CachedProvider, TtlCache};
pub use csv_provider::CsvProvider;
pub use fetch::{fetch_all, FetchJob, FetchOutcome};
pub use pipeline::{run_analysis, AnalysisRun, PipelineError};
pub use provider::{FetchError, FetchRequest, PriceProvider};
pub use settings::{RunSettings, UniverseKind};
pub use synthetic::SyntheticProvider;
pub use universe::{Member, Universe};
