pub mod compatibility;
pub mod config;
pub mod data_loader;
pub mod features;
pub mod filter;
pub mod frame;
pub mod harness;
pub mod io;
pub mod pipeline;
pub mod report;
pub mod summary;
pub mod types;

pub use compatibility::{CompatibilityPolicy, CompatibilityRule};
pub use config::BenchmarkConfig;
pub use frame::{Frame, FrameWindow, SENTINEL_TIME};
pub use harness::BenchmarkHarness;
pub use pipeline::{PairPipeline, PipelineError, PipelineOptions};
pub use summary::{Measurement, Summary};
pub use types::{Configuration, DescriptorKind, DetectorKind, MatcherKind, SelectorKind};
