//! Record transformation stages.
//!
//! - Normalize: defaults, country names, mm → cm
//! - Quantity: bundle item counts
//! - Classify: keyword category codes
//! - Filter: keyword and completeness exclusion
//! - Text / Split: cell value cleaning and fan-out
//! - Pipeline: the full run

pub mod classify;
pub mod filter;
pub mod normalize;
pub mod pipeline;
pub mod quantity;
pub mod split;
pub mod text;

pub use classify::{CategoryClassifier, CompiledRule};
pub use filter::{FilterStats, RowFilter};
pub use normalize::{mm_to_cm, NormalizeStats, Normalizer};
pub use pipeline::{run, RunOptions, RunSummary};
pub use quantity::{aggregate, QuantityAggregator};
pub use split::{join_images, split_bullets, split_images};
pub use text::{sanitize, truncate, TextSanitizer};
