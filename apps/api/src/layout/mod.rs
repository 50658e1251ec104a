// Layout allocation engine
// Implements: line estimation, value-density allocation, two-page split simulation,
// condensation advice, and rule-based bullet compression.
// Engine modules are pure and synchronous; only `handlers` touches the async runtime.

pub mod allocator;
pub mod compressor;
pub mod condense;
pub mod config;
pub mod estimator;
pub mod handlers;
pub mod page_split;
pub mod pipeline;
pub mod types;

// Re-export the public API consumed by handlers and library callers.
pub use allocator::{allocate_bullets, Allocation, AllocationStrategy};
pub use compressor::{compress_bullets_to_fit, compress_text, CompressionReport};
pub use condense::{suggest_condensation, CondensationSuggestion};
pub use config::{ConfigError, LayoutConfig};
pub use estimator::LineEstimator;
pub use page_split::simulate_layout;
pub use pipeline::{plan_layout, LayoutPlan, LayoutRequest};
pub use types::{Bullet, LayoutError, PageLayout, ResumeLayout, Role};
