//! Highlight positioning and rendering engine for document readers.
//!
//! Captures text selections over a paginated or flowing document surface,
//! turns them into durable, scale-independent highlight records, and
//! re-projects those records onto the surface as it resizes, rescales, or
//! repaginates out of the caller's control.

pub mod engine;
pub mod geometry;
pub mod record;
pub mod registry;
pub mod selection;
pub mod settings;
pub mod store;
pub mod surface;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export the capability surface hosts integrate against
pub use engine::{HighlightEngine, HighlightService};
pub use record::{Anchor, DEFAULT_HIGHLIGHT_COLOR, HighlightRecord};
pub use settings::EngineOptions;
pub use surface::Surface;
