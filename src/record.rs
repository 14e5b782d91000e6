//! Highlight records
//!
//! The persisted shape of a user-created highlight. Records are handed to an
//! external note store immediately after creation; everything else the engine
//! keeps for a record (overlay marks) is derived and rebuildable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::HighlightRect;

/// The single reserved highlight color used when a record carries none
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "#ffeb3b";

/// Format-specific positioning data for a highlight.
///
/// Paginated formats anchor to a page and unit-scale rectangles; flowing
/// formats anchor to a range identifier inside a document section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "anchor_kind", rename_all = "snake_case")]
pub enum Anchor {
    Paginated {
        /// 1-based page number; the page may or may not be mounted right now
        page: u32,
        /// Page-local rectangles at unit scale, one per selected line fragment
        rects: Vec<HighlightRect>,
        /// Scale factor in effect when the rectangles were computed
        scale: f32,
    },
    Flow {
        range_id: String,
        section_ref: String,
    },
}

impl Anchor {
    /// Page number for paginated anchors
    #[must_use]
    pub fn page(&self) -> Option<u32> {
        match self {
            Anchor::Paginated { page, .. } => Some(*page),
            Anchor::Flow { .. } => None,
        }
    }

    /// Unit-scale rectangles for paginated anchors
    #[must_use]
    pub fn rects(&self) -> Option<&[HighlightRect]> {
        match self {
            Anchor::Paginated { rects, .. } => Some(rects.as_slice()),
            Anchor::Flow { .. } => None,
        }
    }

    pub(crate) fn sort_key(&self) -> (u8, u32, i64, i64) {
        match self {
            Anchor::Paginated { page, rects, .. } => {
                let first = rects.first();
                (
                    0,
                    *page,
                    first.map_or(0, |r| r.y as i64),
                    first.map_or(0, |r| r.x as i64),
                )
            }
            Anchor::Flow { .. } => (1, 0, 0, 0),
        }
    }
}

/// A persisted, user-created annotation over a span of document text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HighlightRecord {
    /// Opaque unique identifier, assigned at creation, never reused
    pub id: String,
    /// The exact selected text, immutable after creation
    pub text_content: String,
    /// Optional color; `None` means [`DEFAULT_HIGHLIGHT_COLOR`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub anchor: Anchor,
}

impl HighlightRecord {
    #[must_use]
    pub fn new(text_content: String, color: Option<String>, anchor: Anchor) -> Self {
        Self {
            id: new_highlight_id(),
            text_content,
            color,
            created_at: Utc::now(),
            anchor,
        }
    }

    /// Color to paint with, falling back to the reserved default
    #[must_use]
    pub fn effective_color(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_HIGHLIGHT_COLOR)
    }
}

fn new_highlight_id() -> String {
    format!("hl-{:016x}", rand::random::<u64>())
}

/// Sort records into reading order: page, then vertical position, then
/// creation time. Flow-anchored records keep creation order after paginated
/// ones.
pub fn sort_records(records: &mut [HighlightRecord]) {
    records.sort_by(|a, b| {
        a.anchor
            .sort_key()
            .cmp(&b.anchor.sort_key())
            .then(a.created_at.cmp(&b.created_at))
    });
}
