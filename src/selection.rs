//! Selection capture state machine
//!
//! Several interaction signals (pointer release, touch end, debounced
//! selection-change) race to report "the user finished selecting something".
//! The capture keeps the single most-recent valid selection and deliberately
//! ignores empty reads: on touch devices the selection-change signal often
//! fires before the UI settles, and an empty read must never erase a
//! just-made valid capture.

use log::debug;

use crate::geometry::{ClientRect, HighlightRect, PageOrigin, normalize_rects};

/// Which interaction-end signal produced a read of the live selection.
///
/// No source is authoritative over another; the most recently processed
/// valid read wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalKind {
    PointerUp,
    TouchEnd,
    SelectionChange,
}

/// A raw read of the live text selection, in screen coordinates
#[derive(Clone, Debug, PartialEq)]
pub struct RawSelection {
    pub text: String,
    /// 1-based page number the selection anchors to
    pub page: u32,
    pub rects: Vec<ClientRect>,
}

/// The most recent valid capture, ready to become a highlight record.
///
/// Rectangles are already normalized to page-local unit scale; `scale`
/// records the factor in effect at capture time. A selection spanning
/// several wrapped lines stays one capture with several rectangles.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingSelection {
    pub text: String,
    pub page: u32,
    pub rects: Vec<HighlightRect>,
    pub scale: f32,
}

impl PendingSelection {
    /// Build a capture candidate from a raw selection read.
    ///
    /// Returns `None` when the selection is empty or has no usable geometry.
    #[must_use]
    pub fn from_raw(raw: &RawSelection, origin: PageOrigin, scale: f32) -> Option<Self> {
        if raw.text.is_empty() {
            return None;
        }
        let rects = normalize_rects(&raw.rects, origin, scale)?;
        Some(Self {
            text: raw.text.clone(),
            page: raw.page,
            rects,
            scale,
        })
    }
}

/// Selection capture state: idle, or holding the last valid capture
#[derive(Debug, Default)]
pub struct SelectionCapture {
    held: Option<PendingSelection>,
}

impl SelectionCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one interaction-end read.
    ///
    /// A valid candidate replaces whatever was held; an invalid one leaves
    /// the state untouched. Returns true when a new capture was installed.
    pub fn observe(&mut self, kind: SignalKind, candidate: Option<PendingSelection>) -> bool {
        match candidate {
            Some(pending) => {
                debug!(
                    "selection captured via {kind:?}: page {} ({} rects)",
                    pending.page,
                    pending.rects.len()
                );
                self.held = Some(pending);
                true
            }
            None => {
                debug!("empty selection signal via {kind:?}, keeping current capture");
                false
            }
        }
    }

    /// The capture a highlight would be created from right now
    #[must_use]
    pub fn held(&self) -> Option<&PendingSelection> {
        self.held.as_ref()
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    /// Explicitly drop the held capture (e.g. when the document changes)
    pub fn clear(&mut self) {
        self.held = None;
    }
}
