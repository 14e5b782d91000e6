//! Surface adapter contract
//!
//! The live document surface (the paginated or flowing visual rendering) is
//! owned by an external rendering library. The engine observes and annotates
//! it through this trait; one implementation exists per document format. The
//! trait doubles as the test seam: scripted implementations stand in for the
//! real renderer the same way simulated event sources stand in for a
//! terminal.

use crate::geometry::{ClientRect, PageOrigin};
use crate::selection::RawSelection;

/// Adapter between the engine and one concrete document surface.
///
/// Only the render engine mutates the surface; selection capture reads it.
/// Lookup failures are ordinary (`None`) — pages mount asynchronously and a
/// missing page is skipped, not reported.
pub trait Surface {
    /// Handle to a located, currently mounted page element
    type Page;
    /// Handle to one painted overlay mark
    type Mark;

    /// Locate the mounted page element for a 1-based page number
    fn locate_page(&self, page: u32) -> Option<Self::Page>;

    /// Screen position of the page's content box.
    ///
    /// Content-box relative, so the origin survives page padding and border
    /// changes.
    fn origin(&self, page: &Self::Page) -> PageOrigin;

    /// Establish a coordinate frame on the page if it lacks one.
    ///
    /// Idempotent: calling it on an already-positioned page is a no-op.
    fn ensure_positioned(&mut self, page: &Self::Page);

    /// Paint one overlay mark over the page at the given screen rectangle
    fn paint_mark(&mut self, page: &Self::Page, rect: ClientRect, color: &str) -> Self::Mark;

    /// Remove a previously painted mark.
    ///
    /// Marks whose page has unmounted may already be gone; removal is still
    /// a no-op in that case.
    fn remove_mark(&mut self, mark: Self::Mark);

    /// Read the live text selection, if any
    fn read_selection(&self) -> Option<RawSelection>;
}
