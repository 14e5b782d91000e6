//! Scripted surface for tests
//!
//! A [`FakeSurface`](crate::test_utils::FakeSurface) stands in for a real
//! document renderer the same way a simulated event source stands in for a
//! terminal: tests script which pages are mounted and what the live selection
//! reads, then assert on the marks the engine painted.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::geometry::{ClientRect, PageOrigin};
use crate::selection::RawSelection;
use crate::surface::Surface;

/// One overlay mark as painted on the fake surface
#[derive(Clone, Debug, PartialEq)]
pub struct PaintedMark {
    pub page: u32,
    pub rect: ClientRect,
    pub color: String,
}

/// In-memory surface with scriptable pages and selection
#[derive(Default)]
pub struct FakeSurface {
    pages: HashMap<u32, PageOrigin>,
    positioned: HashSet<u32>,
    selection: Option<RawSelection>,
    // keyed by handle; handles ascend in paint order
    marks: BTreeMap<u64, PaintedMark>,
    next_mark: u64,
    paint_ops: usize,
}

impl FakeSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a page as mounted at the given content-box origin
    pub fn mount_page(&mut self, page: u32, origin: PageOrigin) {
        self.pages.insert(page, origin);
    }

    /// Script a page as unmounted; its marks become unreachable, and
    /// removing them later stays a no-op
    pub fn unmount_page(&mut self, page: u32) {
        self.pages.remove(&page);
        self.positioned.remove(&page);
        self.marks.retain(|_, mark| mark.page != page);
    }

    /// Script what the next live-selection read returns
    pub fn set_selection(&mut self, selection: RawSelection) {
        self.selection = Some(selection);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Currently painted marks, in paint order
    #[must_use]
    pub fn painted(&self) -> Vec<PaintedMark> {
        self.marks.values().cloned().collect()
    }

    /// Rectangles of currently painted marks, in paint order
    #[must_use]
    pub fn painted_rects(&self) -> Vec<ClientRect> {
        self.marks.values().map(|m| m.rect).collect()
    }

    #[must_use]
    pub fn mark_count(&self) -> usize {
        self.marks.len()
    }

    /// Total paint operations ever performed
    #[must_use]
    pub fn paint_ops(&self) -> usize {
        self.paint_ops
    }

    #[must_use]
    pub fn is_positioned(&self, page: u32) -> bool {
        self.positioned.contains(&page)
    }
}

impl Surface for FakeSurface {
    type Page = u32;
    type Mark = u64;

    fn locate_page(&self, page: u32) -> Option<Self::Page> {
        self.pages.contains_key(&page).then_some(page)
    }

    fn origin(&self, page: &Self::Page) -> PageOrigin {
        self.pages.get(page).copied().unwrap_or_default()
    }

    fn ensure_positioned(&mut self, page: &Self::Page) {
        self.positioned.insert(*page);
    }

    fn paint_mark(&mut self, page: &Self::Page, rect: ClientRect, color: &str) -> Self::Mark {
        let handle = self.next_mark;
        self.next_mark += 1;
        self.paint_ops += 1;
        self.marks.insert(
            handle,
            PaintedMark {
                page: *page,
                rect,
                color: color.to_string(),
            },
        );
        handle
    }

    fn remove_mark(&mut self, mark: Self::Mark) {
        self.marks.remove(&mark);
    }

    fn read_selection(&self) -> Option<RawSelection> {
        self.selection.clone()
    }
}
