//! Render engine
//!
//! Projects registry entries onto the live surface as overlay marks. The
//! surface mounts asynchronously and out of the engine's control, so painting
//! is gated on readiness: requests arriving early are deferred and flushed
//! once, with the latest-supplied data. Scale changes re-paint from the
//! stored unit-scale rectangles — a pure recomputation, never a re-capture.
//!
//! All timing (the settle delay, the selection-change debounce) is expressed
//! as `Instant` deadlines pumped by the host event loop through [`HighlightEngine::tick`];
//! nothing blocks and nothing fires after teardown.

use std::time::Instant;

use log::debug;

use crate::record::{Anchor, HighlightRecord};
use crate::registry::HighlightRegistry;
use crate::selection::{PendingSelection, SelectionCapture, SignalKind};
use crate::settings::EngineOptions;
use crate::surface::Surface;

/// The capability surface the note-taking UI consumes.
///
/// Paginated viewers implement it with [`Anchor::Paginated`]; flowing-text
/// viewers satisfy the same verbs with [`Anchor::Flow`].
pub trait HighlightService {
    /// Turn the held selection into a record, or `None` when there is no
    /// usable capture. The caller persists the returned record externally.
    fn create_highlight_from_selection(&mut self) -> Option<HighlightRecord>;

    /// Replace the tracked set with `records` and (re)paint it
    fn render_highlights(&mut self, records: &[HighlightRecord]);

    /// Remove one highlight and its marks; no-op for unknown ids
    fn remove_highlight(&mut self, id: &str);

    /// Drop every tracked highlight and its marks
    fn clear_all_highlights(&mut self);

    /// Toggle overlay visibility without dropping the tracked records
    fn set_highlights_visible(&mut self, visible: bool);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Readiness {
    NotReady,
    Ready,
}

/// Highlight engine for one paginated document surface.
///
/// Owns the surface adapter, the selection capture, and the registry. The
/// host forwards interaction-end signals (`notify_*`) and pumps `tick` from
/// its event loop; everything else goes through [`HighlightService`].
pub struct HighlightEngine<S: Surface> {
    surface: S,
    registry: HighlightRegistry<S::Mark>,
    capture: SelectionCapture,
    options: EngineOptions,
    scale: f32,
    visible: bool,
    readiness: Readiness,
    settle_deadline: Option<Instant>,
    debounce_deadline: Option<Instant>,
    // one deferred paint pass, flushed at readiness with the latest registry
    // contents; later render calls supersede it by updating the registry
    paint_pending: bool,
}

impl<S: Surface> HighlightEngine<S> {
    /// Create an engine over `surface`, arming the settle deadline.
    ///
    /// Hosts whose renderer exposes a mount callback should wire it to
    /// [`mark_ready`](Self::mark_ready) instead of waiting out the delay.
    #[must_use]
    pub fn new(surface: S, options: EngineOptions) -> Self {
        let settle_deadline = Some(Instant::now() + options.settle_delay());
        Self {
            surface,
            registry: HighlightRegistry::new(),
            capture: SelectionCapture::new(),
            options,
            scale: 1.0,
            visible: true,
            readiness: Readiness::NotReady,
            settle_deadline,
            debounce_deadline: None,
            paint_pending: false,
        }
    }

    /// Process expired deadlines. Returns true when anything fired.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut fired = false;

        if self.settle_deadline.is_some_and(|deadline| now >= deadline) {
            self.settle_deadline = None;
            self.become_ready();
            fired = true;
        }

        if self.debounce_deadline.is_some_and(|deadline| now >= deadline) {
            self.debounce_deadline = None;
            self.read_live_selection(SignalKind::SelectionChange);
            fired = true;
        }

        fired
    }

    /// Positive mount signal from the host renderer; supersedes the settle
    /// delay.
    pub fn mark_ready(&mut self) {
        self.settle_deadline = None;
        self.become_ready();
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    /// Pointer released over the surface: read the selection now
    pub fn notify_pointer_up(&mut self) {
        self.read_live_selection(SignalKind::PointerUp);
    }

    /// Touch sequence ended: read the selection now
    pub fn notify_touch_end(&mut self) {
        self.read_live_selection(SignalKind::TouchEnd);
    }

    /// Live selection changed. Reads are debounced: the selection is read
    /// once the burst goes quiet, on a later `tick`.
    pub fn notify_selection_changed(&mut self, now: Instant) {
        self.debounce_deadline = Some(now + self.options.debounce_window());
    }

    /// Re-project every tracked record at the new scale.
    ///
    /// Sub-epsilon changes are layout jitter and ignored. The stored scale
    /// updates even when hidden or not ready, so later paints use it.
    pub fn update_scale(&mut self, new_scale: f32) {
        if !new_scale.is_finite() || new_scale <= 0.0 {
            debug!("ignoring unusable scale factor {new_scale}");
            return;
        }
        if (new_scale - self.scale).abs() < self.options.scale_epsilon {
            return;
        }
        self.scale = new_scale;
        if self.visible && self.is_ready() {
            self.repaint_all();
        }
    }

    /// Remove every mark and cancel every deadline.
    ///
    /// Idempotent; also runs on drop. Host-side event listener removal is
    /// the host's responsibility.
    pub fn teardown(&mut self) {
        self.settle_deadline = None;
        self.debounce_deadline = None;
        self.paint_pending = false;
        for mark in self.registry.take_all_marks() {
            self.surface.remove_mark(mark);
        }
    }

    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[must_use]
    pub fn highlights_visible(&self) -> bool {
        self.visible
    }

    /// The capture a highlight would currently be created from
    #[must_use]
    pub fn held_selection(&self) -> Option<&PendingSelection> {
        self.capture.held()
    }

    /// Drop the held capture (e.g. when the document changes)
    pub fn clear_selection(&mut self) {
        self.capture.clear();
    }

    #[must_use]
    pub fn registry(&self) -> &HighlightRegistry<S::Mark> {
        &self.registry
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    fn become_ready(&mut self) {
        if self.readiness == Readiness::Ready {
            return;
        }
        self.readiness = Readiness::Ready;
        debug!("surface ready");
        if self.paint_pending {
            self.paint_pending = false;
            self.repaint_all();
        }
    }

    fn read_live_selection(&mut self, kind: SignalKind) {
        let candidate = self.surface.read_selection().and_then(|raw| {
            // a selection that cannot be mapped to a mounted page is invalid
            let page = self.surface.locate_page(raw.page)?;
            let origin = self.surface.origin(&page);
            PendingSelection::from_raw(&raw, origin, self.scale)
        });
        self.capture.observe(kind, candidate);
    }

    fn repaint_all(&mut self) {
        for mark in self.registry.take_all_marks() {
            self.surface.remove_mark(mark);
        }
        if !self.visible {
            return;
        }
        let mut painted: Vec<(String, Vec<S::Mark>)> = Vec::new();
        for record in self.registry.records() {
            let marks =
                Self::paint_record(&mut self.surface, &self.options, self.scale, record);
            painted.push((record.id.clone(), marks));
        }
        for (id, marks) in painted {
            self.registry.set_marks(&id, marks);
        }
    }

    fn paint_record(
        surface: &mut S,
        options: &EngineOptions,
        scale: f32,
        record: &HighlightRecord,
    ) -> Vec<S::Mark> {
        let Anchor::Paginated { page, rects, .. } = &record.anchor else {
            debug!("skipping flow-anchored record {} on paginated surface", record.id);
            return Vec::new();
        };
        let Some(handle) = surface.locate_page(*page) else {
            debug!("page {page} not mounted, skipping record {}", record.id);
            return Vec::new();
        };
        surface.ensure_positioned(&handle);
        let origin = surface.origin(&handle);
        let color = record.color.as_deref().unwrap_or(&options.default_color);

        rects
            .iter()
            .filter(|rect| rect.is_drawable())
            .map(|rect| surface.paint_mark(&handle, rect.to_client(origin, scale), color))
            .collect()
    }
}

impl<S: Surface> HighlightService for HighlightEngine<S> {
    fn create_highlight_from_selection(&mut self) -> Option<HighlightRecord> {
        let pending = self.capture.held()?.clone();
        let record = HighlightRecord::new(
            pending.text,
            None,
            Anchor::Paginated {
                page: pending.page,
                rects: pending.rects,
                scale: pending.scale,
            },
        );
        self.registry.insert(record.clone());

        if self.visible && self.is_ready() {
            let marks =
                Self::paint_record(&mut self.surface, &self.options, self.scale, &record);
            self.registry.set_marks(&record.id, marks);
        } else if !self.is_ready() {
            self.paint_pending = true;
        }

        Some(record)
    }

    fn render_highlights(&mut self, records: &[HighlightRecord]) {
        for mark in self.registry.replace_all(records.to_vec()) {
            self.surface.remove_mark(mark);
        }
        if self.is_ready() {
            if self.visible {
                self.repaint_all();
            }
        } else {
            debug!("surface not ready, deferring render of {} records", records.len());
            self.paint_pending = true;
        }
    }

    fn remove_highlight(&mut self, id: &str) {
        match self.registry.remove(id) {
            Some(marks) => {
                for mark in marks {
                    self.surface.remove_mark(mark);
                }
            }
            None => debug!("remove for unknown highlight {id}"),
        }
    }

    fn clear_all_highlights(&mut self) {
        for mark in self.registry.replace_all(Vec::new()) {
            self.surface.remove_mark(mark);
        }
    }

    fn set_highlights_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;
        if !visible {
            for mark in self.registry.take_all_marks() {
                self.surface.remove_mark(mark);
            }
        } else if self.is_ready() {
            self.repaint_all();
        } else {
            self.paint_pending = true;
        }
    }
}

impl<S: Surface> Drop for HighlightEngine<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::geometry::{ClientRect, PageOrigin};
    use crate::selection::RawSelection;
    use crate::test_utils::FakeSurface;

    fn immediate_options() -> EngineOptions {
        EngineOptions {
            settle_delay_ms: 0,
            debounce_ms: 0,
            ..EngineOptions::default()
        }
    }

    fn ready_engine() -> HighlightEngine<FakeSurface> {
        let mut surface = FakeSurface::new();
        surface.mount_page(3, PageOrigin::new(0.0, 0.0));
        let mut engine = HighlightEngine::new(surface, immediate_options());
        engine.mark_ready();
        engine
    }

    fn select_on_page_3(engine: &mut HighlightEngine<FakeSurface>) {
        engine.surface_mut().set_selection(RawSelection {
            text: "The quick fox".to_string(),
            page: 3,
            rects: vec![ClientRect::new(10.0, 20.0, 80.0, 14.0)],
        });
        engine.notify_pointer_up();
    }

    #[test]
    fn create_without_capture_returns_none() {
        let mut engine = ready_engine();
        assert!(engine.create_highlight_from_selection().is_none());
    }

    #[test]
    fn create_paints_immediately_when_ready() {
        let mut engine = ready_engine();
        select_on_page_3(&mut engine);

        let record = engine.create_highlight_from_selection().unwrap();
        assert_eq!(record.anchor.page(), Some(3));
        assert_eq!(
            engine.surface().painted_rects(),
            vec![ClientRect::new(10.0, 20.0, 80.0, 14.0)]
        );
        assert_eq!(engine.registry().mark_count(), 1);
    }

    #[test]
    fn selection_on_unknown_page_is_rejected() {
        let mut engine = ready_engine();
        select_on_page_3(&mut engine);
        engine.surface_mut().set_selection(RawSelection {
            text: "ghost".to_string(),
            page: 99,
            rects: vec![ClientRect::new(0.0, 0.0, 10.0, 10.0)],
        });
        engine.notify_pointer_up();

        // prior capture survives the invalid read
        assert_eq!(engine.held_selection().unwrap().page, 3);
    }

    #[test]
    fn debounced_selection_read_happens_on_tick() {
        let mut engine = ready_engine();
        engine.surface_mut().set_selection(RawSelection {
            text: "later".to_string(),
            page: 3,
            rects: vec![ClientRect::new(1.0, 2.0, 3.0, 4.0)],
        });

        let now = Instant::now();
        engine.notify_selection_changed(now);
        assert!(engine.held_selection().is_none());

        engine.tick(now + Duration::from_millis(1));
        assert_eq!(engine.held_selection().unwrap().text, "later");
    }

    #[test]
    fn sub_epsilon_scale_change_is_a_noop() {
        let mut engine = ready_engine();
        select_on_page_3(&mut engine);
        engine.create_highlight_from_selection().unwrap();
        let before = engine.surface().paint_ops();

        engine.update_scale(1.0 + 1e-5);
        assert_eq!(engine.surface().paint_ops(), before);
        assert_eq!(engine.scale(), 1.0);
    }

    #[test]
    fn unusable_scale_is_ignored() {
        let mut engine = ready_engine();
        engine.update_scale(f32::NAN);
        engine.update_scale(-2.0);
        assert_eq!(engine.scale(), 1.0);
    }

    #[test]
    fn records_on_unmounted_pages_are_skipped_then_painted_after_mount() {
        let mut engine = ready_engine();
        select_on_page_3(&mut engine);
        let record = engine.create_highlight_from_selection().unwrap();

        let mut far_page = record.clone();
        far_page.id = "hl-far".to_string();
        if let Anchor::Paginated { page, .. } = &mut far_page.anchor {
            *page = 7;
        }

        engine.render_highlights(&[record.clone(), far_page.clone()]);
        assert_eq!(engine.registry().mark_count(), 1);

        engine.surface_mut().mount_page(7, PageOrigin::new(0.0, 600.0));
        engine.render_highlights(&[record, far_page]);
        assert_eq!(engine.registry().mark_count(), 2);
    }

    #[test]
    fn create_while_not_ready_defers_paint() {
        let mut surface = FakeSurface::new();
        surface.mount_page(3, PageOrigin::new(0.0, 0.0));
        let mut engine = HighlightEngine::new(
            surface,
            EngineOptions {
                settle_delay_ms: 60_000,
                ..immediate_options()
            },
        );
        select_on_page_3(&mut engine);

        let record = engine.create_highlight_from_selection();
        assert!(record.is_some());
        assert_eq!(engine.surface().mark_count(), 0);

        engine.mark_ready();
        assert_eq!(engine.surface().mark_count(), 1);
    }

    #[test]
    fn teardown_removes_marks_and_deadlines() {
        let mut engine = ready_engine();
        select_on_page_3(&mut engine);
        engine.create_highlight_from_selection().unwrap();
        assert_eq!(engine.surface().mark_count(), 1);

        engine.teardown();
        assert_eq!(engine.surface().mark_count(), 0);

        // nothing fires after teardown
        assert!(!engine.tick(Instant::now() + Duration::from_secs(120)));
    }
}
