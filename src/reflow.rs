use std::collections::VecDeque;
use std::fmt;

use crate::bridge::{PagingSurface, ScrollRequester, SurfaceUpdate};
use crate::error::PagingError;
use crate::options::PagingOptions;
use crate::paging_ir::{
    DocumentState, LayoutResult, LoadState, PagingDiagnostic, PagingEvent, ReflowReason,
    ScrollOffset, ViewportGeometry,
};
use crate::paging_layout::LayoutEngine;
use crate::position::{progress_to_page_index, ReadingPosition};
use crate::scroll_map::{clamp_page_index, PageChange, ScrollMapper};

/// Carry a page index across a reflow by relative position.
///
/// `round(current_page / previous_count * new_count)`, clamped into the new
/// range. A zero `previous_count` means no earlier layout and yields `0`.
pub fn remap_page_index(current_page: usize, previous_count: usize, new_count: usize) -> usize {
    if previous_count == 0 || new_count == 0 {
        return 0;
    }
    let progress = current_page.min(previous_count - 1) as f64 / previous_count as f64;
    let target = (progress * new_count as f64).round();
    let max_index = new_count - 1;
    if target >= max_index as f64 {
        return max_index;
    }
    target as usize
}

type DiagnosticSink = Option<Box<dyn FnMut(PagingDiagnostic)>>;

/// State scoped to one document; dropped wholesale when the document changes.
struct DocumentSession {
    key: String,
    state: DocumentState,
    engine: LayoutEngine,
    restored: Option<ReadingPosition>,
    pending_jump: Option<i64>,
    pending_reflow: Option<ReflowReason>,
    in_flight: Option<InFlightLayout>,
    // Content became ready before any viewport was known.
    awaiting_viewport: bool,
}

impl DocumentSession {
    fn new(key: String, state: DocumentState, zoom: f32) -> Self {
        Self {
            key,
            state,
            engine: LayoutEngine::new(zoom),
            restored: None,
            pending_jump: None,
            pending_reflow: None,
            in_flight: None,
            awaiting_viewport: false,
        }
    }
}

/// Layout whose container resize the host has not acknowledged yet.
#[derive(Clone, Copy, Debug)]
struct InFlightLayout {
    reason: ReflowReason,
    result: LayoutResult,
    target_page: usize,
}

/// Pagination session for one hosting surface.
///
/// Event handlers run synchronously on the host's UI thread. Layout passes are
/// strictly sequential: while a container resize is in flight, further reflow
/// requests collapse into a single pending slot (latest wins) and navigation
/// requests wait in a single jump slot.
pub struct PagingSession<S, R> {
    options: PagingOptions,
    surface: S,
    mapper: ScrollMapper<R>,
    viewport: Option<ViewportGeometry>,
    zoom: f32,
    document: Option<DocumentSession>,
    load_state: LoadState,
    events: VecDeque<PagingEvent>,
    diagnostic_sink: DiagnosticSink,
}

impl<S, R> fmt::Debug for PagingSession<S, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagingSession")
            .field("options", &self.options)
            .field("viewport", &self.viewport)
            .field("zoom", &self.zoom)
            .field("load_state", &self.load_state)
            .finish_non_exhaustive()
    }
}

impl<S: PagingSurface, R: ScrollRequester> PagingSession<S, R> {
    /// Create a session with no document attached.
    pub fn new(options: PagingOptions, surface: S, requester: R) -> Self {
        let options = options.normalized();
        Self {
            zoom: options.default_zoom,
            options,
            surface,
            mapper: ScrollMapper::new(requester),
            viewport: None,
            document: None,
            load_state: LoadState::default(),
            events: VecDeque::new(),
            diagnostic_sink: None,
        }
    }

    /// Register or replace the diagnostics sink.
    pub fn set_diagnostic_sink<F>(&mut self, sink: F)
    where
        F: FnMut(PagingDiagnostic) + 'static,
    {
        self.diagnostic_sink = Some(Box::new(sink));
    }

    fn emit_diagnostic(&mut self, diagnostic: PagingDiagnostic) {
        if let Some(sink) = self.diagnostic_sink.as_mut() {
            sink(diagnostic);
        }
    }

    pub fn options(&self) -> &PagingOptions {
        &self.options
    }

    /// Lifecycle state of the current document.
    pub fn state(&self) -> DocumentState {
        self.document
            .as_ref()
            .map_or(DocumentState::Unloaded, |doc| doc.state)
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    /// Latest completed layout for the current document.
    pub fn layout(&self) -> Option<&LayoutResult> {
        self.document.as_ref()?.engine.current()
    }

    pub fn page_count(&self) -> Option<usize> {
        self.layout().map(|layout| layout.page_count)
    }

    pub fn current_page(&self) -> usize {
        self.mapper.current_page()
    }

    pub fn viewport(&self) -> Option<ViewportGeometry> {
        self.viewport
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn document_key(&self) -> Option<&str> {
        self.document.as_ref().map(|doc| doc.key.as_str())
    }

    /// Layout passes run for the current document.
    pub fn layout_passes(&self) -> u64 {
        self.document.as_ref().map_or(0, |doc| doc.engine.passes())
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access for host-side updates (fresh measurements, attach state).
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn requester(&self) -> &R {
        self.mapper.requester()
    }

    pub fn requester_mut(&mut self) -> &mut R {
        self.mapper.requester_mut()
    }

    /// Drain queued notifications in FIFO order.
    pub fn drain_events<F>(&mut self, mut on_event: F)
    where
        F: FnMut(PagingEvent),
    {
        while let Some(event) = self.events.pop_front() {
            on_event(event);
        }
    }

    fn set_load_state(&mut self, load_state: LoadState) {
        if self.load_state == load_state {
            return;
        }
        self.load_state = load_state;
        self.events.push_back(PagingEvent::LoadStateChanged(load_state));
    }

    /// A new assembled document was handed to the surface.
    ///
    /// Everything tied to the previous document (layout, queued jump, pending
    /// reflow) is discarded.
    pub fn on_document_replaced(&mut self, document_key: impl Into<String>) {
        if let Some(previous) = self.document.take() {
            if previous.pending_jump.is_some() {
                log::debug!(
                    "discarding queued jump for replaced document {}",
                    previous.key
                );
            }
        }
        self.mapper.reset();
        let mut doc = DocumentSession::new(document_key.into(), DocumentState::Loaded, self.zoom);
        doc.engine.set_zoom(&mut self.surface, self.zoom);
        self.document = Some(doc);
        self.set_load_state(LoadState {
            loading: true,
            error: false,
        });
    }

    /// Upstream assembly or load failed for the current document.
    pub fn on_document_failed(&mut self) {
        match self.document.as_mut() {
            Some(doc) => {
                doc.state = DocumentState::Failed;
                doc.pending_jump = None;
                doc.pending_reflow = None;
                doc.in_flight = None;
            }
            None => {
                self.document = Some(DocumentSession::new(
                    String::new(),
                    DocumentState::Failed,
                    self.zoom,
                ));
            }
        }
        self.mapper.reset();
        self.set_load_state(LoadState {
            loading: false,
            error: true,
        });
    }

    /// The hosting surface dropped its document.
    pub fn on_document_unloaded(&mut self) {
        self.document = None;
        self.mapper.reset();
        self.set_load_state(LoadState::default());
    }

    /// Seed or apply a stored reading position for the current document.
    ///
    /// Before the first layout the position replaces the initial-progress
    /// target; afterwards it navigates directly. Returns `false` when the key
    /// does not match the current document.
    pub fn restore_position(&mut self, position: &ReadingPosition) -> bool {
        let Some(doc) = self.document.as_mut() else {
            return false;
        };
        if doc.key != position.document_key {
            return false;
        }
        match doc.state {
            DocumentState::Loaded => {
                doc.restored = Some(position.clone());
                true
            }
            DocumentState::Paginated | DocumentState::Reflowing => {
                let layout = doc
                    .in_flight
                    .as_ref()
                    .map(|in_flight| &in_flight.result)
                    .or_else(|| doc.engine.current());
                let target = match layout {
                    Some(layout) => position.page_index_for(layout.page_count),
                    None => position.page_index,
                };
                self.go_to_page(target as i64);
                true
            }
            DocumentState::Unloaded | DocumentState::Failed => false,
        }
    }

    /// Snapshot of the current position, once a layout exists.
    pub fn reading_position(&self) -> Option<ReadingPosition> {
        let doc = self.document.as_ref()?;
        let layout = doc.engine.current()?;
        Some(ReadingPosition::new(
            doc.key.clone(),
            self.mapper.current_page(),
            layout.page_count,
        ))
    }

    /// The surface finished loading and can be measured.
    ///
    /// Runs the first layout for a freshly loaded document. On an already
    /// paginated document this is a re-measure (late images, fonts) and
    /// reflows in place.
    pub fn on_content_ready(&mut self) -> Result<(), PagingError> {
        let state = match self.document.as_ref() {
            Some(doc) => doc.state,
            None => return Err(PagingError::NoDocument),
        };
        match state {
            DocumentState::Failed => Err(PagingError::DocumentFailed),
            DocumentState::Loaded => {
                if self.viewport.is_none() {
                    if let Some(doc) = self.document.as_mut() {
                        doc.awaiting_viewport = true;
                    }
                }
                self.run_layout(ReflowReason::DocumentLoad)
            }
            DocumentState::Paginated | DocumentState::Reflowing => {
                self.request_reflow(ReflowReason::DocumentLoad)
            }
            DocumentState::Unloaded => Err(PagingError::NoDocument),
        }
    }

    /// Viewport size or pixel ratio changed.
    pub fn on_viewport_changed(&mut self, viewport: ViewportGeometry) -> Result<(), PagingError> {
        viewport.validate()?;
        let viewport = viewport.normalized();
        if self.viewport == Some(viewport) {
            return Ok(());
        }
        self.viewport = Some(viewport);
        self.request_reflow(ReflowReason::Viewport)
    }

    /// Zoom level changed; the value is clamped into the configured range.
    pub fn on_zoom_changed(&mut self, zoom: f32) -> Result<(), PagingError> {
        let zoom = self.options.clamp_zoom(zoom);
        if (zoom - self.zoom).abs() <= f32::EPSILON {
            return Ok(());
        }
        self.zoom = zoom;
        if let Some(doc) = self.document.as_mut() {
            if doc.state == DocumentState::Loaded {
                doc.engine.set_zoom(&mut self.surface, zoom);
            }
        }
        self.request_reflow(ReflowReason::Zoom)
    }

    /// The host finished applying a container resize reported as pending.
    pub fn on_layout_applied(&mut self) -> Result<(), PagingError> {
        let Some(doc) = self.document.as_mut() else {
            return Ok(());
        };
        if doc.state != DocumentState::Reflowing {
            log::debug!("layout acknowledgement outside of a reflow ignored");
            return Ok(());
        }
        let Some(in_flight) = doc.in_flight.take() else {
            return Ok(());
        };
        self.complete_layout(in_flight)
    }

    /// Jump to `page_index` (clamped).
    ///
    /// Served immediately once paginated; queued (latest wins) while loading
    /// or reflowing; ignored without a document. Returns the target offset
    /// when the jump was served.
    pub fn go_to_page(&mut self, page_index: i64) -> Option<ScrollOffset> {
        let doc = self.document.as_mut()?;
        match doc.state {
            DocumentState::Paginated => {
                let layout = *doc.engine.current()?;
                let animate = self.options.animate_navigation;
                Some(self.scroll_to(page_index, &layout, animate))
            }
            DocumentState::Loaded | DocumentState::Reflowing => {
                doc.pending_jump = Some(page_index);
                self.emit_diagnostic(PagingDiagnostic::NavigationQueued { page_index });
                None
            }
            DocumentState::Unloaded | DocumentState::Failed => None,
        }
    }

    /// Host reported a settled scroll offset.
    ///
    /// Raises [`PagingEvent::PageChanged`] when the settled page differs from
    /// the last reported one.
    pub fn on_scroll_settled(&mut self, offset: f64) -> Option<PageChange> {
        let doc = self.document.as_ref()?;
        if doc.state != DocumentState::Paginated {
            return None;
        }
        let layout = *doc.engine.current()?;
        let change = self.mapper.observe_settled(offset, &layout)?;
        self.events.push_back(PagingEvent::PageChanged {
            current_page: change.current_page,
            total_pages: change.total_pages,
        });
        Some(change)
    }

    /// The host surface (re)attached; re-issue the current position.
    pub fn on_surface_ready(&mut self) -> Option<ScrollOffset> {
        let doc = self.document.as_ref()?;
        if doc.state != DocumentState::Paginated {
            return None;
        }
        let layout = *doc.engine.current()?;
        let page = self.mapper.current_page() as i64;
        Some(self.scroll_to(page, &layout, false))
    }

    fn scroll_to(&mut self, page_index: i64, layout: &LayoutResult, animate: bool) -> ScrollOffset {
        let (offset, delivered) = self.mapper.go_to_page(page_index, layout, animate);
        if !delivered {
            let page_index = self.mapper.current_page();
            self.emit_diagnostic(PagingDiagnostic::ScrollDropped { page_index });
        }
        offset
    }

    fn request_reflow(&mut self, reason: ReflowReason) -> Result<(), PagingError> {
        let Some(doc) = self.document.as_mut() else {
            return Ok(());
        };
        match doc.state {
            DocumentState::Paginated => self.run_layout(reason),
            DocumentState::Reflowing => {
                let parked = match doc.pending_reflow.take() {
                    Some(previous) => {
                        log::debug!("reflow {:?} superseded by {:?}", previous, reason);
                        self.emit_diagnostic(PagingDiagnostic::ReflowSuperseded {
                            reason: previous,
                        });
                        previous.merge(reason)
                    }
                    None => reason,
                };
                if let Some(doc) = self.document.as_mut() {
                    doc.pending_reflow = Some(parked);
                }
                Ok(())
            }
            DocumentState::Loaded if doc.awaiting_viewport && self.viewport.is_some() => {
                doc.awaiting_viewport = false;
                self.run_layout(ReflowReason::DocumentLoad)
            }
            // Geometry is picked up by the first layout.
            DocumentState::Loaded | DocumentState::Unloaded | DocumentState::Failed => Ok(()),
        }
    }

    fn run_layout(&mut self, reason: ReflowReason) -> Result<(), PagingError> {
        let Some(viewport) = self.viewport else {
            self.emit_diagnostic(PagingDiagnostic::ContentNotReady);
            return Err(PagingError::ContentNotReady);
        };
        let zoom = self.zoom;
        let initial_progress = self.options.initial_progress;
        let current_page = self.mapper.current_page();
        let Some(doc) = self.document.as_mut() else {
            return Err(PagingError::NoDocument);
        };
        if (doc.engine.zoom() - zoom).abs() > f32::EPSILON {
            doc.engine.set_zoom(&mut self.surface, zoom);
        }
        let previous_count = doc.engine.current().map_or(0, |layout| layout.page_count);
        let (result, update) = match doc.engine.measure_and_layout(&mut self.surface, &viewport) {
            Ok(outcome) => outcome,
            Err(err) => {
                if err == PagingError::ContentNotReady {
                    self.emit_diagnostic(PagingDiagnostic::ContentNotReady);
                }
                return Err(err);
            }
        };
        let target_page = if previous_count == 0 {
            match doc.restored.take() {
                Some(position) => position.page_index_for(result.page_count),
                None => progress_to_page_index(initial_progress, result.page_count),
            }
        } else {
            remap_page_index(current_page, previous_count, result.page_count)
        };
        let in_flight = InFlightLayout {
            reason,
            result,
            target_page,
        };
        match update {
            SurfaceUpdate::Applied => self.complete_layout(in_flight),
            SurfaceUpdate::Pending => {
                doc.state = DocumentState::Reflowing;
                doc.in_flight = Some(in_flight);
                Ok(())
            }
        }
    }

    fn complete_layout(&mut self, in_flight: InFlightLayout) -> Result<(), PagingError> {
        let InFlightLayout {
            reason,
            result,
            target_page,
        } = in_flight;
        let Some(doc) = self.document.as_mut() else {
            return Ok(());
        };
        doc.state = DocumentState::Paginated;
        doc.engine.commit(result);
        let elapsed_us = doc.engine.last_pass_us();
        let pending_reflow = doc.pending_reflow.take();
        self.events.push_back(PagingEvent::PageCountKnown {
            page_count: result.page_count,
        });
        self.emit_diagnostic(PagingDiagnostic::ReflowTimeUs(elapsed_us));
        if reason == ReflowReason::DocumentLoad && self.load_state.loading {
            self.set_load_state(LoadState {
                loading: false,
                error: false,
            });
        }

        if let Some(next) = pending_reflow {
            // Geometry is already stale; land the position without scrolling.
            self.mapper.set_current_page(target_page as i64, &result);
            return match self.run_layout(next) {
                Ok(()) => Ok(()),
                Err(err) => {
                    log::debug!("parked {:?} reflow failed: {}", next, err);
                    self.land_position(reason, &result, target_page);
                    Err(err)
                }
            };
        }

        self.land_position(reason, &result, target_page);
        Ok(())
    }

    /// Serve the queued jump, or scroll to the reflow target.
    fn land_position(&mut self, reason: ReflowReason, result: &LayoutResult, target_page: usize) {
        let queued_jump = self
            .document
            .as_mut()
            .and_then(|doc| doc.pending_jump.take());
        let (page, animate) = match queued_jump {
            Some(page_index) => (
                clamp_page_index(page_index, result.page_count),
                self.options.animate_navigation && reason.animates(&self.options),
            ),
            None => (target_page, reason.animates(&self.options)),
        };
        self.scroll_to(page as i64, result, animate);
    }
}
