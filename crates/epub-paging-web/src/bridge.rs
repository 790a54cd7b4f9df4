use std::cell::RefCell;
use std::rc::Rc;

use epub_paging::{
    BridgeError, ContainerLayout, PagingOptions, PagingSession, PagingSurface, ScrollRequest,
    ScrollRequester, SurfaceUpdate,
};

use crate::scripts::{apply_container_script, load_url_script, scroll_script, zoom_script};

/// Host capability to run JavaScript in the embedded web view.
pub trait ScriptSink {
    /// Whether the web view is attached and can evaluate scripts.
    fn is_attached(&self) -> bool;

    /// Evaluate `script` in the current document. Fire-and-forget.
    fn evaluate(&mut self, script: String);

    /// Navigate the web view to `url`.
    fn load_url(&mut self, url: String) {
        self.evaluate(load_url_script(&url));
    }
}

struct BridgeState<K> {
    sink: K,
    content_height: Option<f64>,
    applied_zoom: f32,
    zoom_pending: bool,
    last_container: Option<ContainerLayout>,
    awaiting_layout: bool,
}

/// Web-view implementation of both bridge capabilities.
///
/// Clones share one web view, so a session can hold one handle as its surface
/// and another as its scroll requester. Measurements arrive from the page via
/// host messages; container resizes stay pending until the page acknowledges
/// them.
pub struct WebViewBridge<K> {
    state: Rc<RefCell<BridgeState<K>>>,
}

impl<K> Clone for WebViewBridge<K> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<K> core::fmt::Debug for WebViewBridge<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("WebViewBridge")
            .field("content_height", &state.content_height)
            .field("applied_zoom", &state.applied_zoom)
            .field("awaiting_layout", &state.awaiting_layout)
            .finish_non_exhaustive()
    }
}

/// Session wired to a web view through [`WebViewBridge`] handles.
pub type WebPagingSession<K> = PagingSession<WebViewBridge<K>, WebViewBridge<K>>;

/// Build a session whose surface and scroll requester share `sink`.
pub fn web_session<K: ScriptSink>(options: PagingOptions, sink: K) -> WebPagingSession<K> {
    let bridge = WebViewBridge::new(sink);
    PagingSession::new(options, bridge.clone(), bridge)
}

impl<K: ScriptSink> WebViewBridge<K> {
    pub fn new(sink: K) -> Self {
        Self {
            state: Rc::new(RefCell::new(BridgeState {
                sink,
                content_height: None,
                applied_zoom: 1.0,
                zoom_pending: false,
                last_container: None,
                awaiting_layout: false,
            })),
        }
    }

    pub fn with_sink<T>(&self, f: impl FnOnce(&K) -> T) -> T {
        f(&self.state.borrow().sink)
    }

    pub fn with_sink_mut<T>(&self, f: impl FnOnce(&mut K) -> T) -> T {
        f(&mut self.state.borrow_mut().sink)
    }

    pub fn is_attached(&self) -> bool {
        self.state.borrow().sink.is_attached()
    }

    /// Last single-column height reported by the page.
    pub fn reported_height(&self) -> Option<f64> {
        self.state.borrow().content_height
    }

    /// Whether a container resize is waiting for the page's acknowledgement.
    pub fn awaiting_layout(&self) -> bool {
        self.state.borrow().awaiting_layout
    }

    /// Record a fresh measurement. Unusable heights clear it.
    ///
    /// The first measurement of a new document also pushes the current zoom,
    /// which makes the page measure again at the zoomed size.
    pub fn record_content_height(&self, height: f64) {
        let mut state = self.state.borrow_mut();
        state.content_height = if height.is_finite() && height > 0.0 {
            Some(height)
        } else {
            log::debug!("discarding unusable content height {}", height);
            None
        };
        if state.zoom_pending && state.sink.is_attached() {
            state.zoom_pending = false;
            if (state.applied_zoom - 1.0).abs() > f32::EPSILON {
                let script = zoom_script(state.applied_zoom);
                state.sink.evaluate(script);
            }
        }
    }

    /// Page acknowledged a container resize. Returns whether one was pending.
    pub fn acknowledge_layout(&self) -> bool {
        let mut state = self.state.borrow_mut();
        let was_pending = state.awaiting_layout;
        state.awaiting_layout = false;
        was_pending
    }

    /// Start loading a new document into the web view.
    pub fn load_document(&self, url: String) {
        let mut state = self.state.borrow_mut();
        state.content_height = None;
        state.last_container = None;
        state.awaiting_layout = false;
        state.zoom_pending = true;
        state.sink.load_url(url);
    }

    /// Replay presentation state after the web view reattached.
    pub fn reattach(&self) {
        let mut state = self.state.borrow_mut();
        if !state.sink.is_attached() {
            return;
        }
        if (state.applied_zoom - 1.0).abs() > f32::EPSILON {
            let script = zoom_script(state.applied_zoom);
            state.sink.evaluate(script);
        }
        if let Some(container) = state.last_container {
            state.sink.evaluate(apply_container_script(&container));
        }
    }
}

impl<K: ScriptSink> PagingSurface for WebViewBridge<K> {
    fn content_height(&self) -> Option<f64> {
        self.state.borrow().content_height
    }

    fn apply_container(&mut self, container: &ContainerLayout) -> SurfaceUpdate {
        let mut state = self.state.borrow_mut();
        state.last_container = Some(*container);
        if !state.sink.is_attached() {
            // Replayed on reattach; nothing will acknowledge it now.
            log::debug!("web view detached; container update deferred");
            return SurfaceUpdate::Applied;
        }
        state.sink.evaluate(apply_container_script(container));
        state.awaiting_layout = true;
        SurfaceUpdate::Pending
    }

    fn apply_zoom(&mut self, zoom: f32) {
        let mut state = self.state.borrow_mut();
        let previous = state.applied_zoom;
        state.applied_zoom = zoom;
        // Estimate until the page re-measures at the new zoom.
        if previous > 0.0 {
            if let Some(height) = state.content_height {
                state.content_height = Some(height * f64::from(zoom / previous));
            }
        }
        if state.sink.is_attached() {
            state.sink.evaluate(zoom_script(zoom));
        }
    }
}

impl<K: ScriptSink> ScrollRequester for WebViewBridge<K> {
    fn request_scroll(&mut self, request: ScrollRequest) -> Result<(), BridgeError> {
        let mut state = self.state.borrow_mut();
        if !state.sink.is_attached() {
            return Err(BridgeError::Detached);
        }
        if state.content_height.is_none() {
            return Err(BridgeError::NotReady);
        }
        state.sink.evaluate(scroll_script(&request));
        Ok(())
    }
}
