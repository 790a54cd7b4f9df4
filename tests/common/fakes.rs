use std::cell::RefCell;
use std::rc::Rc;

use epub_paging::{
    BridgeError, ContainerLayout, PagingDiagnostic, PagingEvent, PagingOptions, PagingSession,
    PagingSurface, ScrollRequest, ScrollRequester, SurfaceUpdate, ViewportGeometry,
};

/// Surface whose measured height scales with the applied zoom.
#[derive(Debug, Default)]
pub struct FakeSurface {
    pub base_height: Option<f64>,
    pub zoom: f32,
    pub defer_updates: bool,
    pub containers: Vec<ContainerLayout>,
    pub zooms: Vec<f32>,
}

impl FakeSurface {
    pub fn with_height(height: f64) -> Self {
        Self {
            base_height: Some(height),
            zoom: 1.0,
            ..Self::default()
        }
    }

    pub fn deferred(height: f64) -> Self {
        Self {
            defer_updates: true,
            ..Self::with_height(height)
        }
    }
}

impl PagingSurface for FakeSurface {
    fn content_height(&self) -> Option<f64> {
        self.base_height.map(|height| height * self.zoom as f64)
    }

    fn apply_container(&mut self, container: &ContainerLayout) -> SurfaceUpdate {
        self.containers.push(*container);
        if self.defer_updates {
            SurfaceUpdate::Pending
        } else {
            SurfaceUpdate::Applied
        }
    }

    fn apply_zoom(&mut self, zoom: f32) {
        self.zoom = zoom;
        self.zooms.push(zoom);
    }
}

/// Requester that records every accepted scroll.
#[derive(Debug, Default)]
pub struct FakeScroller {
    pub requests: Vec<ScrollRequest>,
    pub refuse: Option<BridgeError>,
}

impl FakeScroller {
    pub fn last(&self) -> ScrollRequest {
        *self.requests.last().expect("at least one scroll request")
    }
}

impl ScrollRequester for FakeScroller {
    fn request_scroll(&mut self, request: ScrollRequest) -> Result<(), BridgeError> {
        if let Some(err) = self.refuse {
            return Err(err);
        }
        self.requests.push(request);
        Ok(())
    }
}

pub type FakeSession = PagingSession<FakeSurface, FakeScroller>;

pub fn viewport(width: f64, height: f64) -> ViewportGeometry {
    ViewportGeometry::new(width, height, 2.0)
}

pub fn session_with(options: PagingOptions, surface: FakeSurface) -> FakeSession {
    PagingSession::new(options, surface, FakeScroller::default())
}

/// Session with a paginated document of `height` in a 400x1000 viewport.
pub fn paginated_session(height: f64) -> FakeSession {
    let mut session = session_with(PagingOptions::default(), FakeSurface::with_height(height));
    session
        .on_viewport_changed(viewport(400.0, 1000.0))
        .expect("valid viewport");
    session.on_document_replaced("book");
    session.on_content_ready().expect("first layout");
    session
}

pub fn drain(session: &mut FakeSession) -> Vec<PagingEvent> {
    let mut out = Vec::new();
    session.drain_events(|event| out.push(event));
    out
}

pub fn record_diagnostics(session: &mut FakeSession) -> Rc<RefCell<Vec<PagingDiagnostic>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    session.set_diagnostic_sink(move |diagnostic| sink.borrow_mut().push(diagnostic));
    seen
}
