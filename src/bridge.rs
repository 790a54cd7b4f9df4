use crate::paging_ir::{ContainerLayout, ScrollOffset};

/// Scroll-animation request handed to the host surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollRequest {
    /// Ratio the host uses to convert `offset` into physical pixels.
    pub device_pixel_ratio: f64,
    /// Target offset along the paging axis, in logical pixels.
    pub offset: ScrollOffset,
    /// Whether the host should animate towards `offset`.
    pub animate: bool,
}

impl ScrollRequest {
    /// Target offset in physical pixels.
    pub fn physical_offset(&self) -> f64 {
        self.offset.physical(self.device_pixel_ratio)
    }
}

/// Why the host refused a scroll request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BridgeError {
    /// Surface exists but has not loaded the document yet.
    NotReady,
    /// Surface is not attached to a window.
    Detached,
}

impl core::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotReady => write!(f, "host surface not ready"),
            Self::Detached => write!(f, "host surface detached"),
        }
    }
}

impl std::error::Error for BridgeError {}

/// Host capability for fire-and-forget scroll animations.
///
/// Completion is never awaited; the host later reports the settled offset.
pub trait ScrollRequester {
    fn request_scroll(&mut self, request: ScrollRequest) -> Result<(), BridgeError>;
}

impl<T: ScrollRequester + ?Sized> ScrollRequester for &mut T {
    fn request_scroll(&mut self, request: ScrollRequest) -> Result<(), BridgeError> {
        (**self).request_scroll(request)
    }
}

/// Outcome of pushing a container layout to the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceUpdate {
    /// Resize is visible; geometry can be read immediately.
    Applied,
    /// Resize is still being applied; the host acknowledges it later.
    Pending,
}

/// Presentation state of the hosted document.
///
/// Mutated only by the layout engine.
pub trait PagingSurface {
    /// Height of the document flowed as a single column at the current
    /// viewport width and zoom, or `None` while it cannot be measured.
    fn content_height(&self) -> Option<f64>;

    /// Resize the paging container and configure its columns.
    fn apply_container(&mut self, container: &ContainerLayout) -> SurfaceUpdate;

    /// Apply a text zoom level.
    fn apply_zoom(&mut self, zoom: f32);
}

impl<T: PagingSurface + ?Sized> PagingSurface for &mut T {
    fn content_height(&self) -> Option<f64> {
        (**self).content_height()
    }

    fn apply_container(&mut self, container: &ContainerLayout) -> SurfaceUpdate {
        (**self).apply_container(container)
    }

    fn apply_zoom(&mut self, zoom: f32) {
        (**self).apply_zoom(zoom)
    }
}
