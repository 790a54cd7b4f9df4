use serde::{Deserialize, Serialize};

use crate::error::PagingError;
use crate::options::PagingOptions;

/// Visible rendering area reported by the host.
///
/// Width and height are logical (CSS) pixels. Changes arrive as events; the
/// session never mutates a shared geometry object.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewportGeometry {
    /// Logical viewport width along the paging axis.
    pub width: f64,
    /// Logical viewport height (cross axis).
    pub height: f64,
    /// Physical-to-logical pixel ratio.
    pub device_pixel_ratio: f64,
}

impl ViewportGeometry {
    /// Build a viewport from logical size and device pixel ratio.
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    /// Check layout preconditions: finite, strictly positive width and height.
    pub fn validate(&self) -> Result<(), PagingError> {
        let valid = self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0;
        if valid {
            return Ok(());
        }
        Err(PagingError::InvalidViewport {
            width: self.width,
            height: self.height,
        })
    }

    /// Copy with a usable device pixel ratio (`1.0` when missing or bogus).
    pub fn normalized(self) -> Self {
        let ratio = self.device_pixel_ratio;
        let device_pixel_ratio = if ratio.is_finite() && ratio > 0.0 {
            ratio
        } else {
            1.0
        };
        Self {
            device_pixel_ratio,
            ..self
        }
    }
}

/// Outcome of one layout pass.
///
/// Superseded (never patched) by the next pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutResult {
    /// Number of viewport-sized pages, always at least one.
    pub page_count: usize,
    /// Width of one page; equals the viewport width.
    pub page_width: f64,
    /// Height of one page; equals the viewport height.
    pub page_height: f64,
    /// Gap between columns; always zero.
    pub column_gap: f64,
    /// Pixel ratio the pass was computed under, forwarded with scroll requests.
    pub device_pixel_ratio: f64,
}

impl LayoutResult {
    /// Container presentation that realizes this layout.
    pub fn container(&self) -> ContainerLayout {
        ContainerLayout {
            width: self.page_count as f64 * self.page_width,
            height: self.page_height,
            column_count: self.page_count,
            column_width: self.page_width,
            column_gap: self.column_gap,
        }
    }

    /// Index of the last page.
    pub fn last_page_index(&self) -> usize {
        self.page_count.saturating_sub(1)
    }
}

/// Paging-container geometry pushed to the host surface.
///
/// Padding and margin of the container are always zero so that columns start
/// exactly on page boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContainerLayout {
    /// Total width along the paging axis (`column_count * column_width`).
    pub width: f64,
    /// Cross-axis height (viewport height).
    pub height: f64,
    /// Number of fixed-width columns, one per page.
    pub column_count: usize,
    /// Width of each column.
    pub column_width: f64,
    /// Inter-column gap.
    pub column_gap: f64,
}

/// Physical coordinate along the paging axis, in logical pixels.
///
/// Always derived from a page index and the current [`LayoutResult`].
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct ScrollOffset(pub(crate) f64);

impl ScrollOffset {
    /// Offset in logical pixels.
    pub fn value(self) -> f64 {
        self.0
    }

    /// Offset converted to physical pixels.
    pub fn physical(self, device_pixel_ratio: f64) -> f64 {
        self.0 * device_pixel_ratio
    }
}

/// Why a layout pass runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReflowReason {
    /// First layout after the host reported content-ready.
    DocumentLoad,
    /// Viewport size changed.
    Viewport,
    /// Zoom level changed.
    Zoom,
}

impl ReflowReason {
    /// Whether the repositioning scroll for this reason should animate.
    ///
    /// Zoom reflows land without animation so the page-count change and the
    /// zoom change do not produce two visible jumps.
    pub fn animates(self, options: &PagingOptions) -> bool {
        match self {
            Self::DocumentLoad | Self::Zoom => false,
            Self::Viewport => options.animate_viewport_reflow,
        }
    }

    /// Coalesce a superseded reason with an incoming one.
    pub fn merge(self, incoming: Self) -> Self {
        match (self, incoming) {
            (Self::DocumentLoad, _) | (_, Self::DocumentLoad) => Self::DocumentLoad,
            (Self::Zoom, _) | (_, Self::Zoom) => Self::Zoom,
            _ => Self::Viewport,
        }
    }
}

/// Document lifecycle as seen by the pagination core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentState {
    /// No document attached.
    Unloaded,
    /// Document handed over; waiting for content-ready.
    Loaded,
    /// Page count known; navigation is served immediately.
    Paginated,
    /// Container resize in flight; navigation is queued.
    Reflowing,
    /// Upstream assembly/load failed; terminal for this document.
    Failed,
}

/// Loading/error pair surfaced to the UI layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadState {
    /// A document was replaced and its first layout has not completed.
    pub loading: bool,
    /// The document failed to load; cleared by the next replacement.
    pub error: bool,
}

/// Notifications for the UI-binding layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PagingEvent {
    /// Raised once per completed layout pass.
    PageCountKnown { page_count: usize },
    /// Raised when the settled page differs from the last reported one.
    PageChanged {
        current_page: usize,
        total_pages: usize,
    },
    /// Raised when either loading flag flips.
    LoadStateChanged(LoadState),
}

/// Runtime diagnostics from layout and navigation.
#[derive(Clone, Debug, PartialEq)]
pub enum PagingDiagnostic {
    /// Wall time of one layout pass in microseconds.
    ReflowTimeUs(u32),
    /// A pending reflow was replaced by a newer request.
    ReflowSuperseded { reason: ReflowReason },
    /// The bridge rejected a scroll request.
    ScrollDropped { page_index: usize },
    /// A navigation request was parked until the next layout completes.
    NavigationQueued { page_index: i64 },
    /// Layout was requested before the surface could measure the document.
    ContentNotReady,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_validation_rejects_degenerate_sizes() {
        assert!(ViewportGeometry::new(400.0, 1000.0, 1.0).validate().is_ok());
        assert_eq!(
            ViewportGeometry::new(0.0, 1000.0, 1.0).validate(),
            Err(PagingError::InvalidViewport {
                width: 0.0,
                height: 1000.0
            })
        );
        assert!(ViewportGeometry::new(400.0, -1.0, 1.0).validate().is_err());
        assert!(ViewportGeometry::new(f64::NAN, 10.0, 1.0)
            .validate()
            .is_err());
    }

    #[test]
    fn normalized_viewport_repairs_pixel_ratio() {
        let vp = ViewportGeometry::new(400.0, 800.0, 0.0).normalized();
        assert_eq!(vp.device_pixel_ratio, 1.0);
        let vp = ViewportGeometry::new(400.0, 800.0, 2.625).normalized();
        assert_eq!(vp.device_pixel_ratio, 2.625);
    }

    #[test]
    fn container_spans_all_columns() {
        let layout = LayoutResult {
            page_count: 4,
            page_width: 360.0,
            page_height: 640.0,
            column_gap: 0.0,
            device_pixel_ratio: 3.0,
        };
        let container = layout.container();
        assert_eq!(container.width, 1440.0);
        assert_eq!(container.height, 640.0);
        assert_eq!(container.column_count, 4);
        assert_eq!(container.column_width, 360.0);
        assert_eq!(container.column_gap, 0.0);
        assert_eq!(layout.last_page_index(), 3);
    }

    #[test]
    fn reflow_reason_animation_policy() {
        let opts = PagingOptions::default();
        assert!(ReflowReason::Viewport.animates(&opts));
        assert!(!ReflowReason::Zoom.animates(&opts));
        assert!(!ReflowReason::DocumentLoad.animates(&opts));

        let still = PagingOptions {
            animate_viewport_reflow: false,
            ..PagingOptions::default()
        };
        assert!(!ReflowReason::Viewport.animates(&still));
    }

    #[test]
    fn merged_reason_keeps_non_animating_cause() {
        assert_eq!(
            ReflowReason::Viewport.merge(ReflowReason::Zoom),
            ReflowReason::Zoom
        );
        assert_eq!(
            ReflowReason::Zoom.merge(ReflowReason::Viewport),
            ReflowReason::Zoom
        );
        assert_eq!(
            ReflowReason::Viewport.merge(ReflowReason::Viewport),
            ReflowReason::Viewport
        );
        assert_eq!(
            ReflowReason::DocumentLoad.merge(ReflowReason::Viewport),
            ReflowReason::DocumentLoad
        );
    }

    #[test]
    fn scroll_offset_converts_to_physical_pixels() {
        let offset = ScrollOffset(1200.0);
        assert_eq!(offset.value(), 1200.0);
        assert_eq!(offset.physical(2.0), 2400.0);
    }
}
