use std::time::Instant;

use crate::bridge::{PagingSurface, SurfaceUpdate};
use crate::error::PagingError;
use crate::paging_ir::{LayoutResult, ViewportGeometry};

/// Compute page geometry for a measured document.
///
/// `page_count = floor(document_height / viewport.height) + 1`. The extra page
/// covers both content shorter than one viewport and the partial final page.
pub fn compute_layout(
    document_height: f64,
    viewport: &ViewportGeometry,
) -> Result<LayoutResult, PagingError> {
    viewport.validate()?;
    if !document_height.is_finite() || document_height < 0.0 {
        return Err(PagingError::InvalidDocumentHeight(document_height));
    }
    let viewport = viewport.normalized();
    let full_pages = (document_height / viewport.height).floor();
    let page_count = if full_pages >= usize::MAX as f64 {
        usize::MAX
    } else {
        (full_pages as usize).saturating_add(1)
    };
    Ok(LayoutResult {
        page_count,
        page_width: viewport.width,
        page_height: viewport.height,
        column_gap: 0.0,
        device_pixel_ratio: viewport.device_pixel_ratio,
    })
}

/// Column layout engine bound to one document session.
///
/// Owns the column configuration for its document; a new document gets a new
/// engine so no geometry leaks across books.
#[derive(Clone, Debug)]
pub struct LayoutEngine {
    zoom: f32,
    current: Option<LayoutResult>,
    passes: u64,
    last_pass_us: u32,
}

impl LayoutEngine {
    /// Create an engine for a fresh document at the given zoom level.
    pub fn new(zoom: f32) -> Self {
        Self {
            zoom,
            current: None,
            passes: 0,
            last_pass_us: 0,
        }
    }

    /// Most recent layout result, if any pass completed.
    pub fn current(&self) -> Option<&LayoutResult> {
        self.current.as_ref()
    }

    /// Number of layout passes run for this document.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Zoom level last pushed to the surface.
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Wall time of the last pass in microseconds.
    pub fn last_pass_us(&self) -> u32 {
        self.last_pass_us
    }

    /// Push a zoom level to the surface.
    pub fn set_zoom<S: PagingSurface + ?Sized>(&mut self, surface: &mut S, zoom: f32) {
        self.zoom = zoom;
        surface.apply_zoom(zoom);
    }

    /// Lay out a document of known height and resize the container.
    ///
    /// The result is not recorded as current until [`LayoutEngine::commit`];
    /// a pending resize keeps the previous pass authoritative.
    pub fn layout<S: PagingSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        document_height: f64,
        viewport: &ViewportGeometry,
    ) -> Result<(LayoutResult, SurfaceUpdate), PagingError> {
        let started = Instant::now();
        let result = compute_layout(document_height, viewport)?;
        let update = surface.apply_container(&result.container());
        self.passes = self.passes.saturating_add(1);
        self.last_pass_us = started.elapsed().as_micros().min(u32::MAX as u128) as u32;
        log::debug!(
            "layout pass {}: height={} viewport={}x{} pages={} update={:?}",
            self.passes,
            document_height,
            result.page_width,
            result.page_height,
            result.page_count,
            update
        );
        Ok((result, update))
    }

    /// Record `result` as the completed layout.
    pub fn commit(&mut self, result: LayoutResult) {
        self.current = Some(result);
    }

    /// Measure the surface and lay out the document.
    ///
    /// Fails with [`PagingError::ContentNotReady`] when the surface cannot
    /// measure yet; the caller is expected to retry after its ready signal.
    pub fn measure_and_layout<S: PagingSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        viewport: &ViewportGeometry,
    ) -> Result<(LayoutResult, SurfaceUpdate), PagingError> {
        let Some(document_height) = surface.content_height() else {
            log::warn!("layout requested before the document could be measured");
            return Err(PagingError::ContentNotReady);
        };
        self.layout(surface, document_height, viewport)
    }
}
