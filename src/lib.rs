//! Viewport pagination core for web-view EPUB readers.
//!
//! The host hands over a fully assembled document plus viewport/zoom
//! geometry. This crate slices the document into fixed-size column pages,
//! maps page indices to scroll offsets and back, and keeps the reader's place
//! when the viewport or zoom level changes.
//!
//! # Usage
//!
//! ```rust
//! use epub_paging::{
//!     BridgeError, ContainerLayout, PagingOptions, PagingSession, PagingSurface,
//!     ScrollRequest, ScrollRequester, SurfaceUpdate, ViewportGeometry,
//! };
//!
//! struct Surface;
//!
//! impl PagingSurface for Surface {
//!     fn content_height(&self) -> Option<f64> {
//!         Some(2000.0)
//!     }
//!     fn apply_container(&mut self, _container: &ContainerLayout) -> SurfaceUpdate {
//!         SurfaceUpdate::Applied
//!     }
//!     fn apply_zoom(&mut self, _zoom: f32) {}
//! }
//!
//! struct Scroller;
//!
//! impl ScrollRequester for Scroller {
//!     fn request_scroll(&mut self, _request: ScrollRequest) -> Result<(), BridgeError> {
//!         Ok(())
//!     }
//! }
//!
//! # fn example() -> Result<(), epub_paging::PagingError> {
//! let mut session = PagingSession::new(PagingOptions::default(), Surface, Scroller);
//! session.on_viewport_changed(ViewportGeometry::new(400.0, 1000.0, 2.0))?;
//! session.on_document_replaced("book-1");
//! session.on_content_ready()?;
//! assert_eq!(session.page_count(), Some(3));
//! session.go_to_page(2);
//! # Ok(())
//! # }
//! # example().expect("usage example");
//! ```

#![cfg_attr(
    not(test),
    deny(
        clippy::disallowed_methods,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

mod bridge;
mod error;
mod options;
mod paging_ir;
mod paging_layout;
mod position;
mod reflow;
mod scroll_map;

pub use bridge::{BridgeError, PagingSurface, ScrollRequest, ScrollRequester, SurfaceUpdate};
pub use error::PagingError;
pub use options::PagingOptions;
pub use paging_ir::{
    ContainerLayout, DocumentState, LayoutResult, LoadState, PagingDiagnostic, PagingEvent,
    ReflowReason, ScrollOffset, ViewportGeometry,
};
pub use paging_layout::{compute_layout, LayoutEngine};
pub use position::{page_progress, progress_to_page_index, ReadingPosition};
pub use reflow::{remap_page_index, PagingSession};
pub use scroll_map::{
    clamp_page_index, offset_for_page, page_from_offset, PageChange, ScrollMapper,
};
