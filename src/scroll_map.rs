use crate::bridge::{ScrollRequest, ScrollRequester};
use crate::paging_ir::{LayoutResult, ScrollOffset};

/// Clamp a requested page index into `[0, page_count)`.
///
/// Out-of-range requests are never an error. A zero page count maps to `0`.
pub fn clamp_page_index(requested: i64, page_count: usize) -> usize {
    if requested <= 0 || page_count == 0 {
        return 0;
    }
    let max_index = page_count - 1;
    usize::try_from(requested).map_or(max_index, |index| index.min(max_index))
}

/// Scroll offset of the left edge of `page_index`.
pub fn offset_for_page(page_index: usize, layout: &LayoutResult) -> ScrollOffset {
    ScrollOffset(page_index as f64 * layout.page_width)
}

/// Page shown at a settled scroll offset.
///
/// Rounds to the nearest page boundary and clamps into range. Non-finite
/// offsets map to the first page.
pub fn page_from_offset(offset: f64, layout: &LayoutResult) -> usize {
    if !offset.is_finite() || !layout.page_width.is_finite() || layout.page_width <= 0.0 {
        return 0;
    }
    let rounded = (offset / layout.page_width).round();
    if rounded <= 0.0 {
        return 0;
    }
    let max_index = layout.last_page_index();
    if rounded >= max_index as f64 {
        return max_index;
    }
    rounded as usize
}

/// Settled page reported to the UI layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageChange {
    pub current_page: usize,
    pub total_pages: usize,
}

/// Owns the reader's page index and issues scroll requests through the bridge.
///
/// Only reads geometry from [`LayoutResult`]; never touches presentation.
#[derive(Debug)]
pub struct ScrollMapper<R> {
    requester: R,
    current_page: usize,
    last_reported: Option<PageChange>,
}

impl<R: ScrollRequester> ScrollMapper<R> {
    pub fn new(requester: R) -> Self {
        Self {
            requester,
            current_page: 0,
            last_reported: None,
        }
    }

    /// Current page index.
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Last page change handed to the UI layer.
    pub fn last_reported(&self) -> Option<PageChange> {
        self.last_reported
    }

    pub fn requester(&self) -> &R {
        &self.requester
    }

    pub fn requester_mut(&mut self) -> &mut R {
        &mut self.requester
    }

    /// Forget position state for a new document.
    pub fn reset(&mut self) {
        self.current_page = 0;
        self.last_reported = None;
    }

    /// Record `page_index` (clamped) as current without scrolling.
    pub fn set_current_page(&mut self, page_index: i64, layout: &LayoutResult) {
        self.current_page = clamp_page_index(page_index, layout.page_count);
    }

    /// Move to `page_index` (clamped) and request the matching scroll.
    ///
    /// The page becomes current immediately. A refused request is dropped;
    /// the next settle report reconciles state. Returns the target offset and
    /// whether the bridge accepted it.
    pub fn go_to_page(
        &mut self,
        page_index: i64,
        layout: &LayoutResult,
        animate: bool,
    ) -> (ScrollOffset, bool) {
        let page = clamp_page_index(page_index, layout.page_count);
        let offset = offset_for_page(page, layout);
        self.current_page = page;
        let request = ScrollRequest {
            device_pixel_ratio: layout.device_pixel_ratio,
            offset,
            animate,
        };
        let delivered = match self.requester.request_scroll(request) {
            Ok(()) => true,
            Err(err) => {
                log::debug!("scroll to page {} dropped: {}", page, err);
                false
            }
        };
        (offset, delivered)
    }

    /// Record a settled scroll offset.
    ///
    /// Returns a change only when `(page, total)` differs from the last
    /// reported pair.
    pub fn observe_settled(&mut self, offset: f64, layout: &LayoutResult) -> Option<PageChange> {
        let page = page_from_offset(offset, layout);
        self.current_page = page;
        let change = PageChange {
            current_page: page,
            total_pages: layout.page_count,
        };
        if self.last_reported == Some(change) {
            return None;
        }
        self.last_reported = Some(change);
        Some(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::BridgeError;

    #[derive(Default)]
    struct RecordingRequester {
        requests: Vec<ScrollRequest>,
        refuse: bool,
    }

    impl ScrollRequester for RecordingRequester {
        fn request_scroll(&mut self, request: ScrollRequest) -> Result<(), BridgeError> {
            if self.refuse {
                return Err(BridgeError::NotReady);
            }
            self.requests.push(request);
            Ok(())
        }
    }

    fn layout(page_count: usize, page_width: f64) -> LayoutResult {
        LayoutResult {
            page_count,
            page_width,
            page_height: 800.0,
            column_gap: 0.0,
            device_pixel_ratio: 2.0,
        }
    }

    #[test]
    fn clamp_handles_both_ends() {
        assert_eq!(clamp_page_index(-5, 10), 0);
        assert_eq!(clamp_page_index(0, 10), 0);
        assert_eq!(clamp_page_index(4, 10), 4);
        assert_eq!(clamp_page_index(15, 10), 9);
        assert_eq!(clamp_page_index(i64::MAX, 10), 9);
        assert_eq!(clamp_page_index(3, 0), 0);
    }

    #[test]
    fn offset_is_page_times_width() {
        let l = layout(5, 400.0);
        assert_eq!(offset_for_page(3, &l).value(), 1200.0);
        assert_eq!(page_from_offset(1200.0, &l), 3);
    }

    #[test]
    fn page_from_offset_rounds_to_nearest_page() {
        let l = layout(5, 400.0);
        assert_eq!(page_from_offset(1390.0, &l), 3);
        assert_eq!(page_from_offset(1410.0, &l), 4);
        assert_eq!(page_from_offset(-300.0, &l), 0);
        assert_eq!(page_from_offset(99_999.0, &l), 4);
        assert_eq!(page_from_offset(f64::NAN, &l), 0);
    }

    #[test]
    fn round_trip_is_stable_for_every_page() {
        for (count, width) in [(1usize, 320.0), (7, 411.43), (250, 1080.0)] {
            let l = layout(count, width);
            for page in 0..count {
                let offset = offset_for_page(page, &l);
                assert_eq!(page_from_offset(offset.value(), &l), page);
            }
        }
    }

    #[test]
    fn go_to_page_clamps_and_requests_scroll() {
        let mut mapper = ScrollMapper::new(RecordingRequester::default());
        let l = layout(10, 400.0);

        let (low, delivered) = mapper.go_to_page(-5, &l, true);
        assert!(delivered);
        assert_eq!(low, mapper.go_to_page(0, &l, true).0);
        assert_eq!(mapper.current_page(), 0);

        let (high, _) = mapper.go_to_page(15, &l, false);
        assert_eq!(high, mapper.go_to_page(9, &l, false).0);
        assert_eq!(mapper.current_page(), 9);

        let last = mapper.requester().requests.last().copied().expect("request");
        assert_eq!(last.offset.value(), 3600.0);
        assert_eq!(last.device_pixel_ratio, 2.0);
        assert_eq!(last.physical_offset(), 7200.0);
        assert!(!last.animate);
    }

    #[test]
    fn refused_scroll_still_updates_current_page() {
        let mut mapper = ScrollMapper::new(RecordingRequester {
            refuse: true,
            ..RecordingRequester::default()
        });
        let l = layout(10, 400.0);
        let (offset, delivered) = mapper.go_to_page(4, &l, true);
        assert!(!delivered);
        assert_eq!(offset.value(), 1600.0);
        assert_eq!(mapper.current_page(), 4);
        assert!(mapper.requester().requests.is_empty());
    }

    #[test]
    fn settled_changes_are_reported_once() {
        let mut mapper = ScrollMapper::new(RecordingRequester::default());
        let l = layout(10, 400.0);
        assert_eq!(
            mapper.observe_settled(800.0, &l),
            Some(PageChange {
                current_page: 2,
                total_pages: 10
            })
        );
        assert_eq!(mapper.observe_settled(805.0, &l), None);
        assert_eq!(mapper.current_page(), 2);

        let grown = layout(12, 400.0);
        assert_eq!(
            mapper.observe_settled(800.0, &grown),
            Some(PageChange {
                current_page: 2,
                total_pages: 12
            })
        );

        mapper.reset();
        assert_eq!(mapper.current_page(), 0);
        assert!(mapper.last_reported().is_none());
    }
}
