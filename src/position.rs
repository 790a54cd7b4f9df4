use serde::{Deserialize, Serialize};

/// Reading progress of `page_index` within `page_count` pages, in `[0, 1)`.
///
/// Returns `0.0` for an empty layout.
pub fn page_progress(page_index: usize, page_count: usize) -> f32 {
    if page_count == 0 {
        return 0.0;
    }
    let clamped = page_index.min(page_count - 1);
    (clamped as f64 / page_count as f64) as f32
}

/// Resolve a progress ratio into a valid page index.
///
/// `round(progress * page_count)`, clamped to the last page.
pub fn progress_to_page_index(progress: f32, page_count: usize) -> usize {
    if page_count <= 1 {
        return 0;
    }
    let max_index = page_count - 1;
    let scaled = (normalize_progress(progress) as f64 * page_count as f64).round();
    if !scaled.is_finite() || scaled <= 0.0 {
        return 0;
    }
    if scaled >= max_index as f64 {
        return max_index;
    }
    scaled as usize
}

fn normalize_progress(progress: f32) -> f32 {
    if progress.is_finite() {
        return progress.clamp(0.0, 1.0);
    }
    0.0
}

/// Persisted reading position for one document.
///
/// Stores the page index together with the page count it was taken under, so
/// it can be remapped when the restoring layout paginates differently.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReadingPosition {
    /// Identifying key of the document (book id, path hash, ...).
    pub document_key: String,
    /// Page index in the source layout.
    pub page_index: usize,
    /// Page count of the source layout.
    pub page_count: usize,
    /// Progress ratio in `[0, 1]`.
    pub progress: f32,
}

impl ReadingPosition {
    pub fn new(document_key: impl Into<String>, page_index: usize, page_count: usize) -> Self {
        Self {
            document_key: document_key.into(),
            page_index,
            page_count,
            progress: page_progress(page_index, page_count),
        }
    }

    /// Page index this position lands on in a layout of `page_count` pages.
    pub fn page_index_for(&self, page_count: usize) -> usize {
        if self.page_count == page_count && page_count > 0 {
            return self.page_index.min(page_count - 1);
        }
        let progress = if self.page_count > 0 {
            page_progress(self.page_index, self.page_count)
        } else {
            self.progress
        };
        progress_to_page_index(progress, page_count)
    }
}
