use serde::{Deserialize, Serialize};

use crate::error::PagingError;

/// Session-wide pagination options.
///
/// Hosts usually ship these as JSON; missing fields take defaults.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingOptions {
    /// Reading progress in `[0, 1]` used to position the first layout of a
    /// document when no stored position was restored.
    pub initial_progress: f32,
    /// Animate scrolls issued by explicit page jumps.
    pub animate_navigation: bool,
    /// Animate the repositioning scroll after a viewport-size reflow.
    pub animate_viewport_reflow: bool,
    /// Lower zoom bound.
    pub min_zoom: f32,
    /// Upper zoom bound.
    pub max_zoom: f32,
    /// Zoom applied to a fresh session.
    pub default_zoom: f32,
}

impl Default for PagingOptions {
    fn default() -> Self {
        Self {
            initial_progress: 0.0,
            animate_navigation: true,
            animate_viewport_reflow: true,
            min_zoom: 0.5,
            max_zoom: 4.0,
            default_zoom: 1.0,
        }
    }
}

impl PagingOptions {
    /// Decode options from a JSON payload and normalize them.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, PagingError> {
        let opts: Self = serde_json::from_slice(bytes)?;
        Ok(opts.normalized())
    }

    /// Clamp every field into its usable range.
    pub fn normalized(self) -> Self {
        let defaults = Self::default();
        let initial_progress = if self.initial_progress.is_finite() {
            self.initial_progress.clamp(0.0, 1.0)
        } else {
            defaults.initial_progress
        };
        let mut min_zoom = positive_or(self.min_zoom, defaults.min_zoom);
        let mut max_zoom = positive_or(self.max_zoom, defaults.max_zoom);
        if min_zoom > max_zoom {
            core::mem::swap(&mut min_zoom, &mut max_zoom);
        }
        let default_zoom =
            positive_or(self.default_zoom, defaults.default_zoom).clamp(min_zoom, max_zoom);
        Self {
            initial_progress,
            animate_navigation: self.animate_navigation,
            animate_viewport_reflow: self.animate_viewport_reflow,
            min_zoom,
            max_zoom,
            default_zoom,
        }
    }

    /// Clamp a host zoom value into `[min_zoom, max_zoom]`.
    ///
    /// Non-finite or non-positive values fall back to `default_zoom`.
    pub fn clamp_zoom(&self, zoom: f32) -> f32 {
        if !zoom.is_finite() || zoom <= 0.0 {
            return self.default_zoom;
        }
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let opts = PagingOptions::from_json_slice(br#"{"initial_progress":0.25}"#)
            .expect("options should decode");
        assert_eq!(opts.initial_progress, 0.25);
        assert!(opts.animate_navigation);
        assert_eq!(opts.max_zoom, 4.0);
    }

    #[test]
    fn malformed_json_is_config_error() {
        let err = PagingOptions::from_json_slice(b"{not json").expect_err("must fail");
        assert!(matches!(err, PagingError::Config(_)));
    }

    #[test]
    fn normalized_repairs_out_of_range_values() {
        let opts = PagingOptions {
            initial_progress: 3.0,
            min_zoom: 5.0,
            max_zoom: 2.0,
            default_zoom: -1.0,
            ..PagingOptions::default()
        }
        .normalized();
        assert_eq!(opts.initial_progress, 1.0);
        assert_eq!(opts.min_zoom, 2.0);
        assert_eq!(opts.max_zoom, 5.0);
        assert_eq!(opts.default_zoom, 2.0);
    }

    #[test]
    fn clamp_zoom_respects_bounds() {
        let opts = PagingOptions::default();
        assert_eq!(opts.clamp_zoom(10.0), 4.0);
        assert_eq!(opts.clamp_zoom(0.1), 0.5);
        assert_eq!(opts.clamp_zoom(1.5), 1.5);
        assert_eq!(opts.clamp_zoom(f32::NAN), 1.0);
    }
}
