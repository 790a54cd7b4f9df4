/// Errors raised by pagination session handlers and option parsing.
#[derive(Debug)]
pub enum PagingError {
    /// Viewport width/height must be finite and strictly positive.
    InvalidViewport { width: f64, height: f64 },
    /// Document height must be finite and non-negative.
    InvalidDocumentHeight(f64),
    /// Layout was requested before the host surface reported a measurable document.
    ContentNotReady,
    /// No document is attached to the session.
    NoDocument,
    /// The current document failed upstream and will never paginate.
    DocumentFailed,
    /// Options payload could not be decoded.
    Config(serde_json::Error),
}

impl PartialEq for PagingError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::InvalidViewport { width, height },
                Self::InvalidViewport {
                    width: other_width,
                    height: other_height,
                },
            ) => {
                width.to_bits() == other_width.to_bits()
                    && height.to_bits() == other_height.to_bits()
            }
            (Self::InvalidDocumentHeight(a), Self::InvalidDocumentHeight(b)) => {
                a.to_bits() == b.to_bits()
            }
            (Self::ContentNotReady, Self::ContentNotReady)
            | (Self::NoDocument, Self::NoDocument)
            | (Self::DocumentFailed, Self::DocumentFailed) => true,
            (Self::Config(a), Self::Config(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

impl core::fmt::Display for PagingError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidViewport { width, height } => {
                write!(f, "invalid viewport: {}x{}", width, height)
            }
            Self::InvalidDocumentHeight(height) => {
                write!(f, "invalid document height: {}", height)
            }
            Self::ContentNotReady => write!(f, "document content is not ready for layout"),
            Self::NoDocument => write!(f, "no document attached"),
            Self::DocumentFailed => write!(f, "document failed to load"),
            Self::Config(err) => write!(f, "invalid paging options: {}", err),
        }
    }
}

impl std::error::Error for PagingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PagingError {
    fn from(value: serde_json::Error) -> Self {
        Self::Config(value)
    }
}
