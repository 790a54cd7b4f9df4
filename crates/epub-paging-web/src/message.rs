use epub_paging::{PagingError, ViewportGeometry};
use serde::{Deserialize, Serialize};

use crate::bridge::{ScriptSink, WebPagingSession};
use crate::scripts::document_data_uri;

/// Message posted by the page (or the host shell) about the web view.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostMessage {
    /// Document measured; `height` is the single-column height in CSS pixels.
    ContentReady { height: f64 },
    /// Page finished applying the last container resize.
    LayoutApplied,
    /// Scrolling came to rest at `offset` CSS pixels.
    ScrollSettled { offset: f64 },
    /// Viewport size or pixel ratio.
    Viewport {
        width: f64,
        height: f64,
        #[serde(rename = "devicePixelRatio", default = "default_pixel_ratio")]
        device_pixel_ratio: f64,
    },
    /// User or host changed the zoom level.
    Zoom { level: f32 },
    /// Web view attached to a window.
    Attached,
    /// Web view detached from its window.
    Detached,
    /// Document failed to load.
    LoadFailed,
}

fn default_pixel_ratio() -> f64 {
    1.0
}

/// Errors from decoding or applying a host message.
#[derive(Debug)]
pub enum WebBridgeError {
    Decode(serde_json::Error),
    Session(PagingError),
}

impl core::fmt::Display for WebBridgeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Decode(err) => write!(f, "invalid host message: {}", err),
            Self::Session(err) => write!(f, "paging session error: {}", err),
        }
    }
}

impl std::error::Error for WebBridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(err) => Some(err),
            Self::Session(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for WebBridgeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value)
    }
}

impl From<PagingError> for WebBridgeError {
    fn from(value: PagingError) -> Self {
        Self::Session(value)
    }
}

/// Decode a JSON host message and feed it to `session`.
///
/// Returns the decoded message so hosts can observe traffic.
pub fn dispatch_message<K: ScriptSink>(
    session: &mut WebPagingSession<K>,
    payload: &[u8],
) -> Result<HostMessage, WebBridgeError> {
    let message: HostMessage = serde_json::from_slice(payload)?;
    apply_message(session, message)?;
    Ok(message)
}

/// Feed an already-decoded host message to `session`.
pub fn apply_message<K: ScriptSink>(
    session: &mut WebPagingSession<K>,
    message: HostMessage,
) -> Result<(), WebBridgeError> {
    match message {
        HostMessage::ContentReady { height } => {
            session.surface().record_content_height(height);
            session.on_content_ready()?;
        }
        HostMessage::LayoutApplied => {
            if !session.surface().acknowledge_layout() {
                log::debug!("unsolicited layout acknowledgement");
            }
            session.on_layout_applied()?;
        }
        HostMessage::ScrollSettled { offset } => {
            session.on_scroll_settled(offset);
        }
        HostMessage::Viewport {
            width,
            height,
            device_pixel_ratio,
        } => {
            session.on_viewport_changed(ViewportGeometry::new(width, height, device_pixel_ratio))?;
        }
        HostMessage::Zoom { level } => {
            session.on_zoom_changed(level)?;
        }
        HostMessage::Attached => {
            session.surface().reattach();
            session.on_surface_ready();
        }
        HostMessage::Detached => {
            log::debug!("web view detached");
        }
        HostMessage::LoadFailed => {
            session.on_document_failed();
        }
    }
    Ok(())
}

/// Load `html` into the web view as the session's new document.
pub fn replace_document<K: ScriptSink>(
    session: &mut WebPagingSession<K>,
    document_key: impl Into<String>,
    html: &str,
) {
    session.surface().load_document(document_data_uri(html));
    session.on_document_replaced(document_key);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_tagged_messages() {
        let msg: HostMessage =
            serde_json::from_str(r#"{"type":"contentReady","height":9500}"#).expect("decode");
        assert_eq!(msg, HostMessage::ContentReady { height: 9500.0 });

        let msg: HostMessage = serde_json::from_str(
            r#"{"type":"viewport","width":390,"height":844,"devicePixelRatio":3}"#,
        )
        .expect("decode");
        assert_eq!(
            msg,
            HostMessage::Viewport {
                width: 390.0,
                height: 844.0,
                device_pixel_ratio: 3.0
            }
        );

        let msg: HostMessage =
            serde_json::from_str(r#"{"type":"viewport","width":390,"height":844}"#)
                .expect("decode");
        assert!(matches!(
            msg,
            HostMessage::Viewport {
                device_pixel_ratio, ..
            } if device_pixel_ratio == 1.0
        ));

        let msg: HostMessage = serde_json::from_str(r#"{"type":"layoutApplied"}"#).expect("decode");
        assert_eq!(msg, HostMessage::LayoutApplied);
    }

    #[test]
    fn encodes_with_camel_case_tags() {
        let json = serde_json::to_string(&HostMessage::ScrollSettled { offset: 800.0 })
            .expect("encode");
        assert_eq!(json, r#"{"type":"scrollSettled","offset":800.0}"#);
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(serde_json::from_str::<HostMessage>(r#"{"type":"shake"}"#).is_err());
    }
}
