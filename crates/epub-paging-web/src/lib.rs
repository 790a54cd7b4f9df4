//! Web-view bridge for `epub-paging`.
//!
//! Renders container layouts and scroll requests into JavaScript for an
//! embedded browser, turns the page's JSON messages back into session
//! events, and remembers reading positions between launches.

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
mod message;
mod positions;
mod scripts;

pub use bridge::{web_session, ScriptSink, WebPagingSession, WebViewBridge};
pub use message::{apply_message, dispatch_message, replace_document, HostMessage, WebBridgeError};
pub use positions::{PositionsError, ReadingPositions};
pub use scripts::{
    apply_container_script, bootstrap_script, container_css, document_data_uri, load_url_script,
    scroll_script, zoom_script, SCROLL_SETTLE_MS,
};
