use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use epub_paging::{ContainerLayout, ScrollRequest};

/// Quiet period after the last scroll event before the page reports a settle.
pub const SCROLL_SETTLE_MS: u32 = 120;

/// Encode `value` as a JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| String::from("\"\""))
}

/// Inline CSS for the paging container.
///
/// Columns are exactly one viewport wide with no gap, and the container has
/// no padding or margin, so page `n` starts at `n * column_width`.
pub fn container_css(container: &ContainerLayout) -> String {
    format!(
        "width:{}px;height:{}px;column-count:{};column-width:{}px;column-gap:{}px;\
         column-fill:auto;margin:0;padding:0;box-sizing:content-box;",
        container.width,
        container.height,
        container.column_count,
        container.column_width,
        container.column_gap,
    )
}

/// Script that applies `container` to the document body and acknowledges the
/// resize once the page has relaid out.
pub fn apply_container_script(container: &ContainerLayout) -> String {
    format!(
        "(function(){{document.documentElement.style.margin='0';\
         document.documentElement.style.padding='0';\
         document.body.setAttribute('style',{});\
         if(window.__epubPaging){{window.__epubPaging.layoutApplied();}}}})();",
        js_string(&container_css(container)),
    )
}

/// Script that scrolls the page horizontally to the request's offset.
///
/// Offsets stay in CSS pixels here; hosts that scroll natively use
/// [`ScrollRequest::physical_offset`] instead.
pub fn scroll_script(request: &ScrollRequest) -> String {
    let behavior = if request.animate { "smooth" } else { "instant" };
    format!(
        "window.scrollTo({{left:{},top:0,behavior:'{}'}});",
        request.offset.value(),
        behavior,
    )
}

/// Text zoom as a root font-size percentage. Triggers a fresh measurement.
pub fn zoom_script(zoom: f32) -> String {
    let percent = (zoom * 100.0).round().max(1.0) as u32;
    format!(
        "document.documentElement.style.fontSize='{}%';\
         if(window.__epubPaging){{window.__epubPaging.reportContent();}}",
        percent,
    )
}

/// Script that navigates the web view to `url`.
pub fn load_url_script(url: &str) -> String {
    format!("window.location.replace({});", js_string(url))
}

/// In-page helper that reports measurements and scroll settles.
///
/// `channel` names the global object the host injected; messages are posted
/// to its `postMessage` as JSON strings decodable as [`crate::HostMessage`].
pub fn bootstrap_script(channel: &str) -> String {
    BOOTSTRAP_TEMPLATE
        .replace("__CHANNEL__", &js_string(channel))
        .replace("__SETTLE_MS__", &SCROLL_SETTLE_MS.to_string())
}

const BOOTSTRAP_TEMPLATE: &str = r#"(function () {
  if (window.__epubPaging) { return; }
  function post(message) {
    var host = window[__CHANNEL__];
    if (host && host.postMessage) { host.postMessage(JSON.stringify(message)); }
  }
  function measure() {
    var body = document.body;
    var saved = body.getAttribute('style');
    body.setAttribute('style', 'width:' + window.innerWidth + 'px;margin:0;padding:0;');
    var height = body.scrollHeight;
    if (saved === null) { body.removeAttribute('style'); } else { body.setAttribute('style', saved); }
    return height;
  }
  function reportViewport() {
    post({
      type: 'viewport',
      width: window.innerWidth,
      height: window.innerHeight,
      devicePixelRatio: window.devicePixelRatio || 1
    });
  }
  var settleTimer = null;
  window.addEventListener('scroll', function () {
    clearTimeout(settleTimer);
    settleTimer = setTimeout(function () {
      post({ type: 'scrollSettled', offset: window.scrollX });
    }, __SETTLE_MS__);
  }, { passive: true });
  window.addEventListener('resize', reportViewport);
  window.__epubPaging = {
    layoutApplied: function () {
      requestAnimationFrame(function () {
        requestAnimationFrame(function () { post({ type: 'layoutApplied' }); });
      });
    },
    reportContent: function () {
      requestAnimationFrame(function () {
        post({ type: 'contentReady', height: measure() });
      });
    }
  };
  reportViewport();
  if (document.readyState === 'complete') {
    window.__epubPaging.reportContent();
  } else {
    window.addEventListener('load', window.__epubPaging.reportContent);
  }
})();
"#;

/// `data:` URI carrying an assembled HTML document.
pub fn document_data_uri(html: &str) -> String {
    format!("data:text/html;charset=utf-8;base64,{}", BASE64.encode(html))
}
