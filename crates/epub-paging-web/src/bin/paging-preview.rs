use std::env;
use std::path::Path;
use std::process::ExitCode;

use epub_paging::PagingOptions;
use epub_paging_web::{
    apply_message, container_css, web_session, HostMessage, ScriptSink, WebPagingSession,
    SCROLL_SETTLE_MS,
};
use serde::Serialize;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

const DEFAULT_OUT_PATH: &str = "target/paging-preview/index.html";

#[derive(Clone, Debug)]
struct Args {
    html_path: String,
    out_path: String,
    width: f64,
    height: f64,
    device_pixel_ratio: f64,
    zoom: f32,
    start_page: usize,
    content_height: Option<f64>,
    animate: bool,
    verbose: bool,
}

#[derive(Serialize)]
struct PreviewPayload {
    title: String,
    options: PagingOptions,
    viewport: ViewportPayload,
    start_page: usize,
    settle_ms: u32,
    // Pages the Rust layout predicts for `--content-height`, when given.
    predicted_pages: Option<usize>,
}

#[derive(Serialize)]
struct ViewportPayload {
    width: f64,
    height: f64,
}

/// Collects scripts from a dry-run session.
struct CollectingSink {
    scripts: Vec<String>,
}

impl ScriptSink for CollectingSink {
    fn is_attached(&self) -> bool {
        true
    }

    fn evaluate(&mut self, script: String) {
        self.scripts.push(script);
    }
}

fn main() -> ExitCode {
    match run(env::args().collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            eprintln!("{}", help_text());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let cli = parse_args(args)?;
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    // A logger may already be installed when embedded; keep going without ours.
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    let document = std::fs::read_to_string(&cli.html_path).map_err(|e| e.to_string())?;
    let options = PagingOptions {
        animate_navigation: cli.animate,
        animate_viewport_reflow: cli.animate,
        default_zoom: cli.zoom,
        ..PagingOptions::default()
    }
    .normalized();

    let predicted_pages = match cli.content_height {
        Some(height) => Some(dry_run(&cli, &options, height)?),
        None => None,
    };

    let payload = PreviewPayload {
        title: Path::new(&cli.html_path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| cli.html_path.clone()),
        options,
        viewport: ViewportPayload {
            width: cli.width,
            height: cli.height,
        },
        start_page: cli.start_page,
        settle_ms: SCROLL_SETTLE_MS,
        predicted_pages,
    };

    if cli.out_path.is_empty() {
        return Err("--out must not be empty".to_string());
    }
    if let Some(parent) = Path::new(&cli.out_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
    }
    let data_json = serde_json::to_string(&payload).map_err(|e| e.to_string())?;
    let html = build_html(&data_json, &document);
    std::fs::write(&cli.out_path, html).map_err(|e| e.to_string())?;

    println!(
        "wrote paging preview to {} (viewport={}x{}, zoom={}, predicted_pages={})",
        cli.out_path,
        cli.width,
        cli.height,
        payload.options.default_zoom,
        predicted_pages.map_or_else(|| "-".to_string(), |pages| pages.to_string()),
    );
    Ok(())
}

/// Drive a session against a fake page reporting `content_height`.
fn dry_run(cli: &Args, options: &PagingOptions, content_height: f64) -> Result<usize, String> {
    let mut session = web_session(
        *options,
        CollectingSink {
            scripts: Vec::new(),
        },
    );
    let steps = [
        HostMessage::Viewport {
            width: cli.width,
            height: cli.height,
            device_pixel_ratio: cli.device_pixel_ratio,
        },
        HostMessage::ContentReady {
            height: content_height,
        },
        HostMessage::LayoutApplied,
    ];
    session.on_document_replaced(cli.html_path.clone());
    for step in steps {
        apply_message(&mut session, step).map_err(|e| e.to_string())?;
    }
    session.go_to_page(cli.start_page as i64);
    log_dry_run(&session);
    session
        .page_count()
        .ok_or_else(|| "dry run produced no layout".to_string())
}

fn log_dry_run(session: &WebPagingSession<CollectingSink>) {
    if let Some(layout) = session.layout() {
        log::info!(
            "layout: {} pages of {}x{} ({})",
            layout.page_count,
            layout.page_width,
            layout.page_height,
            container_css(&layout.container())
        );
    }
    session.surface().with_sink(|sink| {
        for script in &sink.scripts {
            log::debug!("script: {}", script);
        }
    });
}

fn escape_srcdoc(document: &str) -> String {
    document.replace('&', "&amp;").replace('"', "&quot;")
}

fn build_html(payload_json: &str, document: &str) -> String {
    let safe_json = payload_json.replace("</script>", "<\\/script>");
    PREVIEW_TEMPLATE
        .replace("__PAYLOAD_JSON__", &safe_json)
        .replace("__SRCDOC__", &escape_srcdoc(document))
}

const PREVIEW_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>epub-paging preview</title>
  <style>
    :root { --bg: #f2efe8; --panel: #fdfbf7; --ink: #252016; --muted: #675f50; --line: #d7cebc; }
    * { box-sizing: border-box; }
    body { margin: 0; padding: 20px; background: var(--bg); color: var(--ink);
      font-family: "Source Sans 3", "Segoe UI", sans-serif; }
    .bar { display: flex; gap: 8px; align-items: center; margin-bottom: 12px; }
    .bar button { padding: 6px 12px; border: 1px solid var(--line); background: var(--panel); border-radius: 6px; }
    .bar .status { color: var(--muted); margin-left: 8px; }
    iframe { border: 1px solid var(--line); background: #fff; display: block; }
  </style>
</head>
<body>
  <div class="bar">
    <button id="prev">Prev</button>
    <button id="next">Next</button>
    <button id="zoom-out">A-</button>
    <button id="zoom-in">A+</button>
    <span class="status" id="status"></span>
  </div>
  <iframe id="page" srcdoc="__SRCDOC__"></iframe>
  <script>
    const payload = __PAYLOAD_JSON__;
    const frame = document.getElementById('page');
    const status = document.getElementById('status');
    const state = { pageCount: 0, pageWidth: 0, current: payload.start_page, zoom: payload.options.default_zoom };

    frame.style.width = payload.viewport.width + 'px';
    frame.style.height = payload.viewport.height + 'px';

    function doc() { return frame.contentDocument; }
    function win() { return frame.contentWindow; }

    function clampPage(page) {
      if (page <= 0 || state.pageCount === 0) { return 0; }
      return Math.min(page, state.pageCount - 1);
    }

    function measure() {
      const body = doc().body;
      body.setAttribute('style', 'width:' + payload.viewport.width + 'px;margin:0;padding:0;');
      return body.scrollHeight;
    }

    function layout(reason) {
      const previous = state.pageCount;
      doc().documentElement.style.fontSize = Math.round(state.zoom * 100) + '%';
      const height = measure();
      const width = payload.viewport.width;
      const pageCount = Math.floor(height / payload.viewport.height) + 1;
      if (previous > 0) {
        const target = Math.round(state.current / previous * pageCount);
        state.current = Math.min(target, pageCount - 1);
      } else {
        state.current = Math.min(state.current, pageCount - 1);
      }
      state.pageCount = pageCount;
      state.pageWidth = width;
      doc().documentElement.style.margin = '0';
      doc().documentElement.style.padding = '0';
      doc().body.setAttribute('style',
        'width:' + (pageCount * width) + 'px;height:' + payload.viewport.height + 'px;' +
        'column-count:' + pageCount + ';column-width:' + width + 'px;column-gap:0px;' +
        'column-fill:auto;margin:0;padding:0;box-sizing:content-box;');
      requestAnimationFrame(() => scrollToPage(state.current, reason === 'navigation'));
    }

    function scrollToPage(page, animate) {
      state.current = clampPage(page);
      const animateNav = animate && payload.options.animate_navigation;
      win().scrollTo({ left: state.current * state.pageWidth, top: 0, behavior: animateNav ? 'smooth' : 'instant' });
      render();
    }

    function render() {
      const predicted = payload.predicted_pages === null ? '' : ' (predicted ' + payload.predicted_pages + ')';
      status.textContent = payload.title + ': page ' + (state.current + 1) + ' of ' + state.pageCount +
        predicted + ', zoom ' + Math.round(state.zoom * 100) + '%';
    }

    function setZoom(next) {
      const clamped = Math.min(Math.max(next, payload.options.min_zoom), payload.options.max_zoom);
      if (clamped === state.zoom) { return; }
      state.zoom = clamped;
      layout('zoom');
    }

    let settleTimer = null;
    frame.addEventListener('load', () => {
      win().addEventListener('scroll', () => {
        clearTimeout(settleTimer);
        settleTimer = setTimeout(() => {
          const page = Math.round(win().scrollX / state.pageWidth);
          state.current = clampPage(page);
          render();
        }, payload.settle_ms);
      }, { passive: true });
      layout('load');
    });

    document.getElementById('prev').addEventListener('click', () => scrollToPage(state.current - 1, true));
    document.getElementById('next').addEventListener('click', () => scrollToPage(state.current + 1, true));
    document.getElementById('zoom-out').addEventListener('click', () => setZoom(state.zoom - 0.25));
    document.getElementById('zoom-in').addEventListener('click', () => setZoom(state.zoom + 0.25));
  </script>
</body>
</html>
"#;

fn parse_args(args: Vec<String>) -> Result<Args, String> {
    if args.len() >= 2 && (args[1] == "--help" || args[1] == "-h") {
        return Err("help requested".to_string());
    }
    let html_path = args
        .get(1)
        .filter(|v| !v.starts_with("--"))
        .cloned()
        .ok_or_else(|| "missing html_path".to_string())?;

    let mut cfg = Args {
        html_path,
        out_path: DEFAULT_OUT_PATH.to_string(),
        width: 390.0,
        height: 844.0,
        device_pixel_ratio: 1.0,
        zoom: 1.0,
        start_page: 0,
        content_height: None,
        animate: true,
        verbose: false,
    };

    let mut i = 2usize;
    while i < args.len() {
        match args[i].as_str() {
            "--out" => {
                let v = args
                    .get(i + 1)
                    .ok_or_else(|| "--out requires a value".to_string())?;
                cfg.out_path = v.clone();
                i += 2;
            }
            "--width" => {
                cfg.width = parse_value(&args, i, "--width")?;
                i += 2;
            }
            "--height" => {
                cfg.height = parse_value(&args, i, "--height")?;
                i += 2;
            }
            "--dpr" => {
                cfg.device_pixel_ratio = parse_value(&args, i, "--dpr")?;
                i += 2;
            }
            "--zoom" => {
                cfg.zoom = parse_value(&args, i, "--zoom")?;
                i += 2;
            }
            "--page" => {
                cfg.start_page = parse_value(&args, i, "--page")?;
                i += 2;
            }
            "--content-height" => {
                cfg.content_height = Some(parse_value(&args, i, "--content-height")?);
                i += 2;
            }
            "--no-animate" => {
                cfg.animate = false;
                i += 1;
            }
            "--verbose" | "-v" => {
                cfg.verbose = true;
                i += 1;
            }
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }

    if !(cfg.width.is_finite() && cfg.width > 0.0) {
        return Err("--width must be > 0".to_string());
    }
    if !(cfg.height.is_finite() && cfg.height > 0.0) {
        return Err("--height must be > 0".to_string());
    }
    Ok(cfg)
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> Result<T, String> {
    let v = args
        .get(i + 1)
        .ok_or_else(|| format!("{} requires a value", flag))?;
    v.parse::<T>()
        .map_err(|_| format!("invalid {} value '{}'", flag, v))
}

fn help_text() -> &'static str {
    r#"paging-preview - standalone column-pagination preview for epub-paging

USAGE:
  cargo run -p epub-paging-web --bin paging-preview -- <html_path> [options]

OPTIONS:
  --out <file>              output HTML path (default: target/paging-preview/index.html)
  --width <px>              viewport width (default: 390)
  --height <px>             viewport height (default: 844)
  --dpr <x>                 device pixel ratio for the dry run (default: 1.0)
  --zoom <x>                initial zoom level (default: 1.0)
  --page <n>                initial 0-based page (default: 0)
  --content-height <px>     dry-run the session with this measured height
  --no-animate              disable animated navigation and reflow
  -v, --verbose             debug logging (prints generated scripts)
"#
}
