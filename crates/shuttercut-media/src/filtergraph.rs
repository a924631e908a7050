//! Overlay filter-graph compiler.
//!
//! Compiles an ordered overlay list into a typed processing graph for
//! ffmpeg's `-filter_complex`. The graph is an ordered list of stages;
//! each stage consumes one or more named stream labels and produces
//! exactly one new label. Stages are emitted in overlay-array order and
//! each stage's primary input is the previous stage's output, so array
//! order is z-order. Serialization to ffmpeg's textual syntax happens
//! only at the invocation boundary via [`FilterGraph::to_filter_complex`].

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use shuttercut_models::{Overlay, OverlayKind};

/// Native stream label of the base video (input index 0).
pub const BASE_VIDEO_LABEL: &str = "0:v";

/// One stage of the processing graph.
///
/// Labels are stored without brackets; brackets are added when the stage
/// is serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterStage {
    /// Draw text onto a stream, gated by a time window.
    DrawText {
        input: String,
        output: String,
        text: String,
        x: i32,
        y: i32,
        font_size: u32,
        color: String,
        start: f64,
        end: f64,
    },
    /// Scale an asset stream to a fixed size.
    Scale {
        input: String,
        output: String,
        width: u32,
        height: u32,
    },
    /// Composite an overlay stream onto a base stream, gated by a time
    /// window.
    Composite {
        base: String,
        overlay: String,
        output: String,
        x: i32,
        y: i32,
        start: f64,
        end: f64,
    },
}

impl FilterStage {
    /// Label of the stream this stage produces.
    pub fn output(&self) -> &str {
        match self {
            FilterStage::DrawText { output, .. } => output,
            FilterStage::Scale { output, .. } => output,
            FilterStage::Composite { output, .. } => output,
        }
    }

    /// Labels of the streams this stage consumes, primary input first.
    pub fn inputs(&self) -> Vec<&str> {
        match self {
            FilterStage::DrawText { input, .. } => vec![input],
            FilterStage::Scale { input, .. } => vec![input],
            FilterStage::Composite { base, overlay, .. } => vec![base, overlay],
        }
    }

    /// Serialize this stage to ffmpeg filter syntax.
    pub fn to_filter_syntax(&self) -> String {
        match self {
            FilterStage::DrawText {
                input,
                output,
                text,
                x,
                y,
                font_size,
                color,
                start,
                end,
            } => {
                format!(
                    "[{input}]drawtext=text='{}':x={x}:y={y}:fontsize={font_size}:fontcolor={}:{}[{output}]",
                    escape_drawtext(text),
                    normalize_color(color),
                    enable_expr(*start, *end),
                )
            }
            FilterStage::Scale {
                input,
                output,
                width,
                height,
            } => format!("[{input}]scale={width}:{height}[{output}]"),
            FilterStage::Composite {
                base,
                overlay,
                output,
                x,
                y,
                start,
                end,
            } => format!(
                "[{base}][{overlay}]overlay=x={x}:y={y}:{}[{output}]",
                enable_expr(*start, *end),
            ),
        }
    }
}

/// A compiled processing graph plus its terminal stream label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterGraph {
    /// Ordered stages
    pub stages: Vec<FilterStage>,
    /// Label of the final video stream (without brackets)
    pub terminal: String,
}

impl FilterGraph {
    /// Whether the graph has no stages.
    ///
    /// An empty graph means no compositing is required and callers must
    /// use a direct stream copy instead of mapping the terminal label.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Serialize the whole graph to `-filter_complex` syntax.
    pub fn to_filter_complex(&self) -> String {
        let mut out = String::new();
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                out.push(';');
            }
            let _ = write!(out, "{}", stage.to_filter_syntax());
        }
        out
    }

    /// The terminal label as an ffmpeg `-map` argument.
    pub fn map_arg(&self) -> String {
        format!("[{}]", self.terminal)
    }
}

/// Compile an overlay list into a processing graph.
///
/// `inputs[0]` is the base video; `inputs[1..]` are overlay assets
/// addressable by base filename. Image/video overlays whose `content`
/// matches no asset are skipped with a warning; this is non-fatal and
/// leaves the chain untouched. When two assets share a base filename the
/// first match wins (undefined behavior upstream, kept as observed).
pub fn compile(inputs: &[PathBuf], overlays: &[Overlay]) -> FilterGraph {
    let mut file_map: HashMap<&str, usize> = HashMap::new();
    for (idx, path) in inputs.iter().enumerate() {
        if let Some(name) = base_name(path) {
            file_map.entry(name).or_insert(idx);
        }
    }

    let mut stages = Vec::new();
    let mut current = BASE_VIDEO_LABEL.to_string();

    for (i, overlay) in overlays.iter().enumerate() {
        let output = format!("v{}", i + 1);

        match overlay.kind {
            OverlayKind::Text => {
                stages.push(FilterStage::DrawText {
                    input: current.clone(),
                    output: output.clone(),
                    text: overlay.content.clone(),
                    x: overlay.x,
                    y: overlay.y,
                    font_size: overlay.font_size,
                    color: overlay.color.clone(),
                    start: overlay.start,
                    end: overlay.end,
                });
            }
            OverlayKind::Image | OverlayKind::Video => {
                let Some(&input_idx) = file_map.get(overlay.content.as_str()) else {
                    warn!(
                        asset = %overlay.content,
                        overlay = i,
                        "overlay asset not found in inputs, skipping"
                    );
                    continue;
                };

                let asset_stream = format!("{input_idx}:v");
                let overlay_stream = if let (Some(width), Some(height)) =
                    (overlay.width, overlay.height)
                {
                    let scaled = format!("scaled{i}");
                    stages.push(FilterStage::Scale {
                        input: asset_stream,
                        output: scaled.clone(),
                        width,
                        height,
                    });
                    scaled
                } else {
                    asset_stream
                };

                stages.push(FilterStage::Composite {
                    base: current.clone(),
                    overlay: overlay_stream,
                    output: output.clone(),
                    x: overlay.x,
                    y: overlay.y,
                    start: overlay.start,
                    end: overlay.end,
                });
            }
        }

        current = output;
    }

    FilterGraph {
        stages,
        terminal: current,
    }
}

/// Time-gating predicate: active while start <= t <= end.
fn enable_expr(start: f64, end: f64) -> String {
    format!("enable='between(t,{start},{end})'")
}

/// Escape text for drawtext.
///
/// Backslash must be escaped before colon and quote, otherwise the
/// escapes themselves get double-escaped.
fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

/// Normalize a color value for drawtext.
///
/// A leading '#' is stripped; bare hex values get ffmpeg's `0x` prefix,
/// named colors pass through untouched.
fn normalize_color(color: &str) -> String {
    let stripped = color.strip_prefix('#').unwrap_or(color);
    let is_hex = matches!(stripped.len(), 6 | 8)
        && stripped.chars().all(|c| c.is_ascii_hexdigit());
    if is_hex {
        format!("0x{stripped}")
    } else {
        stripped.to_string()
    }
}

fn base_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}
