use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::diagnostics::Diagnostic;
use crate::formatter::{format_text, FormatOptions};
use crate::mlb::{self, MlbError};

#[derive(Debug, thiserror::Error)]
pub enum MlfmtError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error(transparent)]
    Mlb(#[from] MlbError),
    #[error("{0}")]
    Usage(String),
    #[error("diagnostics emitted")]
    Diagnostics,
}

fn trace_timing() -> bool {
    std::env::var("MLFMT_TRACE_TIMING").is_ok_and(|v| v == "1")
}

macro_rules! timing_step {
    ($trace:expr, $label:expr, $block:expr) => {{
        let _t0 = if $trace { Some(Instant::now()) } else { None };
        let result = $block;
        if let Some(t0) = _t0 {
            eprintln!(
                "[MLFMT_TIMING] {:40} {:>8.1}ms",
                $label,
                t0.elapsed().as_secs_f64() * 1000.0
            );
        }
        result
    }};
}

/// Expands one CLI target into concrete source files: `.sml`/`.sig`/`.fun`
/// pass through, `.mlb` manifests enumerate their sources.
pub fn expand_target(
    target: &Path,
    mlb_vars: &HashMap<String, String>,
) -> Result<Vec<PathBuf>, MlfmtError> {
    let extension = target.extension().and_then(|e| e.to_str());
    match extension {
        Some("sml") | Some("sig") | Some("fun") => Ok(vec![target.to_path_buf()]),
        Some("mlb") => {
            let trace = trace_timing();
            let files = timing_step!(
                trace,
                format!("expand {}", target.display()),
                mlb::source_files(target, mlb_vars)?
            );
            Ok(files)
        }
        _ => Err(MlfmtError::InvalidPath(format!(
            "{}: expected a .sml, .sig, .fun, or .mlb file",
            target.display()
        ))),
    }
}

/// Reads and formats one file. The outer error is environmental (I/O);
/// the inner result carries the file's own lex/parse diagnostic.
pub fn format_file(
    path: &Path,
    options: &FormatOptions,
) -> Result<Result<String, Diagnostic>, MlfmtError> {
    let trace = trace_timing();
    let content = fs::read_to_string(path)?;
    Ok(timing_step!(
        trace,
        format!("format {}", path.display()),
        format_text(&content, options)
    ))
}
