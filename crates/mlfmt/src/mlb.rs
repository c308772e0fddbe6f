use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::diagnostics::Diagnostic;
use crate::lexer::{lex_mlb, LexResult, Token, TokenKind};

/// The extensions an ML Basis file can pull in.
const SOURCE_EXTENSIONS: &[&str] = &["sml", "sig", "fun"];

#[derive(Debug, thiserror::Error)]
pub enum MlbError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {}", .path.display(), .error.what)]
    Lex { path: PathBuf, error: Diagnostic },
    #[error("{}: undefined path variable $({name})", .path.display())]
    UndefinedPathVar { path: PathBuf, name: String },
}

/// Enumerates the source files referenced by a manifest, in order,
/// following nested `.mlb` includes and substituting `$(VAR)` references.
/// Each file is listed once even when reachable along several paths.
pub fn source_files(
    manifest: &Path,
    vars: &HashMap<String, String>,
) -> Result<Vec<PathBuf>, MlbError> {
    let mut seen_manifests = HashSet::new();
    let mut seen_sources = HashSet::new();
    let mut out = Vec::new();
    collect(manifest, vars, &mut seen_manifests, &mut seen_sources, &mut out)?;
    Ok(out)
}

fn collect(
    manifest: &Path,
    vars: &HashMap<String, String>,
    seen_manifests: &mut HashSet<PathBuf>,
    seen_sources: &mut HashSet<PathBuf>,
    out: &mut Vec<PathBuf>,
) -> Result<(), MlbError> {
    if !seen_manifests.insert(manifest.to_path_buf()) {
        return Ok(());
    }
    let content = fs::read_to_string(manifest).map_err(|source| MlbError::Io {
        path: manifest.to_path_buf(),
        source,
    })?;
    let tokens = match lex_mlb(&content) {
        LexResult::Success(tokens) => tokens,
        LexResult::Failure { error, .. } => {
            return Err(MlbError::Lex {
                path: manifest.to_path_buf(),
                error,
            })
        }
    };
    let base = manifest.parent().unwrap_or_else(|| Path::new("."));

    let mut index = 0;
    while index < tokens.len() {
        let token = &tokens[index];
        let path_text = match token.kind {
            TokenKind::String => {
                index += 1;
                Some(strip_quotes(&token.text).to_string())
            }
            TokenKind::Ident | TokenKind::PathVar => {
                let mut text = expand(manifest, &token.text, vars)?;
                let mut end = token;
                index += 1;
                while index < tokens.len() && continues_path(end, &tokens[index]) {
                    text.push_str(&expand(manifest, &tokens[index].text, vars)?);
                    end = &tokens[index];
                    index += 1;
                }
                Some(text)
            }
            _ => {
                index += 1;
                None
            }
        };
        let Some(path_text) = path_text else {
            continue;
        };
        let Some(extension) = Path::new(&path_text).extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let resolved = base.join(&path_text);
        if extension == "mlb" {
            collect(&resolved, vars, seen_manifests, seen_sources, out)?;
        } else if SOURCE_EXTENSIONS.contains(&extension) && seen_sources.insert(resolved.clone()) {
            out.push(resolved);
        }
    }
    Ok(())
}

/// Bare paths lex as several tokens (`$(LIB)` + `/basis.mlb`); fragments
/// that abut in the source belong to one path.
fn continues_path(prev: &Token, next: &Token) -> bool {
    matches!(next.kind, TokenKind::Ident | TokenKind::PathVar)
        && next.leading_comments.is_empty()
        && prev.span.end.line == next.span.start.line
        && prev.span.end.column + 1 == next.span.start.column
}

fn expand(
    manifest: &Path,
    text: &str,
    vars: &HashMap<String, String>,
) -> Result<String, MlbError> {
    let Some(name) = text.strip_prefix("$(").and_then(|t| t.strip_suffix(')')) else {
        return Ok(text.to_string());
    };
    match vars.get(name) {
        Some(value) => Ok(value.clone()),
        None => Err(MlbError::UndefinedPathVar {
            path: manifest.to_path_buf(),
            name: name.to_string(),
        }),
    }
}

fn strip_quotes(text: &str) -> &str {
    let inner = text.strip_prefix('"').unwrap_or(text);
    inner.strip_suffix('"').unwrap_or(inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).expect("write fixture");
        path
    }

    #[test]
    fn lists_sources_in_order_and_follows_nested_manifests() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "a.sml", "val a = 1\n");
        write(dir.path(), "b.sig", "signature B = sig end\n");
        write(dir.path(), "inner.mlb", "b.sig\n");
        let root = write(
            dir.path(),
            "root.mlb",
            "local\n  a.sml\n  inner.mlb\nin\n  structure A\nend\n",
        );
        let files = source_files(&root, &HashMap::new()).expect("sources");
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().expect("file name").to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.sml", "b.sig"]);
    }

    #[test]
    fn expands_path_variables_and_reports_undefined_ones() {
        let dir = tempfile::tempdir().expect("tempdir");
        let lib = dir.path().join("lib");
        fs::create_dir(&lib).expect("mkdir");
        write(&lib, "c.sml", "val c = 3\n");
        let root = write(dir.path(), "root.mlb", "$(LIB)/c.sml\n");

        let mut vars = HashMap::new();
        vars.insert("LIB".to_string(), "lib".to_string());
        let files = source_files(&root, &vars).expect("sources");
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("lib/c.sml"));

        let err = source_files(&root, &HashMap::new()).unwrap_err();
        assert!(matches!(err, MlbError::UndefinedPathVar { name, .. } if name == "LIB"));
    }

    #[test]
    fn quoted_paths_and_duplicates() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "x y.sml", "val x = 1\n");
        write(dir.path(), "a.sml", "val a = 1\n");
        let root = write(dir.path(), "root.mlb", "\"x y.sml\"\na.sml\na.sml\n");
        let files = source_files(&root, &HashMap::new()).expect("sources");
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().expect("file name").to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["x y.sml", "a.sml"]);
    }
}
