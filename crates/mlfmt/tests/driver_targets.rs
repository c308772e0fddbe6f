use std::collections::HashMap;
use std::fs;

use mlfmt::{expand_target, format_file, FormatOptions, MlfmtError};

#[test]
fn source_files_pass_through_and_manifests_expand() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sml = dir.path().join("a.sml");
    fs::write(&sml, "val a = 1\n").expect("write");
    let sig = dir.path().join("b.sig");
    fs::write(&sig, "signature B = sig end\n").expect("write");
    let mlb = dir.path().join("all.mlb");
    fs::write(&mlb, "a.sml\nb.sig\n").expect("write");

    let vars = HashMap::new();
    assert_eq!(expand_target(&sml, &vars).expect("expand"), vec![sml.clone()]);
    let expanded = expand_target(&mlb, &vars).expect("expand");
    assert_eq!(expanded, vec![sml, sig]);
}

#[test]
fn unknown_extensions_are_rejected() {
    let err = expand_target(std::path::Path::new("notes.txt"), &HashMap::new())
        .expect_err("txt is not a source file");
    assert!(matches!(err, MlfmtError::InvalidPath(_)));
    assert!(err.to_string().contains("notes.txt"));
}

#[test]
fn format_file_reports_io_and_diagnostics_separately() {
    let dir = tempfile::tempdir().expect("tempdir");
    let good = dir.path().join("good.sml");
    fs::write(&good, "val x =\n  1\n").expect("write");
    let formatted = format_file(&good, &FormatOptions::default())
        .expect("io ok")
        .expect("parses");
    assert_eq!(formatted, "val x = 1\n");

    let bad = dir.path().join("bad.sml");
    fs::write(&bad, "val x = (* never closed").expect("write");
    let diagnostic = format_file(&bad, &FormatOptions::default())
        .expect("io ok")
        .expect_err("unterminated comment");
    assert_eq!(diagnostic.what, "unterminated comment");

    let missing = dir.path().join("missing.sml");
    assert!(matches!(
        format_file(&missing, &FormatOptions::default()),
        Err(MlfmtError::Io(_))
    ));
}
