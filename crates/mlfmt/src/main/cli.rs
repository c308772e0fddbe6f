use mlfmt::{
    expand_target, format_file, render_diagnostic, FormatOptions, MlfmtError,
};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

const MLFMT_VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(MlfmtError::Diagnostics) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

struct Config {
    targets: Vec<PathBuf>,
    force: bool,
    preview: bool,
    preview_only: bool,
    mlb_vars: HashMap<String, String>,
    options: FormatOptions,
}

fn run() -> Result<(), MlfmtError> {
    let Some(config) = parse_args()? else {
        return Ok(());
    };

    let mut files = Vec::new();
    for target in &config.targets {
        for file in expand_target(target, &config.mlb_vars)? {
            if !files.contains(&file) {
                files.push(file);
            }
        }
    }

    let use_color = io::stderr().is_terminal();
    let mut had_errors = false;
    for file in &files {
        match format_file(file, &config.options)? {
            Err(diagnostic) => {
                had_errors = true;
                let source = fs::read_to_string(file).ok();
                let rendered = render_diagnostic(
                    &file.display().to_string(),
                    &diagnostic,
                    source.as_deref(),
                    use_color,
                );
                eprintln!("{rendered}");
            }
            Ok(formatted) => {
                if config.preview || config.preview_only {
                    print!("{formatted}");
                }
                if config.preview_only {
                    continue;
                }
                let unchanged = fs::read_to_string(file)
                    .map(|content| content == formatted)
                    .unwrap_or(false);
                if unchanged {
                    continue;
                }
                if !config.force && !confirm_overwrite(file)? {
                    continue;
                }
                fs::write(file, formatted)?;
            }
        }
    }

    if had_errors {
        Err(MlfmtError::Diagnostics)
    } else {
        Ok(())
    }
}

fn parse_args() -> Result<Option<Config>, MlfmtError> {
    let mut config = Config {
        targets: Vec::new(),
        force: false,
        preview: false,
        preview_only: false,
        mlb_vars: HashMap::new(),
        options: FormatOptions::default(),
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                return Ok(None);
            }
            "-V" | "--version" => {
                println!("mlfmt {MLFMT_VERSION}");
                return Ok(None);
            }
            "--force" => config.force = true,
            "--preview" => config.preview = true,
            "--preview-only" => config.preview_only = true,
            "-mlb-path-var" => {
                let value = next_value(&mut args, "-mlb-path-var")?;
                let Some((name, value)) = value.split_once(' ') else {
                    return Err(MlfmtError::Usage(format!(
                        "-mlb-path-var expects \"<NAME> <VALUE>\", got \"{value}\""
                    )));
                };
                config
                    .mlb_vars
                    .insert(name.to_string(), value.to_string());
            }
            "-ribbon-frac" => {
                let value = next_value(&mut args, "-ribbon-frac")?;
                let parsed: f64 = value
                    .parse()
                    .map_err(|_| usage_number("-ribbon-frac", &value))?;
                if !(parsed > 0.0 && parsed <= 1.0) {
                    return Err(MlfmtError::Usage(format!(
                        "-ribbon-frac must be in (0, 1], got {value}"
                    )));
                }
                config.options.ribbon_frac = parsed;
            }
            "-max-width" => {
                let value = next_value(&mut args, "-max-width")?;
                let parsed: usize = value
                    .parse()
                    .map_err(|_| usage_number("-max-width", &value))?;
                if parsed < 1 {
                    return Err(MlfmtError::Usage(
                        "-max-width must be at least 1".to_string(),
                    ));
                }
                config.options.max_width = parsed;
            }
            "-indent-width" => {
                let value = next_value(&mut args, "-indent-width")?;
                config.options.indent_width = value
                    .parse()
                    .map_err(|_| usage_number("-indent-width", &value))?;
            }
            "-tab-width" => {
                let value = next_value(&mut args, "-tab-width")?;
                let parsed: usize = value
                    .parse()
                    .map_err(|_| usage_number("-tab-width", &value))?;
                if parsed < 1 {
                    return Err(MlfmtError::Usage(
                        "-tab-width must be at least 1".to_string(),
                    ));
                }
                config.options.tab_width = parsed;
            }
            _ if arg.starts_with('-') => {
                return Err(MlfmtError::Usage(format!("unknown option {arg}")));
            }
            _ => config.targets.push(PathBuf::from(arg)),
        }
    }

    if config.preview_only && config.force {
        return Err(MlfmtError::Usage(
            "--preview-only writes nothing, so it cannot be combined with --force".to_string(),
        ));
    }
    if config.targets.is_empty() {
        print_help();
        return Ok(None);
    }
    Ok(Some(config))
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, MlfmtError> {
    args.next()
        .ok_or_else(|| MlfmtError::Usage(format!("{flag} expects a value")))
}

fn usage_number(flag: &str, value: &str) -> MlfmtError {
    MlfmtError::Usage(format!("{flag} expects a number, got \"{value}\""))
}

fn confirm_overwrite(path: &std::path::Path) -> Result<bool, MlfmtError> {
    eprint!("overwrite {}? [y/N] ", path.display());
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

fn print_help() {
    println!("mlfmt {MLFMT_VERSION} - a source formatter for Standard ML");
    println!();
    println!("Usage: mlfmt [options] <files>");
    println!();
    println!("  <files>                   .sml, .sig, .fun sources or .mlb manifests");
    println!();
    println!("Options:");
    println!("  --force                   overwrite files without confirmation");
    println!("  --preview                 also write formatted output to stdout");
    println!("  --preview-only            write only to stdout, never to disk");
    println!("  -mlb-path-var \"<N> <V>\"   substitute $(N) with V in manifests (repeatable)");
    println!("  -ribbon-frac <real>       ribbon fraction in (0, 1] (default 1.0)");
    println!("  -max-width <int>          page width (default 80)");
    println!("  -indent-width <int>       indentation step (default 2)");
    println!("  -tab-width <int>          width of tab characters when measuring (default 4)");
    println!("  -h, --help                print this help");
    println!("  -V, --version             print the version");
}
