//! Thin CLI shell over the `sassy` library, per spec.md §6.2. Implements the
//! flags meaningful for a non-watching, non-embedded core; `--watch`,
//! `--update`, and `--embedded` are accepted but refused, since file
//! watching and the embedded protocol are out of scope for this core.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use sassy::logger::DeprecationId;
use sassy::{compile_path, compile_string, OptionsBuilder, OutputStyle, Syntax};

const EXIT_SUCCESS: u8 = 0;
const EXIT_COMPILE_ERROR: u8 = 1;
const EXIT_USAGE_ERROR: u8 = 64;
const EXIT_DATA_ERROR: u8 = 65;

#[derive(Parser, Debug)]
#[clap(name = "sassy", about = "Compile Sass/SCSS to CSS")]
struct Cli {
    /// Input file, or `-` / omitted with `--stdin` to read from standard input.
    input: Option<PathBuf>,

    /// Output file; defaults to standard output.
    output: Option<PathBuf>,

    /// `expanded` or `compressed`.
    #[clap(long, default_value = "expanded")]
    style: String,

    /// A directory to search for `@import`/`@use`/`@forward` targets, in
    /// addition to the input file's own directory. May be repeated.
    #[clap(long = "load-path", value_name = "PATH")]
    load_paths: Vec<PathBuf>,

    /// Read the stylesheet from standard input instead of a file.
    #[clap(long)]
    stdin: bool,

    /// Parse standard input as the indented (Sass) syntax.
    #[clap(long)]
    indented: bool,

    /// Don't generate a source map.
    #[clap(long = "no-source-map")]
    no_source_map: bool,

    #[clap(long = "charset", overrides_with = "no_charset")]
    charset: bool,
    #[clap(long = "no-charset", overrides_with = "charset")]
    no_charset: bool,

    /// Emit a placeholder CSS comment with the error instead of failing,
    /// matching the host-tool convention of the same name. Not yet
    /// implemented; accepted for command-line compatibility.
    #[clap(long = "error-css")]
    error_css: bool,

    /// Suppress `@warn`/`@debug` output.
    #[clap(long)]
    quiet: bool,

    /// Suppress deprecation warnings originating from dependencies.
    #[clap(long)]
    quiet_deps: bool,

    /// Print every deprecation warning, including repeats.
    #[clap(long)]
    verbose: bool,

    #[clap(long = "color", overrides_with = "no_color")]
    color: bool,
    #[clap(long = "no-color", overrides_with = "color")]
    no_color: bool,

    #[clap(long = "unicode", overrides_with = "no_unicode")]
    unicode: bool,
    #[clap(long = "no-unicode", overrides_with = "unicode")]
    no_unicode: bool,

    /// Treat a deprecation as an error. May be repeated.
    #[clap(long = "fatal-deprecation", value_name = "ID")]
    fatal_deprecation: Vec<String>,

    /// Silence a specific deprecation warning. May be repeated.
    #[clap(long = "silence-deprecation", value_name = "ID")]
    silence_deprecation: Vec<String>,

    /// Opt in to a not-yet-default deprecation early. May be repeated.
    #[clap(long = "future-deprecation", value_name = "ID")]
    future_deprecation: Vec<String>,

    /// Recompile on every change. Not supported by this core.
    #[clap(long)]
    watch: bool,

    /// Update only files that changed. Not supported by this core.
    #[clap(long)]
    update: bool,

    /// Speak the embedded compiler wire protocol. Not supported by this core.
    #[clap(long)]
    embedded: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.watch || cli.update || cli.embedded {
        eprintln!("sassy: --watch/--update/--embedded are not supported in this build");
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    let style = match cli.style.as_str() {
        "expanded" => OutputStyle::Expanded,
        "compressed" => OutputStyle::Compressed,
        other => {
            eprintln!("sassy: unknown --style \"{}\" (expected expanded or compressed)", other);
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    let mut deprecation_ids = Vec::new();
    for (flag, list) in [
        ("--fatal-deprecation", &cli.fatal_deprecation),
        ("--silence-deprecation", &cli.silence_deprecation),
        ("--future-deprecation", &cli.future_deprecation),
    ] {
        for name in list {
            match parse_deprecation_id(name) {
                Some(id) => deprecation_ids.push((flag, id)),
                None => {
                    eprintln!("sassy: unknown deprecation id \"{}\" for {}", name, flag);
                    return ExitCode::from(EXIT_USAGE_ERROR);
                }
            }
        }
    }

    let mut builder = OptionsBuilder::new()
        .style(style)
        .source_map(!cli.no_source_map)
        .charset(!cli.no_charset)
        .quiet_deps(cli.quiet_deps)
        .verbose(cli.verbose)
        .alert_color(cli.color && !cli.no_color)
        .alert_ascii(cli.no_unicode);
    for path in &cli.load_paths {
        builder = builder.add_load_path(path.clone());
    }
    for (flag, id) in deprecation_ids {
        builder = match flag {
            "--fatal-deprecation" => builder.fatal_deprecation(id),
            "--silence-deprecation" => builder.silence_deprecation(id),
            _ => builder.future_deprecation(id),
        };
    }
    if cli.quiet {
        builder = builder.logger(std::rc::Rc::new(sassy::SilentLogger));
    }
    let options = builder.build();

    let result = if cli.stdin || cli.input.is_none() {
        let mut source = String::new();
        if let Err(e) = io::stdin().read_to_string(&mut source) {
            eprintln!("sassy: error reading stdin: {}", e);
            return ExitCode::from(EXIT_DATA_ERROR);
        }
        let mut options = options;
        if cli.indented {
            options.syntax = Syntax::Indented;
        }
        compile_string(&source, &options)
    } else {
        let input = cli.input.as_ref().expect("checked above");
        compile_path(input, &options)
    };

    let compiled = match result {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_COMPILE_ERROR);
        }
    };

    let write_result = match &cli.output {
        Some(path) => fs::write(path, &compiled.css),
        None => io::stdout().write_all(compiled.css.as_bytes()),
    };
    if let Err(e) = write_result {
        eprintln!("sassy: error writing output: {}", e);
        return ExitCode::from(EXIT_DATA_ERROR);
    }

    ExitCode::from(EXIT_SUCCESS)
}

fn parse_deprecation_id(name: &str) -> Option<DeprecationId> {
    match name {
        "slash-div" => Some(DeprecationId::SlashDiv),
        "color-functions" => Some(DeprecationId::ColorFunctionLegacy),
        "global-builtin" => Some(DeprecationId::GlobalBuiltin),
        "duplicate-var-flags" => Some(DeprecationId::DuplicateVariableFlags),
        "strict-unary" => Some(DeprecationId::StrictUnary),
        _ => None,
    }
}
