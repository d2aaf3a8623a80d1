//! Command-line interface for injinja
//!
//! Parses flags, layers them over project defaults and hands the result to the
//! pipeline.

use anyhow::{Context, Result};
use clap::Parser;
use injinja::config::{load_settings, Settings};
use injinja::{Error, Format, Invocation, OutputTarget};
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit code when the rendered output differs from the `--validate` file.
pub const EXIT_DIFF: u8 = 3;

/// Injectable Jinja configuration: render templates from layered config files
/// and environment variables.
#[derive(Parser, Debug)]
#[command(name = "injinja")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Environment variable for config templating: KEY=VALUE or a path to an .env file (repeatable)
    #[arg(short, long, value_name = "KEY=VALUE|FILE")]
    env: Vec<String>,

    /// Import OS environment variables starting with this prefix, e.g. MYAPP_ (repeatable)
    #[arg(short, long, value_name = "PREFIX")]
    prefix: Vec<String>,

    /// Config file or glob pattern; later files win on conflicting keys (repeatable)
    #[arg(short, long, value_name = "FILE|GLOB")]
    config: Vec<String>,

    /// Template to render with the merged configuration
    #[arg(short, long, value_name = "FILE")]
    template: Option<PathBuf>,

    /// Rhai file or glob defining test_* and filter_* functions (repeatable)
    #[arg(short, long, value_name = "FILE|GLOB")]
    functions: Vec<String>,

    /// stdout, config-json, config-yaml/config-yml, or a file path [default: stdout]
    #[arg(short, long, value_name = "TARGET")]
    output: Option<String>,

    /// Expected output file to diff the rendered template against
    #[arg(short, long, value_name = "FILE")]
    validate: Option<PathBuf>,

    /// Schema: path to a JSON Schema (.json) or MODELS_FILE::ModelName
    #[arg(short, long, value_name = "SPEC")]
    schema: Option<String>,

    /// Read config of this format from stdin as the highest-precedence source
    #[arg(long, value_name = "FORMAT", value_parser = ["json", "yaml", "yml", "toml"])]
    stdin_format: Option<String>,

    /// Defaults file (otherwise injinja.toml / injinja.yml in the working directory)
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --debug falls back to DEBUG.
    let filter = if cli.debug {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    let settings = load_settings(&cwd, cli.settings.as_deref())?;
    let invocation = build_invocation(cli, settings)?;
    debug!(?invocation, "invocation");

    let stdin = read_stdin(invocation.stdin_format)?;
    let outcome = injinja::run(&invocation, stdin.as_deref())?;

    if let Some(diff) = outcome.diff {
        warn!("Rendered output differs from the expected file");
        eprintln!("{diff}");
        return Ok(ExitCode::from(EXIT_DIFF));
    }
    Ok(ExitCode::SUCCESS)
}

/// Layer CLI flags over settings: lists are appended after the settings' lists,
/// scalars replace them.
fn build_invocation(cli: Cli, settings: Settings) -> Result<Invocation> {
    let stdin_format = match cli.stdin_format.or(settings.stdin_format) {
        Some(name) => Some(Format::from_name(&name).ok_or(Error::UnsupportedStdinFormat(name))?),
        None => None,
    };
    let output = cli.output.or(settings.output).unwrap_or_else(|| "stdout".to_string());

    Ok(Invocation {
        env: [settings.env, cli.env].concat(),
        prefix: [settings.prefix, cli.prefix].concat(),
        config: [settings.config, cli.config].concat(),
        template: cli.template.or(settings.template),
        functions: [settings.functions, cli.functions].concat(),
        output: OutputTarget::parse(&output),
        validate: cli.validate,
        schema: cli.schema.or(settings.schema),
        stdin_format,
    })
}

fn read_stdin(format: Option<Format>) -> Result<Option<String>> {
    let Some(format) = format else {
        return Ok(None);
    };

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        warn!("--stdin-format '{}' provided, but no data piped to stdin", format);
        return Ok(None);
    }

    let mut content = String::new();
    stdin.lock().read_to_string(&mut content).context("Failed reading stdin")?;
    Ok(Some(content))
}
