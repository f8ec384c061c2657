//! Command-line interface for fortune
//! Compiles templates and shows the intermediate stages of the pipeline.
//!
//! Usage:
//!   fortune process `<path>` [`<format>`]   - Process a file and print the result
//!   fortune `<path>` [`<format>`]           - Same as process (default command)
//!   fortune formats                       - List all available formats
//!   fortune directives                    - List registered directives
//!
//! Global options:
//!   --config `<file>`    layer a TOML file over the built-in defaults
//!   --escape `<ctx>`     escape context for `{{ }}` tags (html, attribute, url, js)
//!
//! Set `FORTUNE_LOG` (e.g. `FORTUNE_LOG=fortune=debug`) for diagnostics on stderr.

use clap::{Arg, ArgMatches, Command};
use fortune::fortune::compiler::Compiler;
use fortune::fortune::config::{FortuneConfig, Loader};
use fortune::fortune::processor::{available_formats, process_file_with, ProcessingSpec};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    init_logging();

    let matches = build_cli()
        .try_get_matches()
        .unwrap_or_else(|e| e.exit());

    let config = load_config(&matches).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    match matches.subcommand() {
        Some(("process", process_matches)) => handle_process_command(process_matches, &config),
        Some(("formats", _)) => handle_formats_command(),
        Some(("directives", _)) => handle_directives_command(&config),
        None => handle_process_command(&matches, &config),
        _ => unreachable!(),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("FORTUNE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn path_and_format_args(command: Command, required: bool) -> Command {
    command
        .arg(
            Arg::new("path")
                .help("Path to the template file to process")
                .required(required)
                .index(1),
        )
        .arg(
            Arg::new("format")
                .help("Output format (e.g., compiled, token-simple, ast-treeviz)")
                .index(2),
        )
}

fn build_cli() -> Command {
    let root = Command::new("fortune")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compile fortune view templates and inspect the pipeline")
        .subcommand_required(false)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .help("TOML file layered over the default configuration"),
        )
        .arg(
            Arg::new("escape")
                .long("escape")
                .global(true)
                .value_parser(["html", "attribute", "url", "js"])
                .help("Escape context for sanitized tags"),
        );

    path_and_format_args(root, false)
        .subcommand(path_and_format_args(
            Command::new("process").about("Process a file and output to stdout (default command)"),
            true,
        ))
        .subcommand(Command::new("formats").about("List all available output formats"))
        .subcommand(Command::new("directives").about("List the directives templates may use"))
}

fn load_config(matches: &ArgMatches) -> Result<FortuneConfig, String> {
    let global = matches
        .subcommand()
        .map(|(_, sub)| sub)
        .unwrap_or(matches);

    let mut loader = Loader::new();
    if let Some(path) = global.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    if let Some(escape) = global.get_one::<String>("escape") {
        loader = loader
            .set_override("compiler.escape", escape.as_str())
            .map_err(|e| e.to_string())?;
    }
    loader.build().map_err(|e| e.to_string())
}

/// Handle the process command
fn handle_process_command(matches: &ArgMatches, config: &FortuneConfig) {
    let Some(path) = matches.get_one::<String>("path") else {
        std::process::exit(1);
    };
    let format_str = matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or(config.output.default_format.as_str());

    let compiler = Compiler::from_config(&config.compiler);
    let result = ProcessingSpec::from_string(format_str)
        .and_then(|spec| process_file_with(path, &spec, &compiler));

    match result {
        Ok(output) => print!("{}", output),
        Err(e) => {
            tracing::debug!(path = %path, format = format_str, "processing failed");
            eprintln!("Error: {}", e);
            eprintln!("\nAvailable formats:");
            for format in available_formats() {
                eprintln!("  {}", format);
            }
            std::process::exit(1);
        }
    }
}

/// Handle the formats command
fn handle_formats_command() {
    println!("Available formats:");
    for format in available_formats() {
        println!("  {}", format);
    }
}

fn handle_directives_command(config: &FortuneConfig) {
    let compiler = Compiler::from_config(&config.compiler);
    let registry = compiler.registry();
    if registry.is_empty() {
        println!("No directives registered");
        return;
    }
    println!("Registered directives:");
    for name in registry.list() {
        println!("  @{}", name);
    }
    println!("\nSanitized tags use {}", config.compiler.escape.function_name());
}
