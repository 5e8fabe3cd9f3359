//! Kiln CLI - Command line interface
//!
//! ```text
//! kiln demo                      # build, write, load and run com.lee.demo.Foo
//! kiln inspect com.lee.demo.Foo  # print a module summary
//! kiln run com.lee.demo.Foo test --ctor-arg 24 --ctor-arg sample
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;
use tracing::info;

mod config;
mod logging;
mod platform;

use crate::config::Overrides;
use crate::platform::{format_value, print_error, ErrorFormat};
use kiln_api::{parse_args, sample_descriptor, Engine, KilnError, SAMPLE_TYPE};
use kiln_config::LogFormat;

#[derive(Parser)]
#[command(
    name = "kiln",
    about = "Kiln - synthesize, load and invoke types at runtime",
    version = "0.1.0"
)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Module directory (overrides the config file)
    #[arg(long, global = true, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log output format
    #[arg(long, global = true, value_enum)]
    log_format: Option<CliLogFormat>,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Error output format
    #[arg(long, global = true, value_enum, default_value_t = ErrorFormat::Human)]
    error_format: ErrorFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the sample type, write it, then run `new Foo(24, "sample").test()`
    Demo,
    /// Print the header, sections and members of a written module
    Inspect {
        /// Fully-qualified type name
        name: String,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load a module, construct an instance and invoke one method
    Run {
        /// Fully-qualified type name
        name: String,
        /// Method to invoke
        method: String,
        /// Method arguments
        args: Vec<String>,
        /// Constructor argument (repeat for each one)
        #[arg(long = "ctor-arg", value_name = "VALUE", allow_hyphen_values = true)]
        ctor_args: Vec<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliLogFormat {
    Pretty,
    Compact,
    Json,
}

impl From<CliLogFormat> for LogFormat {
    fn from(format: CliLogFormat) -> Self {
        match format {
            CliLogFormat::Pretty => LogFormat::Pretty,
            CliLogFormat::Compact => LogFormat::Compact,
            CliLogFormat::Json => LogFormat::Json,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let overrides = Overrides {
        module_dir: cli.dir.clone(),
        verbose: cli.verbose,
        quiet: cli.quiet,
        log_format: cli.log_format.map(LogFormat::from),
        log_file: cli.log_file.clone(),
    };
    let engine_config = match config::resolve(cli.config.as_deref(), &overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    if let Err(e) = logging::init(&engine_config.log) {
        eprintln!("Error: {}", e);
        process::exit(2);
    }

    // Initialize API config (global singleton for convenience)
    if let Err(e) = kiln_api::config::init(engine_config) {
        print_error(&e, cli.error_format);
        process::exit(2);
    }

    let engine = Engine::from_global();
    let result = match cli.command {
        Command::Demo => handle_demo(&engine),
        Command::Inspect { name, json } => handle_inspect(&engine, &name, json),
        Command::Run {
            name,
            method,
            args,
            ctor_args,
        } => handle_run(&engine, &name, &method, &args, &ctor_args),
    };

    if let Err(e) = result {
        print_error(&e, cli.error_format);
        process::exit(1);
    }
}

fn handle_demo(engine: &Engine) -> Result<(), KilnError> {
    let path = engine.publish(sample_descriptor()?)?;
    info!(target: "kiln::cli", path = %path.display(), "sample module written");

    let ctor_args = parse_args(&["24", "sample"]);
    let value = engine.run(SAMPLE_TYPE, &ctor_args, "test", &[])?;
    if let Some(text) = format_value(&value) {
        println!("{}", text);
    }
    Ok(())
}

fn handle_inspect(engine: &Engine, name: &str, json: bool) -> Result<(), KilnError> {
    let info = engine.inspect(name)?;
    if json {
        let output = platform::module_info_json(&info);
        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => return Err(KilnError::Config(e.to_string())),
        }
    } else {
        println!("{}", info);
    }
    Ok(())
}

fn handle_run(
    engine: &Engine,
    name: &str,
    method: &str,
    args: &[String],
    ctor_args: &[String],
) -> Result<(), KilnError> {
    let value = engine.run(name, &parse_args(ctor_args), method, &parse_args(args))?;
    if let Some(text) = format_value(&value) {
        println!("{}", text);
    }
    Ok(())
}
