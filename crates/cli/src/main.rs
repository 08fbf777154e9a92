//! `sapling` command-line driver.
//!
//! The compiler core consumes a ready-made AST, so both subcommands take a
//! serde-serialized module as JSON. `build` compiles and writes a datapack
//! directory, `check` compiles and reports without touching the disk.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use sapling_core::{compile, Config, Module};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Sapling datapack compiler.
#[derive(Parser)]
#[command(name = "sapling", version, about = "Sapling datapack compiler")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a module AST and write the datapack
    Build {
        /// Path to the module AST as JSON
        file: PathBuf,
        /// Project configuration file (defaults to sapling.toml if present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the pack here instead of <output_directory>/<project>
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Compile a module AST without writing anything
    Check {
        /// Path to the module AST as JSON
        file: PathBuf,
        /// Project configuration file (defaults to sapling.toml if present)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { file, config, out } => {
            cmd_build(&file, config.as_deref(), out, cli.output, cli.quiet);
        }
        Commands::Check { file, config } => {
            cmd_check(&file, config.as_deref(), cli.output, cli.quiet);
        }
    }
}

fn cmd_build(
    file: &Path,
    config_path: Option<&Path>,
    out: Option<PathBuf>,
    output: OutputFormat,
    quiet: bool,
) {
    let config = load_config(config_path, output, quiet);
    let module = load_module(file, output, quiet);

    let pack = match compile(config.clone(), &module) {
        Ok(pack) => pack,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };

    let root = out.unwrap_or_else(|| sapling_codegen::pack_root(&config));
    let files = match sapling_codegen::layout(&pack, &config) {
        Ok(files) => files,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };
    if let Err(e) = sapling_codegen::write_to(&root, &files) {
        report_error(&e.to_string(), output, quiet);
        process::exit(1);
    }

    match output {
        OutputFormat::Json => {
            let summary = serde_json::json!({
                "pack": root.display().to_string(),
                "files": files.len(),
            });
            println!("{}", summary);
        }
        OutputFormat::Text => {
            if !quiet {
                println!("wrote {} files to {}", files.len(), root.display());
            }
        }
    }
}

fn cmd_check(file: &Path, config_path: Option<&Path>, output: OutputFormat, quiet: bool) {
    let config = load_config(config_path, output, quiet);
    let module = load_module(file, output, quiet);

    match compile(config, &module) {
        Ok(pack) => match output {
            OutputFormat::Json => {
                let summary = serde_json::json!({
                    "project": pack.project,
                    "units": pack.units.len(),
                });
                println!("{}", summary);
            }
            OutputFormat::Text => {
                if !quiet {
                    println!("ok: {} code units", pack.units.len());
                }
            }
        },
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    }
}

/// Read the project config, falling back to `sapling.toml` in the current
/// directory and then to defaults. An explicitly named file must exist.
fn load_config(path: Option<&Path>, output: OutputFormat, quiet: bool) -> Config {
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from("sapling.toml"), false),
    };
    let text = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(_) if !required => return Config::default(),
        Err(e) => {
            let msg = format!("error reading config '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match toml::from_str(&text) {
        Ok(config) => config,
        Err(e) => {
            let msg = format!("error parsing config '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

fn load_module(path: &Path, output: OutputFormat, quiet: bool) -> Module {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading file '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    match serde_json::from_str(&text) {
        Ok(module) => module,
        Err(e) => {
            let msg = format!("error parsing JSON in '{}': {}", path.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{{\"error\": \"{}\"}}", msg.replace('"', "\\\""));
        }
    }
}
