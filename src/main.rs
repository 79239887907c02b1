use anyhow::Result;
use arbor::cli::{Cli, Commands};
use arbor::commands::walk::WalkOptions;
use arbor::output::{self, Verbosity};
use arbor::{ArborContext, commands};
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "ARBOR_LOG";

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    output::set_verbosity(if cli.quiet {
        Verbosity::Quiet
    } else if cli.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    });

    match cli.command {
        Commands::Walk {
            root,
            local,
            ext,
            dirs_only,
        } => {
            let ctx = ArborContext::new()?;
            let options = WalkOptions {
                local,
                ext,
                dirs_only,
            };
            commands::walk::execute(&ctx, &root, &options)?;
        }
        Commands::Scaffold { root, spec } => {
            let ctx = ArborContext::new()?;
            commands::scaffold::execute(&ctx, &root, &spec)?;
        }
        Commands::Status { paths } => {
            commands::status::execute(&paths);
        }
        Commands::Render {
            src,
            dest,
            tokens,
            literal,
        } => {
            let ctx = ArborContext::new()?;
            commands::render::execute(&ctx, &src, &dest, tokens, literal)?;
        }
        Commands::Config { key, value, list } => {
            let mut ctx = ArborContext::new()?;
            commands::config::execute(&mut ctx, key.as_deref(), value.as_deref(), list)?;
        }
        Commands::Completion { shell } => {
            print_completions(shell, &mut Cli::command());
        }
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("arbor=debug,warn")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
