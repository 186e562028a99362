use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

use lcat::catalog::Toolkit;
use lcat::commands::{self, ENTRIES};
use lcat::config::Config;
use lcat::display::render_result;
use lcat::i18n::I18n;
use lcat::repl::Shell;

#[derive(Parser)]
#[command(name = "lcat")]
#[command(about = "Run common Linux utilities through typed wrappers and keep a history of every attempt")]
struct Cli {
    /// Per-command timeout in seconds [default: 30, or exec.timeout_secs]
    #[arg(long, global = true)]
    timeout: Option<u64>,
    /// Message language (en, zh, auto)
    #[arg(long, global = true)]
    lang: Option<String>,
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive shell (default)
    Shell,
    /// Run one command, print its result and exit with its return code
    Run {
        /// Print the result record as JSON
        #[arg(long)]
        json: bool,
        /// Command name, e.g. ls or mkdir
        entry: String,
        /// Arguments for the command, parsed with its own schema
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// List available commands and their usage
    List,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::new()?;
    if let Some(secs) = cli.timeout {
        config.exec.timeout_secs = secs;
    }
    if let Some(lang) = cli.lang {
        config.display.language = lang;
    }
    if cli.no_color || !config.display.color {
        colored::control::set_override(false);
    }

    let i18n = I18n::new(&config.get_effective_language());
    let toolkit = Toolkit::new(config.timeout())?;

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => {
            // The shell survives Ctrl-C; the running child (same process group) does not.
            ctrlc::set_handler(|| {}).context("Failed to install Ctrl-C handler")?;
            let shell = Shell::new(
                &toolkit,
                &i18n,
                &config.display.prompt,
                config.display.max_history_shown,
            );
            shell.run(io::stdin().lock(), &mut io::stdout().lock())?;
        }
        Commands::Run { json, entry, args } => {
            let code = run_once(&toolkit, &i18n, &entry, &args, json)?;
            io::stdout().flush().context(i18n.t("error_write_output"))?;
            std::process::exit(code);
        }
        Commands::List => {
            println!("{}\n", i18n.t("help_about"));
            println!("{}", i18n.t("help_title").bold());
            for entry in ENTRIES {
                println!("  {:<8} {}", entry.name.green(), i18n.t(&entry.about_key()));
                println!("           {}", entry.usage().dimmed());
            }
        }
    }

    Ok(())
}

/// Exit code: the command's own return code, 1 if it never produced one,
/// 2 for unknown commands and rejected arguments.
fn run_once(toolkit: &Toolkit, i18n: &I18n, name: &str, args: &[String], json: bool) -> Result<i32> {
    let Some(entry) = commands::lookup(name) else {
        eprintln!("{}", i18n.t_format("shell_unknown", &[name]).red());
        return Ok(2);
    };

    let result = match entry.invoke(toolkit, args) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("{}", err.to_string().red());
            return Ok(2);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result).context(i18n.t("error_write_output"))?);
    } else {
        print!("{}", render_result(&result, i18n));
    }
    Ok(result.return_code.unwrap_or(1))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LCAT_LOG").unwrap_or_else(|_| EnvFilter::new("error"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
