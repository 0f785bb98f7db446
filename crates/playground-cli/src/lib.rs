pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use playground_config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "playground",
    about = "Banking playground request configurator",
    long_about = "Check request drafts, list payment rails, look up sandbox banks and inspect configuration.",
    after_help = "Examples:\n  playground check --draft '{\"requestType\":\"singlePayment\"}'\n  playground rails --currency GBP\n  playground banks --tester-id Token --country DE\n  playground config"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a TOML config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the playground server URL")]
    app_url: Option<String>,
    #[arg(long, global = true, help = "Override the token API URL")]
    api_url: Option<String>,
    #[arg(long, global = true, help = "Override the log level")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Report whether a draft can be submitted and which inputs it still needs")]
    Check {
        #[arg(long, help = "Draft as JSON, or @path to read it from a file")]
        draft: String,
        #[arg(long, help = "Selected bank as JSON, or @path")]
        bank: Option<String>,
        #[arg(long, help = "Treat the beneficiary IBAN as already validated")]
        iban_valid: bool,
        #[arg(long, help = "Sandbox environment name, e.g. dev")]
        token_env: Option<String>,
    },
    #[command(about = "List payment rails per currency")]
    Rails {
        #[arg(long)]
        currency: Option<String>,
    },
    #[command(about = "Look up sandbox banks for a tester and country")]
    Banks {
        #[arg(long)]
        tester_id: String,
        #[arg(long)]
        country: String,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, help = "Developer key sent to the directory")]
        dev_key: Option<String>,
    },
    #[command(about = "Print the effective configuration")]
    Config,
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                app_url: self.app_url.clone(),
                api_url: self.api_url.clone(),
                crowd_source: None,
                log_level: self.log_level.clone(),
            },
        }
    }
}

/// Filter for the configured `logging.level`. Unparseable values fall back to `info`.
pub fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init_logging(config: &AppConfig) {
    use LogFormat::*;

    // RUST_LOG wins over logging.level.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // try_init: a second call in the same process keeps the first subscriber.
    let _ = match config.logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.load_options()) {
        Ok(config) => config,
        Err(error) => {
            let result = commands::CommandResult::failure("config", "config_validation", error.to_string(), 2);
            println!("{}", result.output);
            return ExitCode::from(result.exit_code);
        }
    };
    init_logging(&config);

    let result = match cli.command {
        Command::Check { draft, bank, iban_valid, token_env } => {
            commands::check::run(&config, &draft, bank.as_deref(), iban_valid, token_env.as_deref())
        }
        Command::Rails { currency } => commands::rails::run(&config, currency.as_deref()),
        Command::Banks { tester_id, country, search, dev_key } => {
            commands::banks::run(&config, &tester_id, &country, search.as_deref(), dev_key.as_deref()).await
        }
        Command::Config => commands::config::run(&config),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
