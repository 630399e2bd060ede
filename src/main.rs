use anyhow::Result;
use clap::{Parser, Subcommand};

use aura::assistant::Assistant;
use aura::capability::SpeechCapability;
use aura::cli;
use aura::config;
use aura::web::{self, WebState};

#[derive(Debug, Parser)]
#[command(name = "aura")]
#[command(about = "Schedule appliances into low-carbon energy windows")]
#[command(version)]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Interactive chat session
    Chat,
    /// Send a single message and print the reply
    Send {
        /// Message text
        #[arg(trailing_var_arg = true, required = true)]
        text: Vec<String>,
        /// Print the full turn as JSON
        #[arg(long)]
        json: bool,
    },
    /// Answer with a quick-reply label (e.g. "Schedule laundry")
    Quick {
        label: String,
        /// Print the full turn as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the stored chat history
    History {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Only show the last N messages
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Reset the chat to the welcome message
    Clear,
    /// Show assistant usage statistics
    Stats {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Only include the last N days of data
        #[arg(long)]
        days: Option<u32>,
    },
    /// Summarise the 24-hour carbon-intensity forecast
    Forecast {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Summarise the 24-hour grid demand forecast
    Demand {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Recompute the best green window on the energy API
    GreenWindow {
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Check config, optimization API, history and speech input
    Health,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Serve the chat over a local JSON API
    Web {
        /// Listen address (defaults to `[web] addr`)
        #[arg(long)]
        addr: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default ~/.aura/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `optimizer.api_url http://host:8000`
    Set { key: String, value: String },
    /// Reset ~/.aura/config.toml to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Chat => cli::run_chat(config::load()),
        Commands::Send { text, json } => cli::run_send(config::load(), &text.join(" "), json),
        Commands::Quick { label, json } => cli::run_quick(config::load(), &label, json),
        Commands::History { format, limit } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_history(&config::load(), fmt, limit)
        }
        Commands::Clear => cli::run_clear(config::load()),
        Commands::Stats { format, days } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_stats(&config::load(), fmt, days)
        }
        Commands::Forecast { format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_forecast(&config::load(), fmt)
        }
        Commands::Demand { format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_demand(&config::load(), fmt)
        }
        Commands::GreenWindow { format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_green_window(&config::load(), fmt)
        }
        Commands::Health => cli::run_health(),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
        Commands::Web { addr } => {
            let cfg = config::load();
            let addr = addr.unwrap_or_else(|| cfg.web.addr.clone());
            let speech = SpeechCapability::detect(&cfg.input);
            let state = WebState {
                assistant: Assistant::from_config(cfg),
                speech,
            };
            web::serve(&addr, state)
        }
    }
}
