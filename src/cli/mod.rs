//! CLI command implementations for the Aura assistant.
//!
//! Provides subcommand handlers for:
//! - `aura chat` for the interactive conversation
//! - `aura send` / `aura quick` for single turns
//! - `aura history` / `aura clear` to inspect or reset the chat log
//! - `aura stats` for turn analytics from the event log
//! - `aura forecast` for the 24-hour carbon forecast summary
//! - `aura health` to check config, optimizer, history, speech input
//! - `aura config show|init|set|reset` for configuration management

use std::io::{self, BufRead, Write};
use std::sync::LazyLock;

use anyhow::Result;
use chrono::Datelike;
use colored::Colorize;
use regex::Regex;

use crate::analytics::EventLog;
use crate::analytics::reporter::{self, Stats};
use crate::assistant::{Assistant, TurnResult};
use crate::capability::SpeechCapability;
use crate::chat::{ChatMessage, HistoryFile, MessageStore, Role};
use crate::config::{self, AuraConfig};
use crate::optimizer::OptimizerClient;
use crate::optimizer::demand::{DemandSummary, GreenWindow};
use crate::optimizer::forecast::ForecastSummary;

/// `**bold**` spans in bot text.
static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());

/// Output format for reporting commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// Message rendering
// ---------------------------------------------------------------------------

/// Replace `**x**` markers with terminal bold.
fn render_markdown(text: &str) -> String {
    BOLD_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            caps[1].bold().to_string()
        })
        .into_owned()
}

fn print_message(message: &ChatMessage) {
    let time = message
        .timestamp
        .with_timezone(&chrono::Local)
        .format("%H:%M");

    match message.role {
        Role::User => {
            println!("{} {}", format!("[{time}] you").blue().bold(), message.text);
        }
        Role::Bot => {
            println!("{}", format!("[{time}] aura").green().bold());
            for line in render_markdown(&message.text).lines() {
                println!("  {line}");
            }
        }
    }

    if !message.quick_replies.is_empty() {
        let options: Vec<String> = message
            .quick_replies
            .iter()
            .enumerate()
            .map(|(i, label)| format!("[{}] {}", i + 1, label))
            .collect();
        println!("  {}", options.join("  ").cyan());
    }
    println!();
}

fn print_turn(turn: &TurnResult) {
    print_message(&turn.bot);
    if let Some(outcome) = &turn.outcome
        && let Some(reason) = outcome.source.simulated_reason()
    {
        println!("  {}", format!("(optimizer unavailable: {reason})").dimmed());
        println!();
    }
}

// ---------------------------------------------------------------------------
// aura chat
// ---------------------------------------------------------------------------

/// Parsed REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChatInput {
    Message(String),
    Quick(usize),
    Clear,
    Voice,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

fn parse_chat_input(line: &str) -> ChatInput {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ChatInput::Message(line.to_string());
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("quit" | "exit" | "q"), _) => ChatInput::Quit,
        (Some("clear"), _) => ChatInput::Clear,
        (Some("voice"), _) => ChatInput::Voice,
        (Some("help"), _) => ChatInput::Help,
        (Some("quick"), Some(n)) => match n.parse::<usize>() {
            Ok(n) if n > 0 => ChatInput::Quick(n),
            _ => ChatInput::Unknown(line.to_string()),
        },
        _ => ChatInput::Unknown(line.to_string()),
    }
}

fn print_chat_help(speech: &SpeechCapability) {
    println!("{}", "Commands".bold().cyan());
    println!("  /quick <n>   pick quick reply n from the last bot message");
    println!("  /clear       start over");
    match speech {
        SpeechCapability::Available { .. } => println!("  /voice       speak your request"),
        SpeechCapability::Unavailable { reason } => println!(
            "  {}",
            format!("/voice       unavailable ({reason})").dimmed()
        ),
    }
    println!("  /quit        leave the chat");
    println!();
}

/// Interactive chat loop.
pub fn run_chat(config: AuraConfig) -> Result<()> {
    let speech = SpeechCapability::detect(&config.input);
    let mut assistant = Assistant::from_config(config);

    println!("{}", "Aura Energy Assistant".bold().cyan());
    println!("{}", "=".repeat(40));
    println!("{}", "Type a message, /help for commands.".dimmed());
    println!();

    for message in assistant.messages() {
        print_message(message);
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{} ", ">".bold());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        match parse_chat_input(&line) {
            ChatInput::Empty => {}
            ChatInput::Quit => break,
            ChatInput::Help => print_chat_help(&speech),
            ChatInput::Clear => {
                assistant.clear();
                for message in assistant.messages() {
                    print_message(message);
                }
            }
            ChatInput::Message(text) => {
                if let Some(turn) = assistant.send(&text) {
                    print_turn(&turn);
                }
            }
            ChatInput::Quick(n) => {
                let label = assistant
                    .messages()
                    .iter()
                    .rev()
                    .find(|m| m.is_bot())
                    .and_then(|m| m.quick_replies.get(n - 1))
                    .cloned();
                match label {
                    Some(label) => {
                        println!("{} {}", "you:".blue().bold(), label);
                        if let Some(turn) = assistant.quick_reply(&label) {
                            print_turn(&turn);
                        }
                    }
                    None => println!("{}", format!("No quick reply #{n}.").yellow()),
                }
            }
            ChatInput::Voice => {
                if let SpeechCapability::Unavailable { reason } = &speech {
                    println!("{}", format!("Speech input unavailable: {reason}").yellow());
                    continue;
                }
                println!("{}", "Listening...".dimmed());
                match speech.capture() {
                    Ok(transcript) => {
                        println!("{} {}", "you (voice):".blue().bold(), transcript);
                        if let Some(turn) = assistant.send(&transcript) {
                            print_turn(&turn);
                        }
                    }
                    Err(e) => {
                        eprintln!("{} {e:#}", "speech error:".red());
                        let bot = assistant.report_speech_failure(&e);
                        print_message(&bot);
                    }
                }
            }
            ChatInput::Unknown(input) => {
                println!("{}", format!("Unknown command: {input}").yellow());
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// aura send | quick
// ---------------------------------------------------------------------------

/// Run one turn and print the reply.
pub fn run_send(config: AuraConfig, text: &str, json: bool) -> Result<()> {
    let mut assistant = Assistant::from_config(config);
    let turn = assistant.send(text);
    print_single_turn(turn.as_ref(), json)
}

/// Run one quick-reply turn and print the reply.
pub fn run_quick(config: AuraConfig, label: &str, json: bool) -> Result<()> {
    let mut assistant = Assistant::from_config(config);
    let turn = assistant.quick_reply(label);
    print_single_turn(turn.as_ref(), json)
}

fn print_single_turn(turn: Option<&TurnResult>, json: bool) -> Result<()> {
    let Some(turn) = turn else {
        println!("{}", "Nothing to send.".yellow());
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(turn)?);
    } else {
        print_turn(turn);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// aura history | clear
// ---------------------------------------------------------------------------

/// Show the stored chat log.
pub fn run_history(config: &AuraConfig, format: OutputFormat, limit: Option<usize>) -> Result<()> {
    let store = HistoryFile::from_config(&config.chat)
        .map(|h| h.load().into_store())
        .unwrap_or_else(MessageStore::new);

    let messages = store.messages();
    let skip = limit.map_or(0, |n| messages.len().saturating_sub(n));
    let shown = &messages[skip..];

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(shown)?),
        OutputFormat::Csv => {
            println!("id,role,timestamp,text");
            for m in shown {
                println!(
                    "{},{},{},\"{}\"",
                    m.id,
                    m.role,
                    m.timestamp.to_rfc3339(),
                    m.text.replace('"', "\"\"").replace('\n', " ")
                );
            }
        }
        OutputFormat::Table => {
            println!("{}", "Chat History".bold().cyan());
            println!("{}", "=".repeat(60));
            println!(
                "  {:<5} {:<4} {:<17} Text",
                "Id", "Role", "Time"
            );
            println!("  {}", "-".repeat(58));
            for (i, m) in shown.iter().enumerate() {
                let first_line = m.text.lines().next().unwrap_or("");
                let line = format!(
                    "  {:<5} {:<4} {:<17} {}",
                    m.id,
                    m.role.to_string(),
                    m.timestamp
                        .with_timezone(&chrono::Local)
                        .format("%Y-%m-%d %H:%M"),
                    truncate(first_line, 50),
                );
                if i % 2 == 0 {
                    println!("{line}");
                } else {
                    println!("{}", line.dimmed());
                }
            }
        }
    }

    Ok(())
}

/// Reset the persisted chat log.
pub fn run_clear(config: AuraConfig) -> Result<()> {
    let mut assistant = Assistant::from_config(config);
    assistant.clear();
    println!("{} Chat history cleared", "✓".green().bold());
    Ok(())
}

// ---------------------------------------------------------------------------
// aura stats
// ---------------------------------------------------------------------------

/// Show turn analytics.
pub fn run_stats(config: &AuraConfig, format: OutputFormat, days: Option<u32>) -> Result<()> {
    let entries = EventLog::from_config(&config.logging).read_since_days(days);
    let stats = reporter::build_stats(&entries);

    if stats.total_turns == 0 {
        println!(
            "{}",
            "No data yet. Chat with `aura chat` to see stats.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Csv => print_stats_csv(&stats),
        OutputFormat::Table => print_stats_table(&stats),
    }

    Ok(())
}

fn print_stats_table(stats: &Stats) {
    println!("{}", "Aura Assistant Report".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();

    println!("  {} {}", "Total turns:    ".bold(), format_number(stats.total_turns));
    println!("  {} {}", "Quick replies:  ".bold(), format_number(stats.quick_reply_turns));
    let dist = &stats.source_distribution;
    println!(
        "  {} {} ({} optimizer, {} simulated, {:.0}% simulated)",
        "Schedules:      ".bold(),
        dist.total(),
        dist.optimizer,
        dist.simulated,
        dist.simulated_pct()
    );
    if let Some(ms) = stats.avg_latency_ms {
        println!("  {} {:.0} ms", "Avg latency:    ".bold(), ms);
    }
    println!();

    println!("{}", "Intents".bold().cyan());
    for intent in &stats.intent_distribution {
        println!(
            "  {:<18} {:>6} {:>6.1}%",
            intent.intent.to_string(),
            intent.count,
            intent.pct(stats.total_turns)
        );
    }
    println!();

    if !stats.appliance_counts.is_empty() {
        println!("{}", "Appliances".bold().cyan());
        for (i, a) in stats.appliance_counts.iter().enumerate() {
            let line = format!("  {:<18} {:>6}", a.appliance, a.count);
            if i % 2 == 0 {
                println!("{line}");
            } else {
                println!("{}", line.dimmed());
            }
        }
        println!();
    }

    let failures = stats.history_load_failures + stats.history_save_failures + stats.speech_failures;
    if failures > 0 {
        println!(
            "  {}",
            format!(
                "{} history load failure(s), {} save failure(s), {} speech failure(s)",
                stats.history_load_failures, stats.history_save_failures, stats.speech_failures
            )
            .yellow()
        );
    }
}

fn print_stats_csv(stats: &Stats) {
    println!("kind,name,count");
    for intent in &stats.intent_distribution {
        println!("intent,{},{}", intent.intent, intent.count);
    }
    for a in &stats.appliance_counts {
        println!("appliance,{},{}", a.appliance, a.count);
    }
    println!("source,optimizer,{}", stats.source_distribution.optimizer);
    println!("source,simulated,{}", stats.source_distribution.simulated);
}

// ---------------------------------------------------------------------------
// aura forecast
// ---------------------------------------------------------------------------

/// Fetch and summarise the 24-hour carbon forecast.
pub fn run_forecast(config: &AuraConfig, format: OutputFormat) -> Result<()> {
    let client = OptimizerClient::from_config(&config.optimizer);
    let mut forecast = client.forecast_24h()?;

    // Older payloads omit the threshold; fall back to this month's baseline.
    if forecast.baseline().is_none()
        && let Ok(seasonal) = client.seasonal_baseline()
    {
        forecast.baseline_threshold = seasonal.for_month(chrono::Local::now().month());
    }

    let Some(summary) = forecast.summarize() else {
        println!("{}", "The forecast contains no hourly data.".yellow());
        return Ok(());
    };

    match format {
        OutputFormat::Json | OutputFormat::Csv => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Table => print_forecast_table(&summary),
    }
    Ok(())
}

fn print_forecast_table(summary: &ForecastSummary) {
    println!("{}", "24-Hour Carbon Forecast".bold().cyan());
    println!("{}", "=".repeat(50));
    println!("  {} {}", "Hours:        ".bold(), summary.total_hours);
    println!(
        "  {} {}",
        "Green hours:  ".bold(),
        summary.green_hours.to_string().green()
    );
    println!(
        "  {} {}",
        "Dirty hours:  ".bold(),
        summary.dirty_hours.to_string().red()
    );
    if summary.unclassified_hours > 0 {
        println!("  {} {}", "Unclassified: ".bold(), summary.unclassified_hours);
    }
    println!(
        "  {} {:.2} gCO₂/kWh (min {:.2}, max {:.2})",
        "Intensity:    ".bold(),
        summary.avg_carbon_intensity,
        summary.min_carbon_intensity,
        summary.max_carbon_intensity
    );
    if let Some(baseline) = summary.baseline_threshold {
        println!("  {} {:.1}", "Baseline:     ".bold(), baseline);
    }
    match &summary.best_green_run {
        Some(run) => println!(
            "  {} {} to {} ({} h, avg {:.2})",
            "Best window:  ".bold(),
            run.start,
            run.end,
            run.hours,
            run.avg_carbon_intensity
        ),
        None => println!("  {}", "No green window in the forecast.".yellow()),
    }
}

// ---------------------------------------------------------------------------
// aura demand / aura green-window
// ---------------------------------------------------------------------------

/// Summarise the 24-hour demand forecast.
pub fn run_demand(config: &AuraConfig, format: OutputFormat) -> Result<()> {
    let client = OptimizerClient::from_config(&config.optimizer);
    let forecast = client.predict_demand()?;

    let Some(summary) = forecast.summarize() else {
        println!("{}", "The demand forecast contains no hourly data.".yellow());
        return Ok(());
    };

    match format {
        OutputFormat::Json | OutputFormat::Csv => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Table => print_demand_table(&summary),
    }
    Ok(())
}

fn print_demand_table(summary: &DemandSummary) {
    println!("{}", "24-Hour Demand Forecast".bold().cyan());
    println!("{}", "=".repeat(50));
    println!("  {} {}", "Hours:        ".bold(), summary.total_hours);
    println!("  {} {:.2} MW", "Avg demand:   ".bold(), summary.avg_demand_mw);
    println!(
        "  {} {:.2} MW at {}",
        "Peak demand:  ".bold(),
        summary.peak_demand_mw,
        summary.peak_timestamp
    );
    if let Some(share) = summary.avg_renewable_share_pct {
        println!("  {} {:.1}%", "Renewables:   ".bold(), share);
    }
    println!(
        "  {} {:.2} gCO₂/kWh",
        "Intensity:    ".bold(),
        summary.avg_carbon_intensity
    );
    println!(
        "  {} {} green / {} dirty",
        "Windows:      ".bold(),
        summary.green_hours.to_string().green(),
        summary.dirty_hours.to_string().red()
    );
}

/// Ask the API to recompute the best green window.
pub fn run_green_window(config: &AuraConfig, format: OutputFormat) -> Result<()> {
    let client = OptimizerClient::from_config(&config.optimizer);
    let computation = client.compute_green_window()?;

    match format {
        OutputFormat::Json | OutputFormat::Csv => {
            println!("{}", serde_json::to_string_pretty(&computation)?);
        }
        OutputFormat::Table => print_green_window(&computation.green_window),
    }
    Ok(())
}

fn print_green_window(window: &GreenWindow) {
    println!("{}", "Best Green Window".bold().green());
    println!("{}", "=".repeat(50));
    println!(
        "  {} {} to {} ({} h)",
        "Window:       ".bold(),
        window.start_time,
        window.end_time,
        window.duration_hours
    );
    println!(
        "  {} {:.2} gCO₂/kWh",
        "Intensity:    ".bold(),
        window.average_carbon_intensity
    );
    if let Some(margin) = window.margin_below_baseline() {
        println!(
            "  {} {:.1} ({:.2} below)",
            "Baseline:     ".bold(),
            window.baseline_threshold,
            margin
        );
    }
    for hour in &window.hourly_data {
        println!(
            "    {}  {:>8.1} MW  {:>7.2} gCO₂/kWh",
            hour.timestamp.dimmed(),
            hour.demand_mw,
            hour.carbon_intensity_gco2_per_kwh
        );
    }
}

// ---------------------------------------------------------------------------
// aura health
// ---------------------------------------------------------------------------

/// Check configuration, collaborators and local state.
pub fn run_health() -> Result<()> {
    println!("{}", "Aura Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file().is_some_and(|p| p.exists());
    let project_exists = config::project_config_file().is_some_and(|p| p.exists());
    let cfg = config::load();

    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.aura/config.toml found"
        } else {
            "not found (run `aura config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".aura.toml found"
        } else {
            "not found (optional)"
        },
    );
    print_health_item(
        "Assistant",
        cfg.general.enabled,
        if cfg.general.enabled {
            "enabled"
        } else {
            "disabled (general.enabled = false)"
        },
    );

    if cfg.optimizer.enabled {
        let client = OptimizerClient::from_config(&cfg.optimizer);
        match client.banner() {
            Ok(banner) => print_health_item(
                "Optimization API",
                true,
                &format!("{} ({})", client.base_url(), banner.status),
            ),
            Err(e) => print_health_item(
                "Optimization API",
                false,
                &format!(
                    "{} unreachable: {e:#}{}",
                    client.base_url(),
                    if cfg.general.simulate_on_failure {
                        " (schedules will be simulated)"
                    } else {
                        ""
                    }
                ),
            ),
        }
    } else {
        print_health_item("Optimization API", false, "disabled (optimizer.enabled = false)");
    }

    match HistoryFile::from_config(&cfg.chat) {
        Some(history) => match history.read() {
            Ok(Some(messages)) => print_health_item(
                "Chat history",
                true,
                &format!("{} message(s) in {}", messages.len(), history.path().display()),
            ),
            Ok(None) => print_health_item(
                "Chat history",
                true,
                &format!("{} (not created yet)", history.path().display()),
            ),
            Err(e) => print_health_item("Chat history", false, &format!("{e:#}")),
        },
        None => print_health_item("Chat history", false, "no home directory"),
    }

    let events = EventLog::from_config(&cfg.logging);
    match events.path() {
        Some(path) => print_health_item("Event log", true, &path.display().to_string()),
        None => print_health_item("Event log", false, "disabled"),
    }

    match SpeechCapability::detect(&cfg.input) {
        SpeechCapability::Available { command } => {
            print_health_item("Speech input", true, &command)
        }
        SpeechCapability::Unavailable { reason } => {
            print_health_item("Speech input", false, &reason)
        }
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// aura config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective Aura Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file().is_some_and(|p| p.exists());
    let project_exists = config::project_config_file().is_some_and(|p| p.exists());
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    if global_exists {
        println!("  {} {}", "✓".green(), "~/.aura/config.toml".dimmed());
    } else {
        println!(
            "  {} {}",
            "·".dimmed(),
            "~/.aura/config.toml (not found)".dimmed()
        );
    }
    if project_exists {
        println!("  {} {}", "✓".green(), ".aura.toml".dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), ".aura.toml (not found)".dimmed());
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "AURA_* environment variables".dimmed()
    );

    Ok(())
}

/// Initialize a default config file at `~/.aura/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to customize Aura.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Format a number with thousands separators.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
