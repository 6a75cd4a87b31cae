//! CLI command implementations.
//!
//! One handler per subcommand:
//! - `domo sensors|housings list` — render a collection table
//! - `domo sensors|housings add` — creation form (flags and/or prompts)
//! - `domo sensors|housings rm` — confirmed delete, then resync
//! - `domo overview` — both collection tables in one run
//! - `domo consumption` / `domo savings` — aggregate charts
//! - `domo health` — config, API reachability, activity log
//! - `domo config show|init|set|reset` — configuration management
//!
//! This module also provides the terminal bindings of the controller
//! abstractions: stdout as the render target, stdin for confirmations and
//! form prompts. Each controller receives exactly the bindings it needs —
//! nothing is shared through module state.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use colored::Colorize;

use crate::api::ApiClient;
use crate::audit::{self, ActivityEntry};
use crate::chart::{self, Metric, SeriesTable};
use crate::config::{self, DomoConfig};
use crate::form::{DraftSource, FormController, SubmitOutcome};
use crate::model::{FieldSpec, Housing, Record, Scale, Sensor};
use crate::table::{
    DeleteOutcome, Interaction, RenderTarget, TableController, TableSnapshot, TableView, row_of,
};

/// Output format for list and chart commands.
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
// Terminal bindings
// ---------------------------------------------------------------------------

/// Renders table snapshots to stdout — the terminal stand-in for the page's
/// table body.
pub struct ConsoleTable;

impl RenderTarget for ConsoleTable {
    fn pending(&mut self) {
        println!("{}", "refreshing…".dimmed());
    }

    fn replace(&mut self, snapshot: &TableSnapshot) {
        print_snapshot(snapshot);
    }
}

/// Stdin/stdout confirmations and notices — the confirm/alert stand-in.
pub struct ConsoleInteraction;

impl Interaction for ConsoleInteraction {
    fn confirm(&mut self, question: &str) -> bool {
        print!("{question} [y/N] ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }

    fn notify(&mut self, message: &str) {
        println!("{message}");
    }
}

/// `--yes` wrapper: confirmations pass, notices still print.
pub struct AssumeYes(pub ConsoleInteraction);

impl Interaction for AssumeYes {
    fn confirm(&mut self, _question: &str) -> bool {
        true
    }

    fn notify(&mut self, message: &str) {
        self.0.notify(message);
    }
}

/// Draft source mixing flag-provided values with interactive prompts: a
/// field given on the command line is used as-is, anything else is asked
/// for on stdin.
pub struct PromptingSource {
    preset: Vec<(&'static str, String)>,
}

impl PromptingSource {
    pub fn new(preset: Vec<(&'static str, Option<String>)>) -> Self {
        Self {
            preset: preset
                .into_iter()
                .filter_map(|(key, value)| value.map(|v| (key, v)))
                .collect(),
        }
    }
}

impl DraftSource for PromptingSource {
    fn value(&mut self, field: &FieldSpec) -> String {
        if let Some((_, value)) = self.preset.iter().find(|(key, _)| *key == field.key) {
            return value.clone();
        }
        print!("{}: ", field.label);
        let _ = io::stdout().flush();
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
        line.trim_end_matches(['\n', '\r']).to_string()
    }
}

// ---------------------------------------------------------------------------
// Collection commands
// ---------------------------------------------------------------------------

/// List one collection.
pub fn run_list<R: Record>(config: &DomoConfig, format: OutputFormat) -> Result<()> {
    let client = ApiClient::from_config(config);

    match format {
        OutputFormat::Table => {
            let mut target = ConsoleTable;
            TableController::<R>::new(&client, &mut target).reload();
            Ok(())
        }
        OutputFormat::Json => {
            let records = client
                .list::<R>()
                .with_context(|| format!("could not load {}", R::NOUN_PLURAL))?;
            println!("{}", serde_json::to_string_pretty(&records)?);
            Ok(())
        }
        OutputFormat::Csv => {
            let records = client
                .list::<R>()
                .with_context(|| format!("could not load {}", R::NOUN_PLURAL))?;
            println!("{}", R::COLUMNS.join(","));
            for record in &records {
                println!("{}", row_of(record).cells.join(","));
            }
            Ok(())
        }
    }
}

/// Add one record: collect the draft, submit, resync the table on success.
pub fn run_add<R: Record>(
    config: &DomoConfig,
    preset: Vec<(&'static str, Option<String>)>,
) -> Result<()> {
    let client = ApiClient::from_config(config);
    let mut target = ConsoleTable;
    let mut table = TableController::<R>::new(&client, &mut target);
    let form = FormController::<R>::new(&client);

    let mut source = PromptingSource::new(preset);
    let mut ui = ConsoleInteraction;
    let outcome = form.submit(&mut source, &mut ui, &mut table);

    if config.audit.enabled {
        audit::record(&add_entry::<R>(&outcome));
    }

    match outcome {
        SubmitOutcome::Created(_) => Ok(()),
        // The user was already notified; just report failure to the shell.
        _ => std::process::exit(1),
    }
}

/// Delete one record by id, after confirmation.
pub fn run_remove<R: Record>(config: &DomoConfig, id: &str, yes: bool) -> Result<()> {
    let client = ApiClient::from_config(config);
    let mut target = ConsoleTable;
    let mut table = TableController::<R>::new(&client, &mut target);

    let outcome = if yes {
        table.delete(id, &mut AssumeYes(ConsoleInteraction))
    } else {
        table.delete(id, &mut ConsoleInteraction)
    };

    if config.audit.enabled {
        audit::record(&delete_entry::<R>(id, outcome));
    }

    match outcome {
        DeleteOutcome::Deleted => Ok(()),
        DeleteOutcome::Declined => {
            println!("{}", "Cancelled.".dimmed());
            Ok(())
        }
        DeleteOutcome::Rejected | DeleteOutcome::Failed => std::process::exit(1),
    }
}

/// Render both collection tables, the way the configuration page shows them
/// side by side.
pub fn run_overview(config: &DomoConfig) -> Result<()> {
    let client = ApiClient::from_config(config);

    println!("{}", "Sensors & actuators".bold().cyan());
    let mut sensors_target = ConsoleTable;
    TableController::<Sensor>::new(&client, &mut sensors_target).reload();

    println!();
    println!("{}", "Housing units".bold().cyan());
    let mut housings_target = ConsoleTable;
    TableController::<Housing>::new(&client, &mut housings_target).reload();

    Ok(())
}

fn add_entry<R: Record>(outcome: &SubmitOutcome) -> ActivityEntry {
    match outcome {
        SubmitOutcome::Created(message) => {
            ActivityEntry::now(R::NOUN, "add", "created").with_message(message)
        }
        SubmitOutcome::Incomplete(_) => ActivityEntry::now(R::NOUN, "add", "incomplete"),
        SubmitOutcome::Rejected(message) => {
            ActivityEntry::now(R::NOUN, "add", "rejected").with_message(message)
        }
        SubmitOutcome::Failed(detail) => {
            ActivityEntry::now(R::NOUN, "add", "failed").with_message(detail)
        }
    }
}

fn delete_entry<R: Record>(id: &str, outcome: DeleteOutcome) -> ActivityEntry {
    let label = match outcome {
        DeleteOutcome::Declined => "declined",
        DeleteOutcome::Deleted => "deleted",
        DeleteOutcome::Rejected => "rejected",
        DeleteOutcome::Failed => "failed",
    };
    ActivityEntry::now(R::NOUN, "delete", label).with_record_id(id)
}

// ---------------------------------------------------------------------------
// Chart commands
// ---------------------------------------------------------------------------

/// Consumption breakdown by type (single snapshot, pie analog).
pub fn run_consumption(config: &DomoConfig, format: OutputFormat) -> Result<()> {
    let client = ApiClient::from_config(config);
    let rows = client
        .aggregates("/api/consommation", &[])
        .context("could not load the consumption breakdown")?;
    let series = chart::adapt(Metric::Consumption, &rows);

    match format {
        OutputFormat::Table => chart::render_breakdown(&series, "Consumption by type"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&series.to_rows_json())?),
        OutputFormat::Csv => print_series_csv(&series),
    }
    Ok(())
}

/// Savings comparison at the selected time scale (bar chart).
pub fn run_savings(config: &DomoConfig, scale_raw: &str, format: OutputFormat) -> Result<()> {
    let scale = Scale::from_str_opt(Some(scale_raw))
        .with_context(|| format!("unknown scale '{scale_raw}' — use monthly or annual"))?;

    let client = ApiClient::from_config(config);
    let rows = client
        .aggregates("/api/economies", &[("scale", scale.wire_value())])
        .context("could not load the savings comparison")?;
    let series = chart::adapt(Metric::Savings, &rows);

    match format {
        OutputFormat::Table => chart::render_bars(
            &series,
            &format!("Savings ({scale})"),
            "amount saved in €",
        ),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&series.to_rows_json())?),
        OutputFormat::Csv => print_series_csv(&series),
    }
    Ok(())
}

fn print_series_csv(series: &SeriesTable) {
    println!("{},{}", series.header[0], series.header[1]);
    for (label, value) in &series.rows {
        println!("{label},{value}");
    }
}

// ---------------------------------------------------------------------------
// domo health
// ---------------------------------------------------------------------------

/// Check config files, API reachability and the activity log.
pub fn run_health(config: &DomoConfig) -> Result<()> {
    println!("{}", "domo health check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.domo/config.toml found"
        } else {
            "not found (run `domo config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists { ".domo.toml found" } else { "none (optional)" },
    );

    let client = ApiClient::from_config(config);
    let reachable = client.is_reachable();
    let detail = if reachable {
        format!("reachable at {}", client.base_url())
    } else {
        format!("not reachable at {} — is the server running?", client.base_url())
    };
    print_health_item("API", reachable, &detail);

    let log_exists = audit::log_path().map(|p| p.exists()).unwrap_or(false);
    if config.audit.enabled {
        let entries = if log_exists { audit::read_all().len() } else { 0 };
        print_health_item(
            "Activity log",
            log_exists,
            &if log_exists {
                format!("{entries} entries")
            } else {
                "no entries yet".to_string()
            },
        );
    } else {
        print_health_item("Activity log", true, "disabled in config");
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok { "✓".green().bold() } else { "✗".red().bold() };
    println!("  {} {:<16} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// domo config show | init | set | reset
// ---------------------------------------------------------------------------

pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective configuration".bold().cyan());
    println!("{}", "=".repeat(40));
    println!();
    println!("{toml_str}");
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    println!("  {} ~/.domo/config.toml", "·".dimmed());
    println!("  {} ./.domo.toml", "·".dimmed());
    println!("  {} DOMO_* environment variables", "·".dimmed());
    Ok(())
}

pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!("{} Config written to {}", "✓".green().bold(), path.display());
    Ok(())
}

pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

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
// Table printing
// ---------------------------------------------------------------------------

fn print_snapshot(snapshot: &TableSnapshot) {
    let widths = column_widths(snapshot);
    let total_width: usize = widths.iter().sum::<usize>() + 2 * widths.len();

    let header = snapshot
        .columns
        .iter()
        .zip(widths.iter().copied())
        .map(|(name, width)| format!("{name:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    println!("  {}", header.bold());
    println!("  {}", "-".repeat(total_width.max(header.len())));

    match &snapshot.view {
        TableView::Rows(rows) => {
            for row in rows {
                let line = row
                    .cells
                    .iter()
                    .zip(widths.iter().copied())
                    .map(|(cell, width)| format!("{cell:<width$}"))
                    .collect::<Vec<_>>()
                    .join("  ");
                println!("  {line}");
            }
        }
        TableView::Empty(message) => println!("  {}", message.yellow()),
        TableView::Failed(message) => println!("  {}", message.red()),
    }
}

fn column_widths(snapshot: &TableSnapshot) -> Vec<usize> {
    let mut widths: Vec<usize> = snapshot.columns.iter().map(|c| c.chars().count()).collect();
    if let TableView::Rows(rows) = &snapshot.view {
        for row in rows {
            for (i, cell) in row.cells.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }
    }
    widths
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
