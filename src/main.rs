use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use simplelog::{ColorChoice, TermLogger, TerminalMode};

use domo::cli::{self, OutputFormat};
use domo::config;
use domo::model::{Housing, Sensor};

#[derive(Debug, Parser)]
#[command(name = "domo")]
#[command(about = "Terminal console for the domo home-monitoring API")]
struct App {
    /// Override the API base URL from config
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Increase diagnostic verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage the sensor/actuator collection
    Sensors {
        #[command(subcommand)]
        action: SensorAction,
    },
    /// Manage the housing-unit collection
    Housings {
        #[command(subcommand)]
        action: HousingAction,
    },
    /// Render the sensor and housing tables together
    Overview,
    /// Consumption breakdown by type
    Consumption {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Savings comparison at a monthly or annual scale
    Savings {
        /// Time scale: monthly (default) or annual
        #[arg(long, default_value = "monthly")]
        scale: String,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Check config, API reachability and the activity log
    Health,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum SensorAction {
    /// List the collection as currently known to the server
    List {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Add a sensor/actuator; prompts for any field not given as a flag
    Add {
        /// Sensor type (e.g. thermometer)
        #[arg(long = "type")]
        kind: Option<String>,
        /// Communication port
        #[arg(long)]
        port: Option<String>,
        /// Commercial reference
        #[arg(long)]
        reference: Option<String>,
        /// Room id the sensor is attached to
        #[arg(long)]
        room: Option<String>,
    },
    /// Delete a sensor/actuator by id (asks for confirmation)
    Rm {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
enum HousingAction {
    /// List the collection as currently known to the server
    List {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Add a housing unit; prompts for any field not given as a flag
    Add {
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        ip: Option<String>,
    },
    /// Delete a housing unit by id (asks for confirmation)
    Rm {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective (merged) configuration
    Show,
    /// Write the annotated default config to ~/.domo/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set one value, e.g. `domo config set api.base_url http://box:8080`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    init_logger(app.verbose);

    let mut cfg = config::load();
    if let Some(url) = app.api_url {
        cfg.api.base_url = url;
    }
    if !cfg.ui.color {
        colored::control::set_override(false);
    }

    match app.command {
        Commands::Sensors { action } => match action {
            SensorAction::List { format } => {
                cli::run_list::<Sensor>(&cfg, OutputFormat::from_str_opt(Some(&format)))
            }
            SensorAction::Add { kind, port, reference, room } => cli::run_add::<Sensor>(
                &cfg,
                vec![
                    ("type", kind),
                    ("port_communication", port),
                    ("reference_commerciale", reference),
                    ("id_piece", room),
                ],
            ),
            SensorAction::Rm { id, yes } => cli::run_remove::<Sensor>(&cfg, &id, yes),
        },
        Commands::Housings { action } => match action {
            HousingAction::List { format } => {
                cli::run_list::<Housing>(&cfg, OutputFormat::from_str_opt(Some(&format)))
            }
            HousingAction::Add { address, phone, ip } => cli::run_add::<Housing>(
                &cfg,
                vec![
                    ("adresse", address),
                    ("numero_telephone", phone),
                    ("adresse_ip", ip),
                ],
            ),
            HousingAction::Rm { id, yes } => cli::run_remove::<Housing>(&cfg, &id, yes),
        },
        Commands::Overview => cli::run_overview(&cfg),
        Commands::Consumption { format } => {
            cli::run_consumption(&cfg, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Savings { scale, format } => {
            cli::run_savings(&cfg, &scale, OutputFormat::from_str_opt(Some(&format)))
        }
        Commands::Health => cli::run_health(&cfg),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let _ = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}
