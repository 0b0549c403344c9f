//! Schema Validator CLI
//!
//! Validates Avro schema catalogues against the configured conventions and
//! plans the topics that valid schemas would get.
//!
//! Exit codes: 0 when every schema is valid, 1 when violations were found,
//! 2 when the schemas or configuration could not be loaded.

use std::path::{Path, PathBuf};

use avro_lint::registration::{register_catalogue, DryRunRegistrar};
use avro_lint::rules::BUILTIN_RULES;
use avro_lint::{Catalogue, SchemaValidator, ValidatorConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-validator")]
#[command(about = "Check Avro schemas against naming, documentation and default conventions")]
struct Cli {
    /// Configuration file (avro-lint.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate schema files or directories
    Validate {
        /// Files or directories to load (defaults to the configured catalogue root)
        paths: Vec<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the built-in rules
    Rules,

    /// Show the topics valid schemas would be registered as
    Topics {
        /// Files or directories to load (defaults to the configured catalogue root)
        paths: Vec<PathBuf>,

        /// Only the topic with this name
        #[arg(short, long)]
        topic: Option<String>,

        /// Only topics matching this regex (ignored with --topic)
        #[arg(short = 'm', long = "match")]
        topic_match: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "avro-lint.toml")]
        output: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// What a successful command found
enum Outcome {
    Clean,
    Violations,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(Outcome::Clean) => {}
        Ok(Outcome::Violations) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

fn run(cli: Cli) -> Result<Outcome, Box<dyn std::error::Error>> {
    let config = ValidatorConfig::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate { paths, json } => {
            let catalogue = load_catalogue(&config, paths)?;
            let validator = SchemaValidator::from_config(&config)?;
            let report = catalogue.validate(&validator)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.format_all());
            }

            Ok(if report.is_valid() {
                Outcome::Clean
            } else {
                Outcome::Violations
            })
        }

        Commands::Rules => {
            let width = BUILTIN_RULES.iter().map(|(code, _)| code.len()).max().unwrap_or(0);
            for (code, description) in BUILTIN_RULES {
                println!("{:width$}  {}", code, description, width = width);
            }
            Ok(Outcome::Clean)
        }

        Commands::Topics {
            paths,
            topic,
            topic_match,
        } => {
            let catalogue = load_catalogue(&config, paths)?;
            let validator = SchemaValidator::from_config(&config)?;

            let mut registration = config.registration.clone();
            if topic.is_some() {
                registration.topic = topic;
            }
            if topic_match.is_some() {
                registration.topic_match = topic_match;
            }

            let mut registrar = DryRunRegistrar::default();
            let summary = register_catalogue(&catalogue, &validator, &mut registrar, &registration)?;

            for spec in &registrar.planned {
                println!(
                    "{}  partitions={} replication={}  {}",
                    spec.name, spec.partitions, spec.replication, spec.schema
                );
            }
            for refused in &summary.refused {
                eprintln!("refused {} ({} violation(s))", refused.schema, refused.violations);
            }

            Ok(if summary.is_complete() {
                Outcome::Clean
            } else {
                Outcome::Violations
            })
        }

        Commands::Config { action } => {
            match action {
                ConfigAction::Show => {
                    print!("{}", config.to_toml()?);
                }
                ConfigAction::Init { output, force } => {
                    if Path::new(&output).exists() && !force {
                        return Err(format!("{} already exists (use --force to overwrite)", output).into());
                    }
                    ValidatorConfig::default().save(&output)?;
                    println!("Wrote {}", output);
                }
            }
            Ok(Outcome::Clean)
        }
    }
}

fn load_catalogue(config: &ValidatorConfig, paths: Vec<PathBuf>) -> Result<Catalogue, Box<dyn std::error::Error>> {
    let paths = if paths.is_empty() {
        vec![config.catalogue_root()]
    } else {
        paths
    };
    Ok(Catalogue::load_paths(&paths, &config.catalogue.extension)?)
}
