// SPDX-FileCopyrightText: 2026 jgrants-search Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! jgrants - search Japanese government subsidies.
//!
//! This is the binary entry point. Exit status is 1 for configuration
//! problems and 2 when an operation fails.

mod doctor;
mod render;

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use jgrants_config::model::JgrantsConfig;
use jgrants_core::types::{AccessDescriptor, RenderedContent, SearchQuery, SortField, SortOrder};
use jgrants_core::JgrantsError;
use jgrants_service::SubsidyService;
use tracing::debug;

const EXIT_CONFIG: i32 = 1;
const EXIT_OPERATION: i32 = 2;

/// jgrants - search Japanese government subsidies (jGrants).
#[derive(Parser, Debug)]
#[command(name = "jgrants", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the search path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Search subsidies from a free-text request.
    Search {
        /// What you are looking for, e.g. "東京の小規模事業者向けDX補助金".
        #[arg(required = true)]
        text: Vec<String>,
        /// Use the text as the keyword without extraction.
        #[arg(long)]
        raw: bool,
        /// Include subsidies that no longer accept applications.
        #[arg(long)]
        include_closed: bool,
        /// Sort key: acceptance_end_datetime, acceptance_start_datetime or created_date.
        #[arg(long, value_parser = parse_sort)]
        sort: Option<SortField>,
        /// Sort descending.
        #[arg(long)]
        desc: bool,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Show one subsidy.
    Detail {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Fetch an attachment by descriptor JSON or by subsidy and index.
    File {
        /// Access descriptor as JSON, e.g. '{"kind":"tool","tool":"get_file_content","params":{...}}'.
        #[arg(required_unless_present = "subsidy", conflicts_with = "subsidy")]
        descriptor: Option<String>,
        /// Subsidy whose attachment to fetch.
        #[arg(long)]
        subsidy: Option<String>,
        /// Attachment index as listed by `jgrants detail`.
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// Write the content to this file instead of stdout.
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Show catalog statistics of accepting subsidies.
    Overview {
        #[arg(long)]
        json: bool,
    },
    /// Check configuration, transport and extraction.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

fn parse_sort(s: &str) -> Result<SortField, String> {
    SortField::from_str(s).map_err(|_| {
        format!("unknown sort key `{s}` (expected acceptance_end_datetime, acceptance_start_datetime or created_date)")
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match cli.config.as_deref() {
        Some(path) => jgrants_config::load_and_validate_from_path(path),
        None => jgrants_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            jgrants_config::render_errors(&errors);
            std::process::exit(EXIT_CONFIG);
        }
    };

    init_tracing(&config.logging.level);

    let service = match SubsidyService::from_config(&config) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("jgrants: {e}");
            std::process::exit(EXIT_CONFIG);
        }
    };

    debug!(transport = service.transport_name(), command = ?cli.command, "dispatching");
    if let Err(e) = run(cli.command, &config, &service).await {
        eprintln!("jgrants: {e} [{}]", e.cause());
        std::process::exit(EXIT_OPERATION);
    }
}

async fn run(
    command: Commands,
    config: &JgrantsConfig,
    service: &SubsidyService,
) -> Result<(), JgrantsError> {
    match command {
        Commands::Search {
            text,
            raw,
            include_closed,
            sort,
            desc,
            json,
        } => {
            let text = text.join(" ");
            let (mut query, degraded) = if raw {
                (SearchQuery::new(text.trim()), None)
            } else {
                let extraction = service.extract_with_outcome(&text).await;
                (extraction.query, extraction.degraded)
            };
            if include_closed {
                query.accepting_only = false;
            }
            if let Some(sort) = sort {
                query.sort_field = sort;
            }
            if desc {
                query.sort_order = SortOrder::Desc;
            }

            let results = service.search(&query).await?;
            if json {
                let body = serde_json::json!({
                    "query": query,
                    "degraded": degraded.map(|d| d.to_string()),
                    "results": results,
                });
                print_json(&body)?;
            } else {
                eprintln!("{}", render::query_line(&query));
                if let Some(reason) = degraded {
                    eprintln!("(extraction skipped: {reason})");
                }
                print!("{}", render::summary_table(&results));
            }
        }
        Commands::Detail { id, json } => {
            let detail = service.get_detail(&id).await?;
            if json {
                print_json(&detail)?;
            } else {
                print!("{}", render::detail_text(&detail));
            }
        }
        Commands::File {
            descriptor,
            subsidy,
            index,
            output,
        } => {
            let access = match (descriptor, subsidy) {
                (Some(raw), _) => serde_json::from_str::<AccessDescriptor>(&raw)
                    .map_err(|e| JgrantsError::InvalidQuery(format!("bad descriptor: {e}")))?,
                (None, Some(id)) => {
                    let detail = service.get_detail(&id).await?;
                    detail
                        .attachments
                        .get(index)
                        .map(|a| a.access.clone())
                        .ok_or_else(|| {
                            JgrantsError::InvalidQuery(format!(
                                "subsidy {id} has {} attachment(s), no index {index}",
                                detail.attachments.len()
                            ))
                        })?
                }
                (None, None) => {
                    return Err(JgrantsError::InvalidQuery(
                        "give a descriptor or --subsidy".to_string(),
                    ));
                }
            };
            let content = service.get_file_content(&access).await?;
            write_content(&content, output)?;
        }
        Commands::Overview { json } => {
            let overview = service.overview().await?;
            if json {
                print_json(&overview)?;
            } else {
                print!("{}", render::overview_text(&overview));
            }
        }
        Commands::Doctor { plain } => {
            let failures = doctor::run_doctor(config, service, plain).await;
            if failures > 0 {
                return Err(JgrantsError::Internal(format!(
                    "{failures} doctor check(s) failed"
                )));
            }
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), JgrantsError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| JgrantsError::Internal(format!("cannot serialize output: {e}")))?;
    println!("{text}");
    Ok(())
}

fn write_content(content: &RenderedContent, output: Option<PathBuf>) -> Result<(), JgrantsError> {
    let (bytes, name): (&[u8], &Option<String>) = match content {
        RenderedContent::Markdown { name, text } => (text.as_bytes(), name),
        RenderedContent::Binary { name, bytes } => (bytes.as_slice(), name),
        RenderedContent::Unavailable { name, reason } => {
            return Err(JgrantsError::Unsupported(format!(
                "{}: {reason}",
                name.as_deref().unwrap_or("attachment")
            )));
        }
    };

    match output {
        Some(path) => {
            std::fs::write(&path, bytes).map_err(|e| {
                JgrantsError::Internal(format!("cannot write {}: {e}", path.display()))
            })?;
            eprintln!(
                "wrote {} ({} bytes) to {}",
                name.as_deref().unwrap_or("attachment"),
                bytes.len(),
                path.display()
            );
        }
        None => match content {
            RenderedContent::Markdown { text, .. } => println!("{text}"),
            _ => eprintln!(
                "{} is binary ({} bytes); use --output to save it",
                name.as_deref().unwrap_or("attachment"),
                bytes.len()
            ),
        },
    }
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` wins when set. Logs go to stderr so `--json` output stays clean.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("jgrants={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
