mod cache_validator;
mod circuit_breaker;
mod config;
mod enrichment;
mod errors;
mod experience;
mod linkedin;
mod matcher;
mod models;
mod similarity;
mod workflowmax;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::enrichment::{BatchOptions, ContactOutcome};
use crate::linkedin::LinkedInClient;
use crate::matcher::MatcherConfig;
use crate::workflowmax::WorkflowMaxClient;

#[derive(Parser)]
#[command(name = "wfm-linkedin")]
#[command(about = "Fill in LinkedIn profile URLs for WorkflowMax contacts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show a contact and its current custom field values
    Contact { uuid: String },
    /// List one page of contacts
    Contacts {
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Search contacts by free-text query
    Search {
        /// Search query; omit to list a detailed page
        #[arg(long)]
        query: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
        /// Also show each contact's custom field values
        #[arg(long)]
        include_custom_fields: bool,
    },
    /// List the account's custom field definitions
    Definitions,
    /// Set a contact-scoped custom field by definition name
    SetField {
        uuid: String,
        /// Definition name, matched case-insensitively
        field_name: String,
        value: String,
    },
    /// Match one contact against LinkedIn and store the profile URL
    Match {
        uuid: String,
        /// Report the match without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Fill in missing LinkedIn URLs across all contacts
    Sync {
        /// Stop after this many contacts
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        page_size: Option<usize>,
        #[arg(long)]
        concurrency: Option<usize>,
        /// Report matches without writing anything
        #[arg(long)]
        dry_run: bool,
    },
}

/// Main entry point for the CLI.
///
/// Initializes tracing, loads configuration from the environment, builds the
/// API clients and dispatches the chosen subcommand.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_wfm_linkedin=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    let wfm = WorkflowMaxClient::new(&config)?;

    match cli.command {
        Command::Contact { uuid } => {
            let contact = wfm.get_contact(&uuid).await?;
            println!("{}", serde_json::to_string_pretty(&contact)?);

            let fields = wfm.get_custom_fields(&uuid).await?;
            if fields.is_empty() {
                println!("\nNo custom field values set");
            } else {
                println!("\nCustom fields:");
                for field in fields {
                    println!("  {:<30} {}", field.name, field.value.unwrap_or_default());
                }
            }
        }

        Command::Contacts { page, page_size } => {
            let page_size = page_size.unwrap_or(config.enrich_page_size);
            let batch = wfm.list_contacts(page, page_size).await?;
            println!(
                "Page {} ({} of {} contacts)",
                batch.page,
                batch.contacts.len(),
                batch.total_records
            );
            for contact in &batch.contacts {
                println!(
                    "  {:<38} {:<28} {} @ {}",
                    contact.uuid,
                    contact.name,
                    contact.position_title().unwrap_or("-"),
                    contact.company_name().unwrap_or("-")
                );
            }
        }

        Command::Search {
            query,
            page,
            page_size,
            include_custom_fields,
        } => {
            let page_size = page_size.unwrap_or(config.enrich_page_size);
            let batch = wfm
                .search_contacts(query.as_deref(), page, page_size)
                .await?;
            if batch.contacts.is_empty() {
                println!("No contacts found");
            } else {
                println!("Found {} contact(s):", batch.contacts.len());
                for contact in &batch.contacts {
                    println!(
                        "  {:<38} {:<28} {} @ {}",
                        contact.uuid,
                        contact.name,
                        contact.position_title().unwrap_or("-"),
                        contact.company_name().unwrap_or("-")
                    );
                    if include_custom_fields {
                        match wfm.get_custom_fields(&contact.uuid).await {
                            Ok(fields) => {
                                for field in fields {
                                    println!(
                                        "      {:<30} {}",
                                        field.name,
                                        field.value.unwrap_or_default()
                                    );
                                }
                            }
                            Err(e) => tracing::warn!(
                                "Failed to fetch custom fields for {}: {}",
                                contact.uuid,
                                e
                            ),
                        }
                    }
                }
            }
        }

        Command::Definitions => {
            let definitions = wfm.get_definitions().await?;
            if definitions.is_empty() {
                println!("No custom field definitions found");
            } else {
                println!("{:<38} {:<10} {:<9} {}", "UUID", "Type", "Contact?", "Name");
                println!("{}", "-".repeat(80));
                for definition in definitions.iter() {
                    println!(
                        "{:<38} {:<10} {:<9} {}",
                        definition.uuid,
                        format!("{:?}", definition.field_type),
                        if definition.use_contact { "yes" } else { "no" },
                        definition.name
                    );
                }
            }
        }

        Command::SetField {
            uuid,
            field_name,
            value,
        } => {
            let definition = wfm.contact_field_definition(&field_name).await?;
            wfm.set_custom_field(&uuid, &definition, &value).await?;
            println!("✅ Set '{}' on contact {}", definition.name, uuid);
        }

        Command::Match { uuid, dry_run } => {
            let linkedin = LinkedInClient::new(&config)?;
            let matcher = MatcherConfig::from(&config);
            let outcome =
                enrichment::update_single_contact(&wfm, &linkedin, &matcher, &uuid, dry_run)
                    .await?;
            match outcome {
                ContactOutcome::Updated {
                    url,
                    score,
                    matched_company,
                    matched_title,
                } => {
                    println!("✅ Updated: {} (score {:.2})", url, score);
                    if let Some(company) = matched_company {
                        println!("   Matched company: {}", company);
                    }
                    if let Some(title) = matched_title {
                        println!("   Matched title:   {}", title);
                    }
                }
                ContactOutcome::WouldUpdate {
                    url,
                    score,
                    matched_company,
                    matched_title,
                } => {
                    println!("✅ Match found, nothing written (dry run): {} (score {:.2})", url, score);
                    if let Some(company) = matched_company {
                        println!("   Matched company: {}", company);
                    }
                    if let Some(title) = matched_title {
                        println!("   Matched title:   {}", title);
                    }
                }
                ContactOutcome::AlreadySet { url } => {
                    println!("Contact already has a LinkedIn URL: {}", url)
                }
                ContactOutcome::MatchedWithoutUrl { score } => {
                    println!(
                        "⚠️ Matched with score {:.2}, but the profile exposes no public URL; nothing written",
                        score
                    )
                }
                ContactOutcome::NoMatch { reason } => println!("❌ No match: {}", reason),
            }
        }

        Command::Sync {
            limit,
            page_size,
            concurrency,
            dry_run,
        } => {
            let linkedin = LinkedInClient::new(&config)?;
            let matcher = MatcherConfig::from(&config);

            let mut options = BatchOptions::from_config(&config);
            options.limit = limit;
            if let Some(page_size) = page_size {
                options.page_size = page_size;
            }
            if let Some(concurrency) = concurrency {
                options.concurrency = concurrency;
            }
            options.dry_run = dry_run;

            let report =
                enrichment::update_missing_profiles(&wfm, &linkedin, &matcher, &options).await?;

            println!("\nSync completed:");
            println!("  Processed:   {}", report.processed);
            println!(
                "  ✅ Updated:  {}{}",
                report.updated,
                if dry_run { " (dry run, nothing written)" } else { "" }
            );
            println!("  Skipped:     {}", report.skipped);
            println!("  No match:    {}", report.no_match);
            println!("  ❌ Failed:   {}", report.failed);
        }
    }

    Ok(())
}
