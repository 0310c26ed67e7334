/// Enrichment workflow shared by the CLI commands
///
/// This module orchestrates the full update flow:
/// 1. Page through WorkflowMax contacts
/// 2. Skip contacts that already carry a LinkedIn URL
/// 3. Match the remaining contacts against LinkedIn people search
/// 4. Write accepted profile URLs back into the custom field
use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::linkedin::LinkedInClient;
use crate::matcher::{find_match, MatcherConfig, ProfileSearch};
use crate::models::{Contact, MatchOutcome, NoMatchReason};
use crate::workflowmax::WorkflowMaxClient;
use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinSet;

/// Knobs for a batch run. Defaults come from the environment, the CLI can
/// override each field per invocation.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Stop after this many contacts, across all pages.
    pub limit: Option<usize>,
    pub page_size: usize,
    pub concurrency: usize,
    /// Delay between contact dispatches, keeps LinkedIn traffic polite.
    pub pacing_ms: u64,
    pub dry_run: bool,
}

impl BatchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            limit: None,
            page_size: config.enrich_page_size,
            concurrency: config.enrich_concurrency.max(1),
            pacing_ms: config.enrich_pacing_ms,
            dry_run: false,
        }
    }
}

/// What happened to a single contact.
#[derive(Debug, Clone)]
pub enum ContactOutcome {
    /// The contact already had a LinkedIn URL, nothing was touched.
    AlreadySet { url: String },
    /// No candidate profile was accepted.
    NoMatch { reason: NoMatchReason },
    /// A profile was accepted but exposed no public URL, so there was
    /// nothing to write.
    MatchedWithoutUrl { score: f64 },
    /// A profile URL was written to the custom field.
    Updated {
        url: String,
        score: f64,
        matched_company: Option<String>,
        matched_title: Option<String>,
    },
    /// Dry run: a profile URL was found but not written.
    WouldUpdate {
        url: String,
        score: f64,
        matched_company: Option<String>,
        matched_title: Option<String>,
    },
}

/// Tallies for a batch run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct EnrichmentReport {
    pub processed: usize,
    pub updated: usize,
    pub skipped: usize,
    pub no_match: usize,
    pub failed: usize,
}

enum BatchOutcome {
    Updated,
    Skipped,
    NoMatch,
    Failed,
}

impl EnrichmentReport {
    fn record(&mut self, outcome: BatchOutcome) {
        self.processed += 1;
        match outcome {
            BatchOutcome::Updated => self.updated += 1,
            BatchOutcome::Skipped => self.skipped += 1,
            BatchOutcome::NoMatch => self.no_match += 1,
            BatchOutcome::Failed => self.failed += 1,
        }
    }
}

/// Runs the match-and-update flow for one contact that is already loaded.
///
/// The contact's current custom fields are checked first so an existing URL
/// is never overwritten. In dry-run mode the match still happens but the
/// write-back is reported instead of performed.
pub async fn enrich_contact(
    wfm: &WorkflowMaxClient,
    search: &dyn ProfileSearch,
    matcher: &MatcherConfig,
    contact: &Contact,
    dry_run: bool,
) -> Result<ContactOutcome, AppError> {
    if let Some(existing) = wfm.linkedin_url_of(&contact.uuid).await? {
        tracing::debug!(
            "Contact {} already has a LinkedIn URL, skipping",
            contact.name
        );
        return Ok(ContactOutcome::AlreadySet { url: existing });
    }

    let outcome = find_match(
        search,
        &contact.name,
        contact.company_name(),
        contact.position_title(),
        matcher,
    )
    .await
    .with_context(|| format!("Failed to match contact {} ({})", contact.name, contact.uuid))?;

    match outcome {
        MatchOutcome::Found(result) => {
            let Some(url) = result.profile_url else {
                tracing::info!(
                    "Matched {} to {} (score {:.2}) but no public URL could be resolved",
                    contact.name,
                    result.matched_name,
                    result.score
                );
                return Ok(ContactOutcome::MatchedWithoutUrl {
                    score: result.score,
                });
            };
            if dry_run {
                tracing::info!(
                    "Dry run: would set LinkedIn URL {} for {} (score {:.2})",
                    url,
                    contact.name,
                    result.score
                );
                Ok(ContactOutcome::WouldUpdate {
                    url,
                    score: result.score,
                    matched_company: result.matched_company,
                    matched_title: result.matched_title,
                })
            } else {
                wfm.set_linkedin_url(&contact.uuid, &url)
                    .await
                    .context(format!(
                        "Failed to store LinkedIn URL for contact {} ({})",
                        contact.name, contact.uuid
                    ))?;
                Ok(ContactOutcome::Updated {
                    url,
                    score: result.score,
                    matched_company: result.matched_company,
                    matched_title: result.matched_title,
                })
            }
        }
        MatchOutcome::NoMatch(reason) => {
            tracing::info!("No LinkedIn match for {}: {}", contact.name, reason);
            Ok(ContactOutcome::NoMatch { reason })
        }
    }
}

/// Fetches one contact by UUID and runs the enrichment flow on it.
pub async fn update_single_contact(
    wfm: &WorkflowMaxClient,
    search: &dyn ProfileSearch,
    matcher: &MatcherConfig,
    contact_uuid: &str,
    dry_run: bool,
) -> Result<ContactOutcome, AppError> {
    let contact = wfm.get_contact(contact_uuid).await?;
    tracing::info!("Enriching contact {} ({})", contact.name, contact.uuid);
    enrich_contact(wfm, search, matcher, &contact, dry_run).await
}

/// Pages through all contacts and fills in missing LinkedIn URLs.
///
/// One failing contact never aborts the run. The page fetch itself is the
/// only fatal error, since without it there is nothing left to process.
pub async fn update_missing_profiles(
    wfm: &WorkflowMaxClient,
    linkedin: &LinkedInClient,
    matcher: &MatcherConfig,
    options: &BatchOptions,
) -> Result<EnrichmentReport, AppError> {
    let concurrency = options.concurrency.max(1);
    tracing::info!(
        "Starting LinkedIn enrichment run (page_size: {}, concurrency: {}, dry_run: {})",
        options.page_size,
        concurrency,
        options.dry_run
    );

    let mut report = EnrichmentReport::default();
    let mut tasks: JoinSet<BatchOutcome> = JoinSet::new();
    let mut dispatched = 0usize;
    let mut page = 1usize;

    'pages: loop {
        let batch = wfm.list_contacts(page, options.page_size).await?;
        if batch.contacts.is_empty() {
            break;
        }
        let has_more = batch.has_more(options.page_size);

        for contact in batch.contacts {
            if let Some(limit) = options.limit {
                if dispatched >= limit {
                    tracing::info!("Reached contact limit of {}, stopping dispatch", limit);
                    break 'pages;
                }
            }

            while tasks.len() >= concurrency {
                if let Some(joined) = tasks.join_next().await {
                    tally(&mut report, joined);
                }
            }

            if options.pacing_ms > 0 && dispatched > 0 {
                tokio::time::sleep(Duration::from_millis(options.pacing_ms)).await;
            }
            dispatched += 1;

            let wfm = wfm.clone();
            let linkedin = linkedin.clone();
            let matcher = matcher.clone();
            let dry_run = options.dry_run;
            tasks.spawn(async move {
                match enrich_contact(&wfm, &linkedin, &matcher, &contact, dry_run).await {
                    Ok(ContactOutcome::Updated { url, .. }) => {
                        tracing::info!("✓ {} → {}", contact.name, url);
                        BatchOutcome::Updated
                    }
                    Ok(ContactOutcome::WouldUpdate { .. }) => BatchOutcome::Updated,
                    Ok(ContactOutcome::AlreadySet { .. }) => BatchOutcome::Skipped,
                    Ok(ContactOutcome::MatchedWithoutUrl { .. }) => BatchOutcome::Skipped,
                    Ok(ContactOutcome::NoMatch { .. }) => BatchOutcome::NoMatch,
                    Err(e) => {
                        tracing::warn!(
                            "Failed to enrich contact {} ({}): {}",
                            contact.name,
                            contact.uuid,
                            e
                        );
                        BatchOutcome::Failed
                    }
                }
            });
        }

        if !has_more {
            break;
        }
        page += 1;
    }

    while let Some(joined) = tasks.join_next().await {
        tally(&mut report, joined);
    }

    if report.processed > 0 {
        tracing::info!(
            "Enrichment run complete: {} processed, {} updated, {} skipped, {} without a match, {} failed ({:.0}% updated)",
            report.processed,
            report.updated,
            report.skipped,
            report.no_match,
            report.failed,
            report.updated as f64 / report.processed as f64 * 100.0
        );
    } else {
        tracing::info!("Enrichment run complete: no contacts to process");
    }
    Ok(report)
}

fn tally(
    report: &mut EnrichmentReport,
    joined: Result<BatchOutcome, tokio::task::JoinError>,
) {
    match joined {
        Ok(outcome) => report.record(outcome),
        Err(e) => {
            let error = AppError::InternalError(format!("Enrichment task panicked: {}", e));
            tracing::warn!("{}", error);
            report.record(BatchOutcome::Failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_every_outcome_as_processed() {
        let mut report = EnrichmentReport::default();
        report.record(BatchOutcome::Updated);
        report.record(BatchOutcome::Skipped);
        report.record(BatchOutcome::Skipped);
        report.record(BatchOutcome::NoMatch);
        report.record(BatchOutcome::Failed);

        assert_eq!(report.processed, 5);
        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.no_match, 1);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn batch_options_never_allow_zero_concurrency() {
        let mut config = Config::for_tests();
        config.enrich_concurrency = 0;
        let options = BatchOptions::from_config(&config);
        assert_eq!(options.concurrency, 1);
    }

    #[tokio::test]
    async fn panicked_task_is_tallied_as_failed() {
        let mut report = EnrichmentReport::default();
        let mut tasks: JoinSet<BatchOutcome> = JoinSet::new();
        tasks.spawn(async { panic!("boom") });

        while let Some(joined) = tasks.join_next().await {
            tally(&mut report, joined);
        }

        assert_eq!(report.processed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.updated, 0);
    }
}
