/// Profile matching workflow
///
/// Takes a WorkflowMax contact's identity (name, company, position title),
/// searches LinkedIn for candidate people, and scores each candidate with
/// the similarity engine:
/// 1. Split the contact name; single-token names are skipped as ambiguous
/// 2. Normalize both parts and search for people by first and last name
/// 3. Score the top candidates on name and experience similarity
/// 4. Track the best candidate and resolve its public profile URL
/// 5. Accept only if the weighted score reaches the confidence threshold
use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::experience::analyze_experience;
use crate::models::{
    ContactInfo, LinkedInProfile, MatchOutcome, MatchResult, NoMatchReason, SearchHit,
};
use crate::similarity::{normalize, similarity};
use async_trait::async_trait;
use regex::Regex;

/// Base for public profile URLs constructed from a public id when the
/// contact-info endpoint exposes no URL.
pub const LINKEDIN_PUBLIC_URL_BASE: &str = "https://www.linkedin.com/in/";

/// LinkedIn lookup operations the matcher depends on.
///
/// The production implementation is `LinkedInClient`; tests substitute an
/// in-memory fake.
#[async_trait]
pub trait ProfileSearch: Send + Sync {
    /// Searches people by first and last name, returning at most `limit` hits.
    async fn search_people(
        &self,
        first_name: &str,
        last_name: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, AppError>;

    /// Fetches the full profile for a search hit's URN.
    async fn get_profile(&self, urn: &str) -> Result<LinkedInProfile, AppError>;

    /// Fetches contact information (including the public profile URL) for a URN.
    async fn get_contact_info(&self, urn: &str) -> Result<ContactInfo, AppError>;
}

/// Thresholds and limits for candidate evaluation.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Minimum weighted score for a match to be accepted.
    pub score_threshold: f64,
    /// Minimum name similarity below which a candidate is discarded.
    pub name_threshold: f64,
    /// Minimum experience similarity below which a candidate is discarded.
    pub experience_threshold: f64,
    pub name_weight: f64,
    pub experience_weight: f64,
    /// How many search hits to request from the people search.
    pub max_candidates: usize,
    /// How many of those hits to evaluate in detail.
    pub max_evaluated: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.7,
            name_threshold: 0.8,
            experience_threshold: 0.3,
            name_weight: 0.6,
            experience_weight: 0.4,
            max_candidates: 10,
            max_evaluated: 5,
        }
    }
}

impl From<&Config> for MatcherConfig {
    fn from(config: &Config) -> Self {
        Self {
            score_threshold: config.score_threshold,
            name_threshold: config.name_threshold,
            experience_threshold: config.experience_threshold,
            name_weight: config.name_weight,
            experience_weight: config.experience_weight,
            max_candidates: config.max_candidates,
            max_evaluated: config.max_evaluated,
        }
    }
}

/// Splits a full name into (first, rest) on the first whitespace run.
///
/// Returns `None` when the name has fewer than two tokens.
fn split_name(full_name: &str) -> Option<(String, String)> {
    let mut tokens = full_name.split_whitespace();
    let first = tokens.next()?.to_string();
    let rest: Vec<&str> = tokens.collect();
    if rest.is_empty() {
        return None;
    }
    Some((first, rest.join(" ")))
}

/// Weighted candidate score with the confidence gate applied.
///
/// A candidate whose name similarity or experience similarity falls below
/// its gate threshold scores 0.0 outright; a strong name can never carry a
/// candidate with no supporting experience, and vice versa.
pub fn weighted_score(name_similarity: f64, experience_similarity: f64, cfg: &MatcherConfig) -> f64 {
    if name_similarity < cfg.name_threshold || experience_similarity < cfg.experience_threshold {
        return 0.0;
    }
    name_similarity * cfg.name_weight + experience_similarity * cfg.experience_weight
}

/// Finds the best LinkedIn profile for a contact identity.
///
/// Candidates are evaluated in search-result order; ties keep the earlier
/// candidate. The contact-info request is only issued when a candidate
/// becomes the new running best, so rejected candidates cost one profile
/// fetch at most. Any failed upstream fetch (search, profile, contact info)
/// propagates to the caller. A best candidate with no resolvable public URL
/// is still reported, with `profile_url` unset.
pub async fn find_match<S: ProfileSearch + ?Sized>(
    search: &S,
    full_name: &str,
    company: Option<&str>,
    title: Option<&str>,
    cfg: &MatcherConfig,
) -> Result<MatchOutcome, AppError> {
    let (first_name, last_name) = match split_name(full_name) {
        Some(parts) => parts,
        None => {
            tracing::info!(
                "Skipping '{}': single-token name is too ambiguous to search",
                full_name.trim()
            );
            return Ok(MatchOutcome::NoMatch(NoMatchReason::AmbiguousName));
        }
    };

    // Search terms carry no punctuation or case; a part that normalizes to
    // nothing leaves a single usable token
    let first_name = normalize(&first_name);
    let last_name = normalize(&last_name);
    if first_name.is_empty() || last_name.is_empty() {
        tracing::info!(
            "Skipping '{}': single-token name is too ambiguous to search",
            full_name.trim()
        );
        return Ok(MatchOutcome::NoMatch(NoMatchReason::AmbiguousName));
    }

    tracing::info!(
        "Searching LinkedIn for '{} {}' (limit {})",
        first_name,
        last_name,
        cfg.max_candidates
    );
    let hits = search
        .search_people(&first_name, &last_name, cfg.max_candidates)
        .await?;

    if hits.is_empty() {
        tracing::info!("No LinkedIn candidates found for '{}'", full_name.trim());
        return Ok(MatchOutcome::NoMatch(NoMatchReason::NoCandidates));
    }

    let mut best: Option<MatchResult> = None;
    let mut best_score = 0.0_f64;

    for hit in hits.iter().take(cfg.max_evaluated) {
        let profile = search
            .get_profile(&hit.urn_id)
            .await
            .with_context(|| format!("Failed to fetch candidate profile {}", hit.urn_id))?;

        let candidate_name = profile.full_name();
        let name_similarity = similarity(full_name, &candidate_name);
        let analysis = analyze_experience(&profile.experience, company, title);
        let experience_similarity = analysis.overall();
        let score = weighted_score(name_similarity, experience_similarity, cfg);

        tracing::debug!(
            "Candidate {} ('{}'): name_sim={:.3} exp_sim={:.3} score={:.3}",
            hit.urn_id,
            candidate_name,
            name_similarity,
            experience_similarity,
            score
        );

        if score > best_score {
            let profile_url = resolve_profile_url(search, &hit.urn_id, &profile).await?;
            if profile_url.is_none() {
                tracing::warn!("Candidate {} has no resolvable public URL", hit.urn_id);
            }
            best_score = score;
            best = Some(MatchResult {
                profile_url,
                score,
                matched_name: candidate_name,
                urn: hit.urn_id.clone(),
                name_similarity,
                experience_similarity,
                matched_company: analysis.best_company,
                matched_title: analysis.best_title,
            });
        }
    }

    match best {
        Some(result) if result.score >= cfg.score_threshold => {
            tracing::info!(
                "✓ Matched '{}' → {} (score {:.2})",
                full_name.trim(),
                result.profile_url.as_deref().unwrap_or("(no public URL)"),
                result.score
            );
            Ok(MatchOutcome::Found(result))
        }
        _ => {
            tracing::info!(
                "Best candidate for '{}' scored {:.2}, below threshold {}",
                full_name.trim(),
                best_score,
                cfg.score_threshold
            );
            Ok(MatchOutcome::NoMatch(NoMatchReason::BelowThreshold))
        }
    }
}

/// Whether a URL points at a LinkedIn public profile (an `/in/` page).
///
/// Contact-info data is member-editable and occasionally carries company
/// pages or bare domains; those fall back to the public-id URL instead.
fn is_profile_url(url: &str) -> bool {
    let profile_regex =
        Regex::new(r"^https?://([a-z0-9-]+\.)?linkedin\.com/in/[^/\s?#]+/?$").unwrap();
    profile_regex.is_match(url)
}

/// Resolves a candidate's public profile URL.
///
/// Prefers the contact-info endpoint; when it exposes no URL, or a
/// member-edited non-profile URL, falls back to building one from the
/// profile's public id. A failed contact-info fetch propagates.
async fn resolve_profile_url<S: ProfileSearch + ?Sized>(
    search: &S,
    urn: &str,
    profile: &LinkedInProfile,
) -> Result<Option<String>, AppError> {
    let fallback = profile
        .public_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .map(|id| format!("{}{}", LINKEDIN_PUBLIC_URL_BASE, id));

    let info = search
        .get_contact_info(urn)
        .await
        .with_context(|| format!("Failed to fetch contact info for {}", urn))?;

    Ok(match info.public_profile_url.filter(|url| !url.is_empty()) {
        Some(url) if is_profile_url(&url) => Some(url),
        Some(url) => {
            tracing::warn!(
                "Contact info for {} returned a non-profile URL ({}), using fallback",
                urn,
                url
            );
            fallback
        }
        None => fallback,
    })
}
