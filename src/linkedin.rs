use crate::cache_validator::ValidatedCacheEntry;
use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::matcher::ProfileSearch;
use crate::models::{ContactInfo, ExperienceEntry, LinkedInProfile, SearchHit, TimePeriod};
use async_trait::async_trait;
use chrono::NaiveDate;
use moka::future::Cache;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Client for the LinkedIn Voyager API.
///
/// Authenticates with a pre-acquired `li_at` session cookie plus the matching
/// CSRF token; there is no credentialed login flow here. Profile responses
/// are cached with checksum validation because the matcher may revisit the
/// same profile across contacts.
#[derive(Clone)]
pub struct LinkedInClient {
    client: reqwest::Client,
    base_url: String,
    session_cookie: String,
    csrf_token: String,
    profile_cache: Cache<String, String>,
}

impl LinkedInClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create LinkedIn client: {}", e))
            })?;

        let profile_cache = Cache::builder()
            .time_to_live(Duration::from_secs(config.profile_cache_ttl_secs))
            .max_capacity(10_000)
            .build();

        Ok(Self {
            client,
            base_url: config.linkedin_base_url.trim_end_matches('/').to_string(),
            session_cookie: config.linkedin_session_cookie.clone(),
            csrf_token: config.linkedin_csrf_token.clone(),
            profile_cache,
        })
    }

    fn cookie_header(&self) -> String {
        format!(
            "li_at={}; JSESSIONID=\"{}\"",
            self.session_cookie, self.csrf_token
        )
    }

    /// Issues a GET and parses the JSON body, mapping auth rejections and
    /// upstream failures onto the error taxonomy.
    async fn get_json(&self, url: Url, what: &str) -> Result<Value, AppError> {
        let response = self
            .client
            .get(url)
            .header("cookie", self.cookie_header())
            .header("csrf-token", &self.csrf_token)
            .header("accept", "application/json")
            .send()
            .await
            .with_context(|| format!("LinkedIn request for {} failed", what))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(AppError::Unauthorized(format!(
                "LinkedIn rejected the session while fetching {} (status {})",
                what, status
            )));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("LinkedIn returned error {} for {}: {}", status, what, error_text);
            return Err(AppError::ExternalApiError(format!(
                "LinkedIn returned status {}: {}",
                status, error_text
            )));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse LinkedIn {} response: {}", what, e))
        })
    }
}

#[async_trait]
impl ProfileSearch for LinkedInClient {
    async fn search_people(
        &self,
        first_name: &str,
        last_name: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, AppError> {
        let keywords = format!("{} {}", first_name, last_name);
        let count = limit.to_string();
        let url = Url::parse_with_params(
            &format!("{}/search/blended", self.base_url),
            &[
                ("keywords", keywords.as_str()),
                ("count", count.as_str()),
                ("origin", "GLOBAL_SEARCH_HEADER"),
                ("resultType", "PEOPLE"),
            ],
        )
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build search URL: {}", e)))?;

        let data = self.get_json(url, "people search").await?;
        let hits = parse_search_hits(&data);
        tracing::debug!(
            "LinkedIn search for '{}' returned {} hit(s)",
            keywords,
            hits.len()
        );
        Ok(hits)
    }

    async fn get_profile(&self, urn: &str) -> Result<LinkedInProfile, AppError> {
        if let Some(serialized) = self.profile_cache.get(urn).await {
            if let Some(data) = ValidatedCacheEntry::deserialize_and_validate(&serialized, urn) {
                if let Ok(profile) = serde_json::from_str::<LinkedInProfile>(&data) {
                    tracing::debug!("Profile cache hit for {}", urn);
                    return Ok(profile);
                }
            }
            // Corrupted entry, fall through to a fresh fetch
        }

        let url = Url::parse(&format!(
            "{}/identity/profiles/{}/profileView",
            self.base_url, urn
        ))
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build profile URL: {}", e)))?;

        let data = self.get_json(url, "profile").await?;
        let profile = parse_profile(&data);

        if let Ok(json) = serde_json::to_string(&profile) {
            self.profile_cache
                .insert(urn.to_string(), ValidatedCacheEntry::new(urn, json).serialize())
                .await;
        }

        Ok(profile)
    }

    async fn get_contact_info(&self, urn: &str) -> Result<ContactInfo, AppError> {
        let url = Url::parse(&format!(
            "{}/identity/profiles/{}/profileContactInfo",
            self.base_url, urn
        ))
        .map_err(|e| {
            AppError::ExternalApiError(format!("Failed to build contact info URL: {}", e))
        })?;

        let data = self.get_json(url, "contact info").await?;
        Ok(ContactInfo {
            public_profile_url: string_field(&data, &["publicProfileUrl", "public_profile_url"]),
            email_address: string_field(&data, &["emailAddress", "email_address"]),
        })
    }
}

/// Reads the first present string field among `keys`.
fn string_field(data: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| data.get(key))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Extracts display text from either a plain string or a `{ "text": ... }`
/// wrapper, both of which appear in search responses.
fn text_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => map
            .get("text")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(String::from),
        _ => None,
    }
}

fn parse_hit(element: &Value) -> Option<SearchHit> {
    let urn = element
        .get("targetUrn")
        .or_else(|| element.get("entityUrn"))
        .and_then(|v| v.as_str())?;
    // URNs look like "urn:li:fsd_profile:ACoAAB..."; keep the trailing id
    let urn_id = urn.rsplit(':').next().unwrap_or(urn).to_string();
    if urn_id.is_empty() {
        return None;
    }

    Some(SearchHit {
        urn_id,
        name: text_of(element.get("title")),
        headline: text_of(element.get("headline")),
        location: text_of(element.get("subline")),
    })
}

/// Flattens blended search results. People hits arrive either directly in
/// `elements` or nested one level down inside result clusters.
fn parse_search_hits(data: &Value) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    let Some(clusters) = data.get("elements").and_then(|v| v.as_array()) else {
        return hits;
    };

    for cluster in clusters {
        if let Some(nested) = cluster.get("elements").and_then(|v| v.as_array()) {
            for element in nested {
                if let Some(hit) = parse_hit(element) {
                    hits.push(hit);
                }
            }
        } else if let Some(hit) = parse_hit(cluster) {
            hits.push(hit);
        }
    }

    hits
}

/// Converts a Voyager `{ "month": m, "year": y }` object to a date. The
/// month is often absent on older entries; it defaults to January.
fn month_year_date(value: Option<&Value>) -> Option<NaiveDate> {
    let value = value?;
    let year = value.get("year").and_then(|v| v.as_i64())?;
    let month = value.get("month").and_then(|v| v.as_i64()).unwrap_or(1);
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, u32::try_from(month).ok()?, 1)
}

fn parse_time_period(entry: &Value) -> Option<TimePeriod> {
    let raw = entry.get("timePeriod").or_else(|| entry.get("time_period"))?;
    let period = TimePeriod {
        start: month_year_date(raw.get("startDate").or_else(|| raw.get("start_date"))),
        end: month_year_date(raw.get("endDate").or_else(|| raw.get("end_date"))),
    };
    (period.start.is_some() || period.end.is_some()).then_some(period)
}

fn parse_profile(data: &Value) -> LinkedInProfile {
    let experience = data
        .get("experience")
        .and_then(|v| v.as_array())
        .map(|entries| {
            entries
                .iter()
                .map(|entry| ExperienceEntry {
                    company_name: string_field(entry, &["companyName", "company_name"]),
                    title: string_field(entry, &["title"]),
                    period: parse_time_period(entry),
                    description: string_field(entry, &["description"]),
                })
                .collect()
        })
        .unwrap_or_default();

    LinkedInProfile {
        first_name: string_field(data, &["firstName", "first_name"]).unwrap_or_default(),
        last_name: string_field(data, &["lastName", "last_name"]).unwrap_or_default(),
        public_id: string_field(data, &["publicIdentifier", "public_id"]),
        headline: string_field(data, &["headline"]),
        location: string_field(data, &["locationName", "location_name"]),
        experience,
    }
}
