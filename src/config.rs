use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub wfm_base_url: String,
    pub wfm_access_token: String,
    pub wfm_account_id: String,
    pub linkedin_base_url: String,
    pub linkedin_session_cookie: String,
    pub linkedin_csrf_token: String,
    pub score_threshold: f64,
    pub name_threshold: f64,
    pub experience_threshold: f64,
    pub name_weight: f64,
    pub experience_weight: f64,
    pub max_candidates: usize,
    pub max_evaluated: usize,
    pub enrich_concurrency: usize,
    pub enrich_page_size: usize,
    pub enrich_pacing_ms: u64,
    pub definitions_cache_ttl_secs: u64,
    pub profile_cache_ttl_secs: u64,
}

fn env_f64(name: &str, default: f64) -> anyhow::Result<f64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number, got '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

fn env_usize(name: &str, default: usize) -> anyhow::Result<usize> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a positive integer, got '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

fn env_u64(name: &str, default: u64) -> anyhow::Result<u64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a positive integer, got '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            wfm_base_url: std::env::var("WFM_BASE_URL")
                .unwrap_or_else(|_| "https://api.workflowmax2.com".to_string()),
            wfm_access_token: std::env::var("WFM_ACCESS_TOKEN")
                .map_err(|_| anyhow::anyhow!("WFM_ACCESS_TOKEN environment variable required"))
                .and_then(|token| {
                    if token.trim().is_empty() {
                        anyhow::bail!("WFM_ACCESS_TOKEN cannot be empty");
                    }
                    Ok(token)
                })?,
            wfm_account_id: std::env::var("WFM_ACCOUNT_ID")
                .map_err(|_| anyhow::anyhow!("WFM_ACCOUNT_ID environment variable required"))
                .and_then(|id| {
                    if id.trim().is_empty() {
                        anyhow::bail!("WFM_ACCOUNT_ID cannot be empty");
                    }
                    Ok(id)
                })?,
            linkedin_base_url: std::env::var("LINKEDIN_BASE_URL")
                .unwrap_or_else(|_| "https://www.linkedin.com/voyager/api".to_string()),
            linkedin_session_cookie: std::env::var("LINKEDIN_SESSION_COOKIE")
                .map_err(|_| {
                    anyhow::anyhow!("LINKEDIN_SESSION_COOKIE environment variable required")
                })
                .and_then(|cookie| {
                    if cookie.trim().is_empty() {
                        anyhow::bail!("LINKEDIN_SESSION_COOKIE cannot be empty");
                    }
                    Ok(cookie)
                })?,
            linkedin_csrf_token: std::env::var("LINKEDIN_CSRF_TOKEN")
                .map_err(|_| anyhow::anyhow!("LINKEDIN_CSRF_TOKEN environment variable required"))
                .and_then(|token| {
                    if token.trim().is_empty() {
                        anyhow::bail!("LINKEDIN_CSRF_TOKEN cannot be empty");
                    }
                    Ok(token)
                })?,
            score_threshold: env_f64("MATCH_SCORE_THRESHOLD", 0.7)?,
            name_threshold: env_f64("MATCH_NAME_THRESHOLD", 0.8)?,
            experience_threshold: env_f64("MATCH_EXPERIENCE_THRESHOLD", 0.3)?,
            name_weight: env_f64("MATCH_NAME_WEIGHT", 0.6)?,
            experience_weight: env_f64("MATCH_EXPERIENCE_WEIGHT", 0.4)?,
            max_candidates: env_usize("MATCH_MAX_CANDIDATES", 10)?,
            max_evaluated: env_usize("MATCH_MAX_EVALUATED", 5)?,
            enrich_concurrency: env_usize("ENRICH_CONCURRENCY", 5)?,
            enrich_page_size: env_usize("ENRICH_PAGE_SIZE", 50)?,
            enrich_pacing_ms: env_u64("ENRICH_PACING_MS", 1000)?,
            definitions_cache_ttl_secs: env_u64("DEFINITIONS_CACHE_TTL_SECS", 3600)?,
            profile_cache_ttl_secs: env_u64("PROFILE_CACHE_TTL_SECS", 3600)?,
        };

        if !config.wfm_base_url.starts_with("http://") && !config.wfm_base_url.starts_with("https://")
        {
            anyhow::bail!("WFM_BASE_URL must start with http:// or https://");
        }
        if !config.linkedin_base_url.starts_with("http://")
            && !config.linkedin_base_url.starts_with("https://")
        {
            anyhow::bail!("LINKEDIN_BASE_URL must start with http:// or https://");
        }
        for (name, value) in [
            ("MATCH_SCORE_THRESHOLD", config.score_threshold),
            ("MATCH_NAME_THRESHOLD", config.name_threshold),
            ("MATCH_EXPERIENCE_THRESHOLD", config.experience_threshold),
            ("MATCH_NAME_WEIGHT", config.name_weight),
            ("MATCH_EXPERIENCE_WEIGHT", config.experience_weight),
        ] {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("{} must be between 0.0 and 1.0, got {}", name, value);
            }
        }
        if (config.name_weight + config.experience_weight - 1.0).abs() > 1e-9 {
            anyhow::bail!(
                "MATCH_NAME_WEIGHT + MATCH_EXPERIENCE_WEIGHT must sum to 1.0, got {}",
                config.name_weight + config.experience_weight
            );
        }
        if config.max_candidates == 0 {
            anyhow::bail!("MATCH_MAX_CANDIDATES must be at least 1");
        }
        if config.max_evaluated == 0 {
            anyhow::bail!("MATCH_MAX_EVALUATED must be at least 1");
        }
        if config.enrich_concurrency == 0 {
            anyhow::bail!("ENRICH_CONCURRENCY must be at least 1");
        }
        if config.enrich_page_size == 0 {
            anyhow::bail!("ENRICH_PAGE_SIZE must be at least 1");
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("WorkflowMax base URL: {}", config.wfm_base_url);
        tracing::debug!("LinkedIn base URL: {}", config.linkedin_base_url);
        tracing::debug!(
            "Match thresholds: score={} name={} experience={}",
            config.score_threshold,
            config.name_threshold,
            config.experience_threshold
        );
        tracing::debug!(
            "Batch settings: concurrency={} page_size={} pacing={}ms",
            config.enrich_concurrency,
            config.enrich_page_size,
            config.enrich_pacing_ms
        );

        Ok(config)
    }
}

#[cfg(test)]
impl Config {
    /// Config with all defaults and placeholder credentials, unit tests only.
    pub fn for_tests() -> Self {
        Self {
            wfm_base_url: "https://api.workflowmax2.com".to_string(),
            wfm_access_token: "test-token".to_string(),
            wfm_account_id: "test-account".to_string(),
            linkedin_base_url: "https://www.linkedin.com/voyager/api".to_string(),
            linkedin_session_cookie: "test-cookie".to_string(),
            linkedin_csrf_token: "test-csrf".to_string(),
            score_threshold: 0.7,
            name_threshold: 0.8,
            experience_threshold: 0.3,
            name_weight: 0.6,
            experience_weight: 0.4,
            max_candidates: 10,
            max_evaluated: 5,
            enrich_concurrency: 5,
            enrich_page_size: 50,
            enrich_pacing_ms: 0,
            definitions_cache_ttl_secs: 3600,
            profile_cache_ttl_secs: 3600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_env_helpers_fall_back_to_defaults() {
        assert_eq!(env_f64("UNSET_F64_FOR_TEST", 0.7).unwrap(), 0.7);
        assert_eq!(env_usize("UNSET_USIZE_FOR_TEST", 10).unwrap(), 10);
        assert_eq!(env_u64("UNSET_U64_FOR_TEST", 3600).unwrap(), 3600);
    }
}
