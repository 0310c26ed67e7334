/// Matching workflow tests against an in-memory LinkedIn fake
/// Cover the acceptance flow end to end without any network traffic
use async_trait::async_trait;
use rust_wfm_linkedin::errors::AppError;
use rust_wfm_linkedin::matcher::{find_match, MatcherConfig, ProfileSearch};
use rust_wfm_linkedin::models::{
    ContactInfo, ExperienceEntry, LinkedInProfile, MatchOutcome, NoMatchReason, SearchHit,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory stand-in for the LinkedIn client, with call counters.
#[derive(Default)]
struct FakeLinkedIn {
    hits: Vec<SearchHit>,
    profiles: HashMap<String, LinkedInProfile>,
    contact_infos: HashMap<String, ContactInfo>,
    fail_search: bool,
    fail_contact_info: bool,
    search_args: Mutex<Vec<(String, String)>>,
    search_calls: AtomicUsize,
    profile_calls: AtomicUsize,
    contact_info_calls: AtomicUsize,
}

#[async_trait]
impl ProfileSearch for FakeLinkedIn {
    async fn search_people(
        &self,
        first_name: &str,
        last_name: &str,
        _limit: usize,
    ) -> Result<Vec<SearchHit>, AppError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.search_args
            .lock()
            .unwrap()
            .push((first_name.to_string(), last_name.to_string()));
        if self.fail_search {
            return Err(AppError::ExternalApiError(
                "LinkedIn returned status 500: upstream broke".to_string(),
            ));
        }
        Ok(self.hits.clone())
    }

    async fn get_profile(&self, urn: &str) -> Result<LinkedInProfile, AppError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.profiles
            .get(urn)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("No profile for {}", urn)))
    }

    async fn get_contact_info(&self, urn: &str) -> Result<ContactInfo, AppError> {
        self.contact_info_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_contact_info {
            return Err(AppError::ExternalApiError(
                "LinkedIn returned status 429: slow down".to_string(),
            ));
        }
        Ok(self.contact_infos.get(urn).cloned().unwrap_or_default())
    }
}

fn hit(urn: &str) -> SearchHit {
    SearchHit {
        urn_id: urn.to_string(),
        name: None,
        headline: None,
        location: None,
    }
}

fn profile(
    first: &str,
    last: &str,
    public_id: Option<&str>,
    experience: &[(&str, &str)],
) -> LinkedInProfile {
    LinkedInProfile {
        first_name: first.to_string(),
        last_name: last.to_string(),
        public_id: public_id.map(String::from),
        headline: None,
        location: None,
        experience: experience
            .iter()
            .map(|(company, title)| ExperienceEntry {
                company_name: Some((*company).to_string()),
                title: Some((*title).to_string()),
                period: None,
                description: None,
            })
            .collect(),
    }
}

fn expect_found(outcome: MatchOutcome) -> rust_wfm_linkedin::models::MatchResult {
    match outcome {
        MatchOutcome::Found(result) => result,
        MatchOutcome::NoMatch(reason) => panic!("Expected a match, got no match: {}", reason),
    }
}

fn expect_no_match(outcome: MatchOutcome) -> NoMatchReason {
    match outcome {
        MatchOutcome::NoMatch(reason) => reason,
        MatchOutcome::Found(result) => {
            panic!(
                "Expected no match, got {} at {:.2}",
                result.profile_url.as_deref().unwrap_or("(no public URL)"),
                result.score
            )
        }
    }
}

#[tokio::test]
async fn matching_name_and_career_is_accepted() {
    let mut fake = FakeLinkedIn::default();
    fake.hits = vec![hit("ACoAAA111")];
    fake.profiles.insert(
        "ACoAAA111".to_string(),
        profile(
            "Jane",
            "Smith",
            Some("jane-smith"),
            &[("Acme Corp", "Chief Financial Officer")],
        ),
    );

    let cfg = MatcherConfig::default();
    let outcome = find_match(&fake, "Jane Smith", Some("Acme Corp"), Some("CFO"), &cfg)
        .await
        .unwrap();

    let result = expect_found(outcome);
    assert_eq!(result.urn, "ACoAAA111");
    assert_eq!(result.matched_name, "Jane Smith");
    assert!(result.score >= cfg.score_threshold);
    assert!((result.name_similarity - 1.0).abs() < 1e-9);
    // No contact info available, so the URL comes from the public id
    assert_eq!(
        result.profile_url.as_deref(),
        Some("https://www.linkedin.com/in/jane-smith")
    );
    // The match carries the experience entries that backed the score
    assert_eq!(result.matched_company.as_deref(), Some("Acme Corp"));
    assert_eq!(
        result.matched_title.as_deref(),
        Some("Chief Financial Officer")
    );
}

#[tokio::test]
async fn matching_name_with_unrelated_career_is_rejected() {
    let mut fake = FakeLinkedIn::default();
    fake.hits = vec![hit("ACoAAA111")];
    fake.profiles.insert(
        "ACoAAA111".to_string(),
        profile(
            "Jane",
            "Smith",
            Some("jane-smith"),
            &[("Tech Mahindra", "Software Engineer")],
        ),
    );

    let cfg = MatcherConfig::default();
    let outcome = find_match(&fake, "Jane Smith", Some("Acme Corp"), Some("CFO"), &cfg)
        .await
        .unwrap();

    assert_eq!(expect_no_match(outcome), NoMatchReason::BelowThreshold);
    // A gated candidate never becomes the running best, so no contact info call
    assert_eq!(fake.contact_info_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn single_token_name_is_skipped_without_searching() {
    let fake = FakeLinkedIn::default();
    let cfg = MatcherConfig::default();

    let outcome = find_match(&fake, "Madonna", Some("Acme Corp"), None, &cfg)
        .await
        .unwrap();

    assert_eq!(expect_no_match(outcome), NoMatchReason::AmbiguousName);
    assert_eq!(fake.search_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fake.profile_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_search_results_report_no_candidates() {
    let fake = FakeLinkedIn::default();
    let cfg = MatcherConfig::default();

    let outcome = find_match(&fake, "Jane Smith", Some("Acme Corp"), Some("CFO"), &cfg)
        .await
        .unwrap();

    assert_eq!(expect_no_match(outcome), NoMatchReason::NoCandidates);
    assert_eq!(fake.search_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fake.profile_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn best_scoring_candidate_wins() {
    let mut fake = FakeLinkedIn::default();
    fake.hits = vec![hit("weaker"), hit("stronger")];
    fake.profiles.insert(
        "weaker".to_string(),
        profile(
            "Jane",
            "Smith",
            Some("jane-a"),
            &[("Acme Corporation", "Finance Director")],
        ),
    );
    fake.profiles.insert(
        "stronger".to_string(),
        profile("Jane", "Smith", Some("jane-b"), &[("Acme Corp", "CFO")]),
    );

    let cfg = MatcherConfig::default();
    let outcome = find_match(&fake, "Jane Smith", Some("Acme Corp"), Some("CFO"), &cfg)
        .await
        .unwrap();

    let result = expect_found(outcome);
    assert_eq!(result.urn, "stronger");
    assert_eq!(
        result.profile_url.as_deref(),
        Some("https://www.linkedin.com/in/jane-b")
    );
    // Both candidates became the running best in turn, one lookup each
    assert_eq!(fake.contact_info_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn only_the_top_candidates_are_evaluated() {
    let mut fake = FakeLinkedIn::default();
    for i in 1..=6 {
        let urn = format!("candidate-{}", i);
        fake.hits.push(hit(&urn));
        // The sixth candidate would match perfectly, but sits outside the
        // evaluation window and must never be fetched
        let entries: &[(&str, &str)] = if i == 6 {
            &[("Acme Corp", "CFO")]
        } else {
            &[("Tech Mahindra", "Software Engineer")]
        };
        fake.profiles
            .insert(urn, profile("Jane", "Smith", Some("jane-smith"), entries));
    }

    let cfg = MatcherConfig::default();
    let outcome = find_match(&fake, "Jane Smith", Some("Acme Corp"), Some("CFO"), &cfg)
        .await
        .unwrap();

    assert_eq!(expect_no_match(outcome), NoMatchReason::BelowThreshold);
    assert_eq!(fake.profile_calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn failed_profile_fetch_propagates_to_the_caller() {
    let mut fake = FakeLinkedIn::default();
    fake.hits = vec![hit("broken"), hit("good")];
    // No profile stored for "broken", the fetch errors out
    fake.profiles.insert(
        "good".to_string(),
        profile("Jane", "Smith", Some("jane-smith"), &[("Acme Corp", "CFO")]),
    );

    let cfg = MatcherConfig::default();
    match find_match(&fake, "Jane Smith", Some("Acme Corp"), Some("CFO"), &cfg).await {
        Err(e) => assert!(e.to_string().contains("broken")),
        Ok(outcome) => panic!("Expected the fetch failure to propagate, got {:?}", outcome),
    }
    // A match attempt with a missing answer never silently degrades, so the
    // later candidate is not reached
    assert_eq!(fake.profile_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn search_failure_propagates_to_the_caller() {
    let mut fake = FakeLinkedIn::default();
    fake.fail_search = true;

    let cfg = MatcherConfig::default();
    let result = find_match(&fake, "Jane Smith", Some("Acme Corp"), Some("CFO"), &cfg).await;

    match result {
        Err(AppError::ExternalApiError(_)) => {}
        other => panic!("Expected an upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn contact_info_url_is_preferred_over_the_public_id() {
    let mut fake = FakeLinkedIn::default();
    fake.hits = vec![hit("ACoAAA111")];
    fake.profiles.insert(
        "ACoAAA111".to_string(),
        profile("Jane", "Smith", Some("jane-smith"), &[("Acme Corp", "CFO")]),
    );
    fake.contact_infos.insert(
        "ACoAAA111".to_string(),
        ContactInfo {
            public_profile_url: Some("https://www.linkedin.com/in/jane-smith-nz".to_string()),
            email_address: None,
        },
    );

    let cfg = MatcherConfig::default();
    let outcome = find_match(&fake, "Jane Smith", Some("Acme Corp"), Some("CFO"), &cfg)
        .await
        .unwrap();

    let result = expect_found(outcome);
    assert_eq!(
        result.profile_url.as_deref(),
        Some("https://www.linkedin.com/in/jane-smith-nz")
    );
}

#[tokio::test]
async fn non_profile_contact_info_url_falls_back_to_the_public_id() {
    let mut fake = FakeLinkedIn::default();
    fake.hits = vec![hit("ACoAAA111")];
    fake.profiles.insert(
        "ACoAAA111".to_string(),
        profile("Jane", "Smith", Some("jane-smith"), &[("Acme Corp", "CFO")]),
    );
    // A company page is not a profile URL and must not be written back
    fake.contact_infos.insert(
        "ACoAAA111".to_string(),
        ContactInfo {
            public_profile_url: Some("https://www.linkedin.com/company/acme-corp".to_string()),
            email_address: None,
        },
    );

    let cfg = MatcherConfig::default();
    let outcome = find_match(&fake, "Jane Smith", Some("Acme Corp"), Some("CFO"), &cfg)
        .await
        .unwrap();

    let result = expect_found(outcome);
    assert_eq!(
        result.profile_url.as_deref(),
        Some("https://www.linkedin.com/in/jane-smith")
    );
}

#[tokio::test]
async fn contact_info_failure_propagates_to_the_caller() {
    let mut fake = FakeLinkedIn::default();
    fake.fail_contact_info = true;
    fake.hits = vec![hit("ACoAAA111")];
    fake.profiles.insert(
        "ACoAAA111".to_string(),
        profile("Jane", "Smith", Some("jane-smith"), &[("Acme Corp", "CFO")]),
    );

    let cfg = MatcherConfig::default();
    match find_match(&fake, "Jane Smith", Some("Acme Corp"), Some("CFO"), &cfg).await {
        Err(e) => assert!(e.to_string().contains("ACoAAA111")),
        Ok(outcome) => panic!(
            "Expected the contact info failure to propagate, got {:?}",
            outcome
        ),
    }
    assert_eq!(fake.contact_info_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn match_without_any_resolvable_url_is_still_reported() {
    let mut fake = FakeLinkedIn::default();
    fake.hits = vec![hit("ACoAAA111")];
    // No public id and no contact info URL: the match stands, with no URL
    fake.profiles.insert(
        "ACoAAA111".to_string(),
        profile("Jane", "Smith", None, &[("Acme Corp", "CFO")]),
    );

    let cfg = MatcherConfig::default();
    let outcome = find_match(&fake, "Jane Smith", Some("Acme Corp"), Some("CFO"), &cfg)
        .await
        .unwrap();

    let result = expect_found(outcome);
    assert_eq!(result.urn, "ACoAAA111");
    assert_eq!(result.profile_url, None);
    assert!(result.score >= cfg.score_threshold);
}

#[tokio::test]
async fn best_candidate_without_url_is_never_displaced_by_a_weaker_one() {
    let mut fake = FakeLinkedIn::default();
    fake.hits = vec![hit("runner-up"), hit("best-fit")];
    fake.profiles.insert(
        "runner-up".to_string(),
        profile(
            "Jane",
            "Smith",
            Some("jane-runner-up"),
            &[("Acme Corporation", "Finance Director")],
        ),
    );
    fake.profiles.insert(
        "best-fit".to_string(),
        profile("Jane", "Smith", None, &[("Acme Corp", "CFO")]),
    );

    let cfg = MatcherConfig::default();
    let outcome = find_match(&fake, "Jane Smith", Some("Acme Corp"), Some("CFO"), &cfg)
        .await
        .unwrap();

    // The stronger candidate wins even though only the weaker one has a URL
    let result = expect_found(outcome);
    assert_eq!(result.urn, "best-fit");
    assert_eq!(result.profile_url, None);
    assert_eq!(fake.contact_info_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn middle_names_still_search_on_first_and_rest() {
    let mut fake = FakeLinkedIn::default();
    fake.hits = vec![hit("ACoAAA111")];
    fake.profiles.insert(
        "ACoAAA111".to_string(),
        profile(
            "Mary Jane",
            "Watson",
            Some("mj-watson"),
            &[("Daily Bugle", "Photographer")],
        ),
    );

    let cfg = MatcherConfig::default();
    let outcome = find_match(
        &fake,
        "Mary Jane Watson",
        Some("Daily Bugle"),
        Some("Photographer"),
        &cfg,
    )
    .await
    .unwrap();

    let result = expect_found(outcome);
    assert_eq!(
        result.profile_url.as_deref(),
        Some("https://www.linkedin.com/in/mj-watson")
    );
    assert_eq!(fake.search_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn punctuated_names_search_with_normalized_parts() {
    let fake = FakeLinkedIn::default();
    let cfg = MatcherConfig::default();

    find_match(
        &fake,
        "Jane. Smith-Jones",
        Some("Acme Corp"),
        Some("CFO"),
        &cfg,
    )
    .await
    .unwrap();

    let args = fake.search_args.lock().unwrap();
    assert_eq!(
        *args,
        vec![("jane".to_string(), "smith jones".to_string())]
    );
}

#[tokio::test]
async fn punctuation_only_name_part_is_skipped_without_searching() {
    let fake = FakeLinkedIn::default();
    let cfg = MatcherConfig::default();

    let outcome = find_match(&fake, "Jane ...", Some("Acme Corp"), None, &cfg)
        .await
        .unwrap();

    assert_eq!(expect_no_match(outcome), NoMatchReason::AmbiguousName);
    assert_eq!(fake.search_calls.load(Ordering::SeqCst), 0);
}
