use crate::models::ExperienceEntry;
use crate::similarity::similarity;
use serde::Serialize;

/// Similarity at or above this level counts as a high-confidence hit.
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Result of scanning a profile's experience entries against a contact's
/// known company and position title.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExperienceAnalysis {
    /// Best company similarity across all entries.
    pub company_similarity: f64,
    /// Best title similarity across all entries.
    pub title_similarity: f64,
    /// Original company string that produced the best company score.
    pub best_company: Option<String>,
    /// Original title string that produced the best title score.
    pub best_title: Option<String>,
    pub has_company_match: bool,
    pub has_title_match: bool,
}

impl ExperienceAnalysis {
    /// Overall experience similarity: the better of company and title.
    pub fn overall(&self) -> f64 {
        self.company_similarity.max(self.title_similarity)
    }
}

/// Scans every experience entry and keeps the best company and title scores.
///
/// All entries are visited, never just the first hit: a person's current
/// position is often not the one that matches the contact record. Entries
/// with a missing company or title simply contribute nothing for that
/// component, and an absent target skips that comparison entirely, so the
/// function cannot fail on sparse profiles.
pub fn analyze_experience(
    entries: &[ExperienceEntry],
    target_company: Option<&str>,
    target_title: Option<&str>,
) -> ExperienceAnalysis {
    let mut analysis = ExperienceAnalysis::default();
    let target_company = target_company.map(str::trim).filter(|s| !s.is_empty());
    let target_title = target_title.map(str::trim).filter(|s| !s.is_empty());

    for entry in entries {
        if let (Some(company), Some(target)) = (entry.company_name.as_deref(), target_company) {
            if !company.trim().is_empty() {
                let score = similarity(company, target);
                if score > analysis.company_similarity {
                    analysis.company_similarity = score;
                    analysis.best_company = Some(company.to_string());
                }
            }
        }

        if let (Some(title), Some(target)) = (entry.title.as_deref(), target_title) {
            if !title.trim().is_empty() {
                let score = similarity(title, target);
                if score > analysis.title_similarity {
                    analysis.title_similarity = score;
                    analysis.best_title = Some(title.to_string());
                }
            }
        }
    }

    analysis.has_company_match = analysis.company_similarity >= HIGH_CONFIDENCE_THRESHOLD;
    analysis.has_title_match = analysis.title_similarity >= HIGH_CONFIDENCE_THRESHOLD;
    analysis
}
