use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============ WorkflowMax Models ============

/// Represents a WorkflowMax client contact.
///
/// This is the central entity the enrichment workflow operates on. Contacts
/// arrive embedded in client records from the paginated list endpoint or
/// individually from the contact endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contact {
    /// Unique identifier for the contact.
    pub uuid: String,
    /// Full name as entered in WorkflowMax.
    pub name: String,
    /// Email address, if recorded.
    pub email: Option<String>,
    /// Mobile number, if recorded.
    pub mobile: Option<String>,
    /// Landline number, if recorded.
    pub phone: Option<String>,
    /// Salutation (e.g. "Dr").
    pub salutation: Option<String>,
    /// Addressee line used in correspondence.
    pub addressee: Option<String>,
    /// Whether this is the primary contact of its client.
    pub is_primary: bool,
    /// Positions this contact holds across client companies.
    pub positions: Vec<Position>,
}

impl Contact {
    /// Company name from the primary position, falling back to the first.
    pub fn company_name(&self) -> Option<&str> {
        self.positions
            .iter()
            .find(|p| p.is_primary)
            .or_else(|| self.positions.first())
            .and_then(|p| p.company_name.as_deref())
    }

    /// Position title from the primary position, falling back to the first.
    pub fn position_title(&self) -> Option<&str> {
        self.positions
            .iter()
            .find(|p| p.is_primary)
            .or_else(|| self.positions.first())
            .and_then(|p| p.title.as_deref())
    }
}

/// A position a contact holds at a client company.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Position {
    pub uuid: String,
    /// Job title (the `Position` element on the wire).
    pub title: Option<String>,
    /// Company name (the `Name` element on the wire).
    pub company_name: Option<String>,
    pub client_uuid: Option<String>,
    pub include_in_emails: bool,
    pub is_primary: bool,
}

/// One page of contacts from the paginated client list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactPage {
    pub contacts: Vec<Contact>,
    /// Page number reported by the API (1-based).
    pub page: u32,
    /// Total records across all pages.
    pub total_records: u32,
}

impl ContactPage {
    /// Whether more pages remain after this one.
    pub fn has_more(&self, page_size: usize) -> bool {
        (self.page as u64) * (page_size as u64) < self.total_records as u64
    }
}

/// WorkflowMax custom field data types.
///
/// The API reports a type string per definition; the type decides which XML
/// element carries the value when reading and writing field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomFieldType {
    Text,
    MultilineText,
    Number,
    Decimal,
    Date,
    Boolean,
    Select,
    Link,
}

impl CustomFieldType {
    /// Parses the type string the API reports, including the legacy aliases
    /// `Checkbox` (Boolean) and `Dropdown List` (Select).
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Text" => Some(Self::Text),
            "Multi-line Text" => Some(Self::MultilineText),
            "Number" => Some(Self::Number),
            "Decimal" => Some(Self::Decimal),
            "Date" => Some(Self::Date),
            "Boolean" | "Checkbox" => Some(Self::Boolean),
            "Select" | "Dropdown List" => Some(Self::Select),
            "Link" => Some(Self::Link),
            _ => None,
        }
    }

    /// XML element name that carries a value of this type.
    pub fn value_element(&self) -> &'static str {
        match self {
            Self::Number => "Number",
            Self::Decimal => "Decimal",
            Self::Date => "Date",
            Self::Boolean => "Boolean",
            Self::Link => "LinkURL",
            _ => "Value",
        }
    }
}

/// A custom field definition from the account-wide definition list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomFieldDefinition {
    pub uuid: String,
    pub name: String,
    pub field_type: CustomFieldType,
    /// Options for Select fields.
    pub options: Vec<String>,
    pub use_client: bool,
    pub use_contact: bool,
    pub use_job: bool,
    pub use_lead: bool,
}

/// A custom field value attached to a contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomFieldValue {
    pub name: String,
    pub value: Option<String>,
}

// ============ LinkedIn Models ============

/// A hit from the LinkedIn people search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Profile URN identifier used for follow-up profile requests.
    pub urn_id: String,
    pub name: Option<String>,
    pub headline: Option<String>,
    pub location: Option<String>,
}

/// A LinkedIn profile with the fields the matcher scores against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkedInProfile {
    pub first_name: String,
    pub last_name: String,
    /// Public identifier, used to build a profile URL when the contact-info
    /// endpoint exposes none.
    pub public_id: Option<String>,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub experience: Vec<ExperienceEntry>,
}

impl LinkedInProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// One experience entry on a profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub company_name: Option<String>,
    pub title: Option<String>,
    pub period: Option<TimePeriod>,
    pub description: Option<String>,
}

/// Time span of an experience entry.
///
/// LinkedIn reports month/year pairs, so days are normalised to the first
/// of the month. An entry for a current role has no `end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePeriod {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Contact information exposed by a profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    pub public_profile_url: Option<String>,
    pub email_address: Option<String>,
}

// ============ Match Models ============

/// A successful match between a WorkflowMax contact and a LinkedIn profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    /// Resolved public profile URL. `None` when neither the contact info
    /// nor the public identifier yielded a usable URL.
    pub profile_url: Option<String>,
    /// Weighted confidence score in [0, 1].
    pub score: f64,
    /// Full name of the matched profile.
    pub matched_name: String,
    /// URN of the matched profile.
    pub urn: String,
    pub name_similarity: f64,
    pub experience_similarity: f64,
    /// Company from the candidate's experience that scored closest to the
    /// contact's company, if any experience was listed.
    pub matched_company: Option<String>,
    /// Title from the candidate's experience that scored closest to the
    /// contact's title, if any experience was listed.
    pub matched_title: Option<String>,
}

/// Why a match attempt produced no result. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoMatchReason {
    /// Single-token name, too ambiguous to search.
    AmbiguousName,
    /// The search returned no candidates.
    NoCandidates,
    /// Candidates existed but none reached the confidence threshold.
    BelowThreshold,
}

impl std::fmt::Display for NoMatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoMatchReason::AmbiguousName => write!(f, "name is too ambiguous to search"),
            NoMatchReason::NoCandidates => write!(f, "search returned no candidates"),
            NoMatchReason::BelowThreshold => {
                write!(f, "no candidate reached the confidence threshold")
            }
        }
    }
}

/// Outcome of a match attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MatchOutcome {
    Found(MatchResult),
    NoMatch(NoMatchReason),
}

impl MatchOutcome {
    pub fn found(&self) -> Option<&MatchResult> {
        match self {
            MatchOutcome::Found(result) => Some(result),
            MatchOutcome::NoMatch(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(title: &str, company: &str, primary: bool) -> Position {
        Position {
            uuid: "pos-1".to_string(),
            title: Some(title.to_string()),
            company_name: Some(company.to_string()),
            client_uuid: None,
            include_in_emails: false,
            is_primary: primary,
        }
    }

    #[test]
    fn contact_prefers_primary_position() {
        let contact = Contact {
            positions: vec![
                position("Analyst", "Old Corp", false),
                position("CFO", "Acme Corp", true),
            ],
            ..Default::default()
        };
        assert_eq!(contact.company_name(), Some("Acme Corp"));
        assert_eq!(contact.position_title(), Some("CFO"));
    }

    #[test]
    fn contact_falls_back_to_first_position() {
        let contact = Contact {
            positions: vec![
                position("Analyst", "Old Corp", false),
                position("CFO", "Acme Corp", false),
            ],
            ..Default::default()
        };
        assert_eq!(contact.company_name(), Some("Old Corp"));
        assert_eq!(contact.position_title(), Some("Analyst"));
    }

    #[test]
    fn contact_without_positions_has_no_company() {
        let contact = Contact::default();
        assert_eq!(contact.company_name(), None);
        assert_eq!(contact.position_title(), None);
    }

    #[test]
    fn page_has_more_uses_total_records() {
        let page = ContactPage {
            contacts: vec![],
            page: 1,
            total_records: 120,
        };
        assert!(page.has_more(50));

        let last = ContactPage {
            contacts: vec![],
            page: 3,
            total_records: 120,
        };
        assert!(!last.has_more(50));
    }

    #[test]
    fn custom_field_type_parses_wire_aliases() {
        assert_eq!(
            CustomFieldType::from_wire("Checkbox"),
            Some(CustomFieldType::Boolean)
        );
        assert_eq!(
            CustomFieldType::from_wire("Dropdown List"),
            Some(CustomFieldType::Select)
        );
        assert_eq!(
            CustomFieldType::from_wire("Multi-line Text"),
            Some(CustomFieldType::MultilineText)
        );
        assert_eq!(CustomFieldType::from_wire("Telepathy"), None);
    }

    #[test]
    fn custom_field_type_value_elements() {
        assert_eq!(CustomFieldType::Link.value_element(), "LinkURL");
        assert_eq!(CustomFieldType::Boolean.value_element(), "Boolean");
        assert_eq!(CustomFieldType::Text.value_element(), "Value");
        assert_eq!(CustomFieldType::Select.value_element(), "Value");
    }

    #[test]
    fn profile_full_name_trims_missing_parts() {
        let profile = LinkedInProfile {
            first_name: "Jane".to_string(),
            last_name: String::new(),
            ..Default::default()
        };
        assert_eq!(profile.full_name(), "Jane");
    }
}
