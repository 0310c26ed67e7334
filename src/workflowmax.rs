use crate::circuit_breaker::{create_api_circuit_breaker, ApiCircuitBreaker};
use crate::config::Config;
use crate::errors::AppError;
use crate::models::{
    Contact, ContactPage, CustomFieldDefinition, CustomFieldType, CustomFieldValue, Position,
};
use failsafe::futures::CircuitBreaker;
use moka::future::Cache;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Name of the custom field that stores a contact's LinkedIn profile URL.
pub const LINKEDIN_PROFILE_FIELD: &str = "LINKEDIN PROFILE";

/// Statuses worth retrying: rate limiting and transient upstream failures.
const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];
const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 500;

const DEFINITIONS_CACHE_KEY: &str = "customfield_definitions";

fn retry_delay(attempt: u32) -> Duration {
    Duration::from_millis(RETRY_BASE_DELAY_MS * 2u64.pow(attempt.saturating_sub(1)))
}

/// Validates that an identifier is a UUID before it reaches the network.
fn ensure_uuid(candidate: &str, what: &str) -> Result<(), AppError> {
    Uuid::parse_str(candidate.trim())
        .map(|_| ())
        .map_err(|_| AppError::BadRequest(format!("Invalid {} '{}', expected a UUID", what, candidate)))
}

/// Client for the WorkflowMax API.
///
/// All endpoints speak XML and authenticate with a pre-acquired bearer token
/// plus the account id header. Transient failures are retried with
/// exponential backoff, and a circuit breaker fails fast once the upstream
/// keeps erroring. Custom field definitions change rarely and are cached.
#[derive(Clone)]
pub struct WorkflowMaxClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    account_id: String,
    breaker: Arc<ApiCircuitBreaker>,
    definitions_cache: Cache<String, Arc<Vec<CustomFieldDefinition>>>,
}

impl WorkflowMaxClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create WorkflowMax client: {}", e))
            })?;

        let definitions_cache = Cache::builder()
            .time_to_live(Duration::from_secs(config.definitions_cache_ttl_secs))
            .max_capacity(4)
            .build();

        Ok(Self {
            client,
            base_url: config.wfm_base_url.trim_end_matches('/').to_string(),
            access_token: config.wfm_access_token.clone(),
            account_id: config.wfm_account_id.clone(),
            breaker: Arc::new(create_api_circuit_breaker()),
            definitions_cache,
        })
    }

    /// Fetches one page of the detailed client list with embedded contacts.
    pub async fn list_contacts(&self, page: usize, page_size: usize) -> Result<ContactPage, AppError> {
        let page_param = page.to_string();
        let size_param = page_size.to_string();
        let url = Url::parse_with_params(
            &format!("{}/client.api/list", self.base_url),
            &[
                ("page", page_param.as_str()),
                ("pagesize", size_param.as_str()),
                ("detailed", "true"),
            ],
        )
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        tracing::debug!("Fetching WorkflowMax contact page {}", page);
        let xml = self.get_xml(url, "client list").await?;
        let parsed = parse_contact_page(&xml)?;
        tracing::debug!(
            "Page {} holds {} contact(s) of {} total records",
            parsed.page,
            parsed.contacts.len(),
            parsed.total_records
        );
        Ok(parsed)
    }

    /// Searches contacts by free-text query.
    ///
    /// Without a query this is a detailed list page. The search endpoint
    /// answers in the client-list shape, so the same parser applies.
    pub async fn search_contacts(
        &self,
        query: Option<&str>,
        page: usize,
        page_size: usize,
    ) -> Result<ContactPage, AppError> {
        let page_param = page.to_string();
        let size_param = page_size.to_string();
        let mut params = vec![
            ("page", page_param.as_str()),
            ("pagesize", size_param.as_str()),
            ("detailed", "true"),
        ];
        if let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) {
            params.push(("query", query));
        }
        let url = Url::parse_with_params(&format!("{}/client.api/search", self.base_url), params)
            .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        tracing::debug!("Searching WorkflowMax contacts (page {})", page);
        let xml = self.get_xml(url, "contact search").await?;
        let parsed = parse_contact_page(&xml)?;
        tracing::debug!(
            "Search page {} holds {} contact(s) of {} total records",
            parsed.page,
            parsed.contacts.len(),
            parsed.total_records
        );
        Ok(parsed)
    }

    /// Fetches a single contact by UUID.
    pub async fn get_contact(&self, contact_uuid: &str) -> Result<Contact, AppError> {
        ensure_uuid(contact_uuid, "contact UUID")?;

        let url = Url::parse(&format!(
            "{}/client.api/contact/{}",
            self.base_url, contact_uuid
        ))
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        let xml = self.get_xml(url, "contact").await?;
        let page = parse_contact_page(&xml)?;
        page.contacts
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Contact {} not found", contact_uuid)))
    }

    /// Fetches the custom field values currently set on a contact.
    pub async fn get_custom_fields(
        &self,
        contact_uuid: &str,
    ) -> Result<Vec<CustomFieldValue>, AppError> {
        ensure_uuid(contact_uuid, "contact UUID")?;

        let url = Url::parse(&format!(
            "{}/client.api/contact/{}/customfield",
            self.base_url, contact_uuid
        ))
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        let xml = self.get_xml(url, "contact custom fields").await?;
        parse_custom_field_values(&xml)
    }

    /// Writes one custom field value on a contact.
    ///
    /// The definition decides which XML element carries the value, so a Link
    /// field is written as `LinkURL` while a plain Text field uses `Value`.
    pub async fn set_custom_field(
        &self,
        contact_uuid: &str,
        definition: &CustomFieldDefinition,
        value: &str,
    ) -> Result<(), AppError> {
        ensure_uuid(contact_uuid, "contact UUID")?;

        let url = Url::parse(&format!(
            "{}/client.api/contact/{}/customfield",
            self.base_url, contact_uuid
        ))
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        let payload = build_custom_fields_payload(&[(
            definition.name.as_str(),
            definition.field_type.value_element(),
            value,
        )]);

        let xml = self.put_xml(url, payload, "custom field update").await?;
        ensure_ok_status(&xml)?;
        tracing::info!(
            "✓ Updated custom field '{}' on contact {}",
            definition.name,
            contact_uuid
        );
        Ok(())
    }

    /// Account-wide custom field definitions, cached between calls.
    pub async fn get_definitions(&self) -> Result<Arc<Vec<CustomFieldDefinition>>, AppError> {
        if let Some(cached) = self.definitions_cache.get(DEFINITIONS_CACHE_KEY).await {
            tracing::debug!("Custom field definitions served from cache");
            return Ok(cached);
        }

        let url = Url::parse(&format!("{}/customfield.api/definition", self.base_url))
            .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        let xml = self.get_xml(url, "custom field definitions").await?;
        let definitions = Arc::new(parse_definitions(&xml)?);
        tracing::info!("Loaded {} custom field definition(s)", definitions.len());

        self.definitions_cache
            .insert(DEFINITIONS_CACHE_KEY.to_string(), definitions.clone())
            .await;
        Ok(definitions)
    }

    /// Looks up a contact-scoped custom field definition by name.
    pub async fn contact_field_definition(
        &self,
        field_name: &str,
    ) -> Result<CustomFieldDefinition, AppError> {
        let definitions = self.get_definitions().await?;
        definitions
            .iter()
            .find(|d| d.use_contact && d.name.eq_ignore_ascii_case(field_name))
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No contact custom field named '{}' is defined in this account",
                    field_name
                ))
            })
    }

    /// The contact-scoped definition backing the LinkedIn profile field.
    pub async fn linkedin_field_definition(&self) -> Result<CustomFieldDefinition, AppError> {
        self.contact_field_definition(LINKEDIN_PROFILE_FIELD).await
    }

    /// The LinkedIn URL currently stored on a contact, if any.
    pub async fn linkedin_url_of(&self, contact_uuid: &str) -> Result<Option<String>, AppError> {
        let fields = self.get_custom_fields(contact_uuid).await?;
        Ok(fields
            .into_iter()
            .find(|f| f.name.eq_ignore_ascii_case(LINKEDIN_PROFILE_FIELD))
            .and_then(|f| f.value)
            .filter(|v| !v.trim().is_empty()))
    }

    /// Stores a LinkedIn URL in the contact's profile field.
    pub async fn set_linkedin_url(&self, contact_uuid: &str, url: &str) -> Result<(), AppError> {
        let definition = self.linkedin_field_definition().await?;
        self.set_custom_field(contact_uuid, &definition, url).await
    }

    async fn get_xml(&self, url: Url, what: &str) -> Result<String, AppError> {
        self.execute(reqwest::Method::GET, url, None, what).await
    }

    async fn put_xml(&self, url: Url, body: String, what: &str) -> Result<String, AppError> {
        self.execute(reqwest::Method::PUT, url, Some(body), what)
            .await
    }

    /// Sends a request with retry on transient statuses and a circuit breaker
    /// around the transport.
    async fn execute(
        &self,
        method: reqwest::Method,
        url: Url,
        body: Option<String>,
        what: &str,
    ) -> Result<String, AppError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let mut request = self
                .client
                .request(method.clone(), url.clone())
                .header("Authorization", format!("Bearer {}", self.access_token))
                .header("account_id", &self.account_id)
                .header("Accept", "application/xml");
            if let Some(ref payload) = body {
                request = request
                    .header("Content-Type", "application/xml")
                    .body(payload.clone());
            }

            let response = match self.breaker.call(request.send()).await {
                Ok(response) => response,
                Err(failsafe::Error::Rejected) => {
                    return Err(AppError::ExternalApiError(format!(
                        "WorkflowMax circuit breaker is open, skipped {}",
                        what
                    )));
                }
                Err(failsafe::Error::Inner(e)) => {
                    if attempt < MAX_ATTEMPTS {
                        let delay = retry_delay(attempt);
                        tracing::warn!(
                            "WorkflowMax request for {} failed ({}), retrying in {:?} (attempt {}/{})",
                            what,
                            e,
                            delay,
                            attempt,
                            MAX_ATTEMPTS
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(AppError::ExternalApiError(format!(
                        "WorkflowMax request for {} failed: {}",
                        what, e
                    )));
                }
            };

            let status = response.status();
            if RETRYABLE_STATUSES.contains(&status.as_u16()) && attempt < MAX_ATTEMPTS {
                let delay = retry_delay(attempt);
                tracing::warn!(
                    "WorkflowMax returned {} for {}, retrying in {:?} (attempt {}/{})",
                    status,
                    what,
                    delay,
                    attempt,
                    MAX_ATTEMPTS
                );
                tokio::time::sleep(delay).await;
                continue;
            }
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(AppError::Unauthorized(format!(
                    "WorkflowMax rejected credentials for {} (status {})",
                    what, status
                )));
            }
            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                tracing::error!(
                    "WorkflowMax returned error {} for {}: {}",
                    status,
                    what,
                    error_text
                );
                return Err(AppError::ExternalApiError(format!(
                    "WorkflowMax returned status {}: {}",
                    status, error_text
                )));
            }

            return response.text().await.map_err(|e| {
                AppError::ExternalApiError(format!(
                    "Failed to read WorkflowMax {} response: {}",
                    what, e
                ))
            });
        }
    }
}

// ============ XML parsing ============

fn parse_bool(text: &str) -> bool {
    matches!(text.trim().to_lowercase().as_str(), "true" | "yes")
}

fn xml_error(e: quick_xml::Error) -> AppError {
    AppError::ExternalApiError(format!("Failed to parse WorkflowMax XML: {}", e))
}

#[derive(Default)]
struct PageState {
    page: ContactPage,
    status: Option<String>,
    client_name: Option<String>,
    contact: Option<Contact>,
    position: Option<Position>,
}

fn apply_page_text(path: &[String], text: String, st: &mut PageState) {
    let last = path.last().map(String::as_str);
    let parent = path
        .len()
        .checked_sub(2)
        .and_then(|i| path.get(i))
        .map(String::as_str);

    match (parent, last) {
        (Some("Response"), Some("Status")) => st.status = Some(text),
        (Some("Response"), Some("TotalRecords")) => {
            st.page.total_records = text.trim().parse().unwrap_or(0)
        }
        (Some("Response"), Some("Page")) => st.page.page = text.trim().parse().unwrap_or(0),
        (Some("Client"), Some("Name")) => st.client_name = Some(text),
        (Some("Contact"), Some("UUID")) => {
            if let Some(c) = st.contact.as_mut() {
                c.uuid = text;
            }
        }
        (Some("Contact"), Some("Name")) => {
            if let Some(c) = st.contact.as_mut() {
                c.name = text;
            }
        }
        (Some("Contact"), Some("Email")) => {
            if let Some(c) = st.contact.as_mut() {
                c.email = Some(text);
            }
        }
        (Some("Contact"), Some("Mobile")) => {
            if let Some(c) = st.contact.as_mut() {
                c.mobile = Some(text);
            }
        }
        (Some("Contact"), Some("Phone")) => {
            if let Some(c) = st.contact.as_mut() {
                c.phone = Some(text);
            }
        }
        (Some("Contact"), Some("Salutation")) => {
            if let Some(c) = st.contact.as_mut() {
                c.salutation = Some(text);
            }
        }
        (Some("Contact"), Some("Addressee")) => {
            if let Some(c) = st.contact.as_mut() {
                c.addressee = Some(text);
            }
        }
        (Some("Contact"), Some("IsPrimary")) => {
            if let Some(c) = st.contact.as_mut() {
                c.is_primary = parse_bool(&text);
            }
        }
        (Some("Position"), Some("UUID")) => {
            if let Some(p) = st.position.as_mut() {
                p.uuid = text;
            }
        }
        // Inside a position record, the title itself is a <Position> element
        (Some("Position"), Some("Position")) => {
            if let Some(p) = st.position.as_mut() {
                p.title = Some(text);
            }
        }
        (Some("Position"), Some("Name")) => {
            if let Some(p) = st.position.as_mut() {
                p.company_name = Some(text);
            }
        }
        (Some("Position"), Some("ClientUUID")) => {
            if let Some(p) = st.position.as_mut() {
                p.client_uuid = Some(text);
            }
        }
        (Some("Position"), Some("IncludeInEmails")) => {
            if let Some(p) = st.position.as_mut() {
                p.include_in_emails = parse_bool(&text);
            }
        }
        (Some("Position"), Some("IsPrimary")) => {
            if let Some(p) = st.position.as_mut() {
                p.is_primary = parse_bool(&text);
            }
        }
        _ => {}
    }
}

/// Parses a detailed client-list page or a single-contact response.
///
/// Contacts listed without any position inherit the enclosing client as
/// their company, matching how the list endpoint reports contacts that were
/// never assigned a formal position.
fn parse_contact_page(xml: &str) -> Result<ContactPage, AppError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut st = PageState::default();
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match name.as_str() {
                    "Contact" => st.contact = Some(Contact::default()),
                    "Position" if path.last().map(String::as_str) == Some("Positions") => {
                        st.position = Some(Position::default())
                    }
                    _ => {}
                }
                path.push(name);
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(xml_error)?.into_owned();
                if !text.trim().is_empty() {
                    apply_page_text(&path, text, &mut st);
                }
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                if !text.trim().is_empty() {
                    apply_page_text(&path, text, &mut st);
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                path.pop();
                match name.as_str() {
                    "Position" if path.last().map(String::as_str) == Some("Positions") => {
                        if let (Some(c), Some(p)) = (st.contact.as_mut(), st.position.take()) {
                            c.positions.push(p);
                        }
                    }
                    "Contact" => {
                        if let Some(mut contact) = st.contact.take() {
                            if contact.positions.is_empty() {
                                if let Some(client) = st.client_name.clone() {
                                    contact.positions.push(Position {
                                        company_name: Some(client),
                                        ..Default::default()
                                    });
                                }
                            }
                            st.page.contacts.push(contact);
                        }
                    }
                    "Client" => st.client_name = None,
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
    }

    if let Some(status) = st.status {
        if status != "OK" {
            return Err(AppError::ExternalApiError(format!(
                "WorkflowMax response status {}",
                status
            )));
        }
    }
    Ok(st.page)
}

/// Elements that can carry a custom field value, one per field type.
const VALUE_ELEMENTS: [&str; 6] = ["Value", "Boolean", "Date", "Number", "Decimal", "LinkURL"];

fn parse_custom_field_values(xml: &str) -> Result<Vec<CustomFieldValue>, AppError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut fields = Vec::new();
    let mut status: Option<String> = None;
    let mut current: Option<CustomFieldValue> = None;
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "CustomField" {
                    current = Some(CustomFieldValue {
                        name: String::new(),
                        value: None,
                    });
                }
                path.push(name);
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(xml_error)?.into_owned();
                let last = path.last().map(String::as_str);
                let parent = path
                    .len()
                    .checked_sub(2)
                    .and_then(|i| path.get(i))
                    .map(String::as_str);
                match (parent, last) {
                    (Some("Response"), Some("Status")) => status = Some(text),
                    (Some("CustomField"), Some("Name")) => {
                        if let Some(f) = current.as_mut() {
                            f.name = text;
                        }
                    }
                    (Some("CustomField"), Some(element))
                        if VALUE_ELEMENTS.contains(&element) =>
                    {
                        if let Some(f) = current.as_mut() {
                            f.value = Some(text);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                path.pop();
                if name == "CustomField" {
                    if let Some(field) = current.take() {
                        if !field.name.is_empty() {
                            fields.push(field);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
    }

    if let Some(status) = status {
        if status != "OK" {
            return Err(AppError::ExternalApiError(format!(
                "WorkflowMax response status {}",
                status
            )));
        }
    }
    Ok(fields)
}

#[derive(Default)]
struct DefinitionScratch {
    uuid: String,
    name: String,
    field_type: Option<CustomFieldType>,
    options: Vec<String>,
    use_client: bool,
    use_contact: bool,
    use_job: bool,
    use_lead: bool,
}

fn parse_definitions(xml: &str) -> Result<Vec<CustomFieldDefinition>, AppError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut definitions = Vec::new();
    let mut status: Option<String> = None;
    let mut current: Option<DefinitionScratch> = None;
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "CustomFieldDefinition" {
                    current = Some(DefinitionScratch::default());
                }
                path.push(name);
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(xml_error)?.into_owned();
                let last = path.last().map(String::as_str);
                let parent = path
                    .len()
                    .checked_sub(2)
                    .and_then(|i| path.get(i))
                    .map(String::as_str);
                match (parent, last) {
                    (Some("Response"), Some("Status")) => status = Some(text),
                    (Some("CustomFieldDefinition"), Some("UUID")) => {
                        if let Some(d) = current.as_mut() {
                            d.uuid = text;
                        }
                    }
                    (Some("CustomFieldDefinition"), Some("Name")) => {
                        if let Some(d) = current.as_mut() {
                            d.name = text;
                        }
                    }
                    (Some("CustomFieldDefinition"), Some("Type")) => {
                        if let Some(d) = current.as_mut() {
                            d.field_type = CustomFieldType::from_wire(&text);
                        }
                    }
                    (Some("Options"), Some("Option")) => {
                        if let Some(d) = current.as_mut() {
                            d.options.push(text);
                        }
                    }
                    (Some("CustomFieldDefinition"), Some("UseClient")) => {
                        if let Some(d) = current.as_mut() {
                            d.use_client = parse_bool(&text);
                        }
                    }
                    (Some("CustomFieldDefinition"), Some("UseContact")) => {
                        if let Some(d) = current.as_mut() {
                            d.use_contact = parse_bool(&text);
                        }
                    }
                    (Some("CustomFieldDefinition"), Some("UseJob")) => {
                        if let Some(d) = current.as_mut() {
                            d.use_job = parse_bool(&text);
                        }
                    }
                    (Some("CustomFieldDefinition"), Some("UseLead")) => {
                        if let Some(d) = current.as_mut() {
                            d.use_lead = parse_bool(&text);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                path.pop();
                if name == "CustomFieldDefinition" {
                    if let Some(scratch) = current.take() {
                        match scratch.field_type {
                            Some(field_type) => definitions.push(CustomFieldDefinition {
                                uuid: scratch.uuid,
                                name: scratch.name,
                                field_type,
                                options: scratch.options,
                                use_client: scratch.use_client,
                                use_contact: scratch.use_contact,
                                use_job: scratch.use_job,
                                use_lead: scratch.use_lead,
                            }),
                            None => tracing::warn!(
                                "Skipping custom field definition '{}' with unrecognized type",
                                scratch.name
                            ),
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
    }

    if let Some(status) = status {
        if status != "OK" {
            return Err(AppError::ExternalApiError(format!(
                "WorkflowMax response status {}",
                status
            )));
        }
    }
    Ok(definitions)
}

/// Builds the `<CustomFields>` payload for a field update.
fn build_custom_fields_payload(fields: &[(&str, &str, &str)]) -> String {
    let mut payload = String::from("<CustomFields>");
    for (name, element, value) in fields {
        payload.push_str("<CustomField>");
        payload.push_str(&format!("<Name>{}</Name>", escape(name)));
        payload.push_str(&format!("<{el}>{}</{el}>", escape(value), el = element));
        payload.push_str("</CustomField>");
    }
    payload.push_str("</CustomFields>");
    payload
}

/// Checks the `<Status>` element of a write response.
fn ensure_ok_status(xml: &str) -> Result<(), AppError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut in_status = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => in_status = e.name().as_ref() == b"Status",
            Ok(Event::Text(e)) if in_status => {
                let text = e.unescape().map_err(xml_error)?.into_owned();
                if text.trim() == "OK" {
                    return Ok(());
                }
                return Err(AppError::ExternalApiError(format!(
                    "WorkflowMax rejected the update: status {}",
                    text.trim()
                )));
            }
            Ok(Event::End(_)) => in_status = false,
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
    }

    Err(AppError::ExternalApiError(
        "WorkflowMax update response carried no status".to_string(),
    ))
}
