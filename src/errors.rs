//! Error taxonomy shared by the WorkflowMax and LinkedIn clients.
//!
//! Everything fallible in the crate returns [`AppError`]. Callers that need
//! to say what they were doing when a call failed wrap the error through
//! [`ResultExt`], which chains context messages the way `anyhow::Context`
//! does without giving up the typed variants.

use std::fmt;

#[derive(Debug, Clone)]
pub enum AppError {
    /// A contact, custom field definition, or profile does not exist.
    NotFound(String),
    /// Input rejected before any network call was made.
    BadRequest(String),
    /// WorkflowMax or LinkedIn failed: transport error, open circuit, or an
    /// error status that the retry policy gave up on.
    ExternalApiError(String),
    /// A bug or broken invariant on our side.
    InternalError(String),
    /// Credentials rejected (401/403): expired OAuth token on the
    /// WorkflowMax side, expired li_at session cookie on the LinkedIn side.
    Unauthorized(String),
    /// An error wrapped with a description of the operation that hit it.
    WithContext {
        source: Box<AppError>,
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::ExternalApiError(msg) => write!(f, "External API error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::WithContext { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalApiError(err.to_string())
    }
}

/// Adds a context layer onto a failed result.
pub trait ResultExt<T> {
    /// Wraps the error with `context`, evaluated eagerly.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Wraps the error with the message `f` produces. Use this when building
    /// the message costs an allocation that the success path should skip.
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        let context = context.into();
        self.with_context(|| context)
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Lets transport results take context directly, without a `From` hop at
/// every call site.
impl<T> ResultExt<T> for Result<T, reqwest::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(AppError::from).context(context)
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(AppError::from).with_context(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_chain_reads_outside_in() {
        let inner: Result<(), AppError> =
            Err(AppError::ExternalApiError("status 502".to_string()));
        let err = inner.context("Failed to match contact Jane Smith").unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to match contact Jane Smith: External API error: status 502"
        );
    }

    #[test]
    fn with_context_leaves_success_untouched() {
        let ok: Result<u32, AppError> = Ok(7);
        let value = ok
            .with_context(|| unreachable!("context must not be built on success"))
            .unwrap();

        assert_eq!(value, 7);
    }

    #[test]
    fn source_exposes_the_wrapped_error() {
        let outer: Result<(), AppError> =
            Err(AppError::NotFound("contact 1f0e2b".to_string()));
        let err = outer.context("Fetching contact").unwrap_err();

        let source = std::error::Error::source(&err).expect("wrapped source");
        assert_eq!(source.to_string(), "Not found: contact 1f0e2b");
    }

    #[test]
    fn plain_variants_have_no_source() {
        let err = AppError::Unauthorized("token expired".to_string());
        assert!(std::error::Error::source(&err).is_none());
    }
}
