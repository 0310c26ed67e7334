//! WorkflowMax LinkedIn Enrichment Library
//!
//! This library links WorkflowMax contacts to their LinkedIn profiles. It
//! pages through contacts, searches LinkedIn people search for each one,
//! scores the candidates by name and work-history similarity, and writes the
//! accepted profile URL into a WorkflowMax custom field.
//!
//! # Modules
//!
//! - `cache_validator`: Checksum validation for cached profile data.
//! - `circuit_breaker`: Circuit breaker for outbound API calls.
//! - `config`: Configuration management.
//! - `enrichment`: Batch and single-contact update flows.
//! - `errors`: Error handling types.
//! - `experience`: Work-history similarity analysis.
//! - `linkedin`: LinkedIn Voyager API client.
//! - `matcher`: Candidate evaluation and scoring.
//! - `models`: Core data models.
//! - `similarity`: Text normalization and string similarity.
//! - `workflowmax`: WorkflowMax API client.

pub mod cache_validator;
pub mod circuit_breaker;
pub mod config;
pub mod enrichment;
pub mod errors;
pub mod experience;
pub mod linkedin;
pub mod matcher;
pub mod models;
pub mod similarity;
pub mod workflowmax;
