//! Request body and settings validation
//!
//! Bodies are decoded in two steps: first to a JSON value, which must be an
//! object, then into the request struct. Serde's derived struct visitors
//! also accept sequences, so `["<uuid>", "text"]` would otherwise decode as
//! a positional request.

use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Result, TriageError};
use crate::models::{CreateTicketRequest, ReplyRequest, TicketReply};

/// Validation utilities for request bodies and settings
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Parse the body of a create-ticket request.
    ///
    /// An empty body, `null` and `{}` all mean "no organization given".
    /// Returns the organization id if one was supplied.
    pub fn parse_create_body(body: &[u8]) -> Result<Option<Uuid>> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let request: Option<CreateTicketRequest> = match parse_json(body)? {
            Value::Null => None,
            value => Some(decode_object(value)?),
        };

        match request.and_then(|r| r.org_id) {
            Some(org_id) => Self::validate_optional_uuid("orgId", &org_id),
            None => Ok(None),
        }
    }

    /// Parse and validate the body of a reply request
    pub fn parse_reply_body(body: &[u8]) -> Result<TicketReply> {
        let request: ReplyRequest = decode_object(parse_json(body)?)?;
        Self::validate_reply(request)
    }

    /// Validate a decoded reply request
    pub fn validate_reply(request: ReplyRequest) -> Result<TicketReply> {
        let ticket_id = Self::validate_uuid("ticketId", &request.ticket_id)?;
        Self::validate_message(&request.message)?;

        Ok(TicketReply {
            ticket_id,
            message: request.message,
        })
    }

    /// Validate a reply message
    pub fn validate_message(message: &str) -> Result<()> {
        if message.is_empty() {
            return Err(TriageError::Validation("Message cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Validate a required UUID field
    pub fn validate_uuid(field: &str, value: &str) -> Result<Uuid> {
        Uuid::parse_str(value).map_err(|_| TriageError::Validation(format!("{field} must be a valid UUID")))
    }

    /// Validate an optional UUID field, treating an empty string as absent
    pub fn validate_optional_uuid(field: &str, value: &str) -> Result<Option<Uuid>> {
        if value.is_empty() {
            return Ok(None);
        }
        Self::validate_uuid(field, value).map(Some)
    }

    /// Validate the table name used for the hosted store
    pub fn validate_table_name(table: &str) -> Result<()> {
        if table.is_empty() {
            return Err(TriageError::Configuration("Table name cannot be empty".to_string()));
        }

        if !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(TriageError::Configuration(format!(
                "Table name contains invalid characters: {table}"
            )));
        }

        Ok(())
    }

    /// Validate a SQLite database URL and return the file path part
    pub fn sqlite_path(url: &str) -> Result<&str> {
        if url.trim().is_empty() {
            return Err(TriageError::Configuration("Database URL cannot be empty".to_string()));
        }

        let Some(path) = url.strip_prefix("sqlite:") else {
            return Err(TriageError::Configuration("Only sqlite: URLs are supported".to_string()));
        };

        let path = path.strip_prefix("//").unwrap_or(path);
        if path.is_empty() {
            return Err(TriageError::Configuration("Database URL has no path".to_string()));
        }

        Ok(path)
    }
}

fn parse_json(body: &[u8]) -> Result<Value> {
    serde_json::from_slice(body).map_err(|e| TriageError::Validation(format!("body is not valid JSON: {e}")))
}

fn decode_object<T: DeserializeOwned>(value: Value) -> Result<T> {
    if !value.is_object() {
        return Err(TriageError::Validation("body must be a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| TriageError::Validation(format!("invalid request body: {e}")))
}
