//! Data models for tickets and request payloads
//!
//! A ticket row is serialized with snake_case field names, the same shape the
//! table store uses, so rows pass through the API unchanged. Request bodies
//! use camelCase, matching what the web forms send.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Urgency label derived from the latest message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Urgency {
    /// Nothing in the message calls for a fast response
    #[default]
    Routine = 1,
    /// The message mentions something that needs immediate attention
    Urgent = 3,
}

impl From<Urgency> for i64 {
    fn from(value: Urgency) -> Self {
        value as Self
    }
}

impl TryFrom<i64> for Urgency {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Routine),
            3 => Ok(Self::Urgent),
            other => Err(format!("urgency must be 1 or 3, got {other}")),
        }
    }
}

/// Importance label derived from the latest message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Importance {
    /// Short message
    #[default]
    Normal = 1,
    /// Long message, likely carrying more detail
    High = 2,
}

impl From<Importance> for i64 {
    fn from(value: Importance) -> Self {
        value as Self
    }
}

impl TryFrom<i64> for Importance {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Normal),
            2 => Ok(Self::High),
            other => Err(format!("importance must be 1 or 2, got {other}")),
        }
    }
}

/// Sentiment label derived from the latest message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    /// No negative keyword found
    #[default]
    Neutral,
    /// The tenant sounds unhappy
    Negative,
}

impl Sentiment {
    /// Get the stored text form of this sentiment
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "neutral" => Ok(Self::Neutral),
            "negative" => Ok(Self::Negative),
            other => Err(format!("unknown sentiment: {other}")),
        }
    }
}

/// The three labels computed for a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scores {
    /// Urgency label (1 or 3)
    pub urgency: Urgency,
    /// Importance label (1 or 2)
    pub importance: Importance,
    /// Sentiment label
    pub sentiment: Sentiment,
}

/// A tenant support ticket as stored in the `tickets` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket identifier
    pub id: Uuid,
    /// Owning organization
    pub org_id: Uuid,
    /// Most recent reply text, empty until the first reply
    pub last_message: String,
    /// Urgency of the latest message
    pub urgency: Urgency,
    /// Importance of the latest message
    pub importance: Importance,
    /// Sentiment of the latest message
    pub sentiment: Sentiment,
    /// Last time the ticket was written
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Build a freshly opened ticket with default scores and no message
    #[must_use]
    pub fn open(id: Uuid, org_id: Uuid, now: DateTime<Utc>) -> Self {
        let scores = Scores::default();
        Self {
            id,
            org_id,
            last_message: String::new(),
            urgency: scores.urgency,
            importance: scores.importance,
            sentiment: scores.sentiment,
            updated_at: now,
        }
    }

    /// Current labels of this ticket
    #[must_use]
    pub const fn scores(&self) -> Scores {
        Scores {
            urgency: self.urgency,
            importance: self.importance,
            sentiment: self.sentiment,
        }
    }

    /// Apply a reply patch in place
    pub fn apply(&mut self, update: &TicketUpdate) {
        self.last_message.clone_from(&update.last_message);
        self.urgency = update.urgency;
        self.importance = update.importance;
        self.sentiment = update.sentiment;
        self.updated_at = update.updated_at;
    }
}

/// Columns written when a reply is scored
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketUpdate {
    /// The reply text
    pub last_message: String,
    /// Recomputed urgency
    pub urgency: Urgency,
    /// Recomputed importance
    pub importance: Importance,
    /// Recomputed sentiment
    pub sentiment: Sentiment,
    /// Time of the reply
    pub updated_at: DateTime<Utc>,
}

impl TicketUpdate {
    /// Build the patch for a scored reply
    #[must_use]
    pub fn from_reply(message: String, scores: Scores, now: DateTime<Utc>) -> Self {
        Self {
            last_message: message,
            urgency: scores.urgency,
            importance: scores.importance,
            sentiment: scores.sentiment,
            updated_at: now,
        }
    }
}

/// Body of `POST /ticket`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    /// Organization to file the ticket under; generated when absent
    #[serde(default)]
    pub org_id: Option<String>,
}

/// Body of `POST /ticket/reply`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    /// Ticket being replied to
    pub ticket_id: String,
    /// Reply text
    pub message: String,
}

/// A reply that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketReply {
    /// Ticket being replied to
    pub ticket_id: Uuid,
    /// Non-empty reply text
    pub message: String,
}
