//! Ticket operations
//!
//! [`TicketService`] is shared by every request; each request opens a
//! [`TicketSession`], which is where a missing store credential surfaces.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, TriageError};
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::{Ticket, TicketReply, TicketUpdate};
use crate::scoring::ScoringRules;
use crate::store::{StoreProvider, TicketStore};

/// Default number of tickets returned by the list operation
pub const DEFAULT_LIST_LIMIT: usize = 25;

/// Ticket operations shared by all requests
pub struct TicketService {
    provider: Arc<dyn StoreProvider>,
    rules: Arc<ScoringRules>,
    list_limit: usize,
    metrics: MetricsCollector,
}

impl TicketService {
    /// Create a service resolving its store through `provider`
    pub fn new(provider: Arc<dyn StoreProvider>, rules: ScoringRules, list_limit: usize) -> Self {
        Self {
            provider,
            rules: Arc::new(rules),
            list_limit,
            metrics: MetricsCollector::default(),
        }
    }

    /// Maximum number of tickets the list operation returns
    pub const fn list_limit(&self) -> usize {
        self.list_limit
    }

    /// Rules used to score replies
    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Metric names shared by the handlers
    pub const fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Resolve a gateway for one request.
    ///
    /// Fails with a configuration error when store credentials are missing.
    pub fn session(&self) -> Result<TicketSession> {
        let store = self.provider.connect()?;
        Ok(TicketSession {
            store,
            rules: Arc::clone(&self.rules),
            list_limit: self.list_limit,
            metrics: self.metrics,
        })
    }
}

/// A connected gateway plus the scoring rules, valid for one request
pub struct TicketSession {
    store: Arc<dyn TicketStore>,
    rules: Arc<ScoringRules>,
    list_limit: usize,
    metrics: MetricsCollector,
}

impl TicketSession {
    /// Open a new ticket with default scores.
    ///
    /// A fresh organization id is generated when none is given.
    pub async fn create_ticket(&self, org_id: Option<Uuid>) -> Result<Ticket> {
        let timer = OperationTimer::new("create_ticket");

        let ticket = Ticket::open(Uuid::new_v4(), org_id.unwrap_or_else(Uuid::new_v4), Utc::now());
        let created = self.store.insert_ticket(ticket).await?;

        info!(ticket_id = %created.id, org_id = %created.org_id, "Ticket created");
        timer.finish();
        Ok(created)
    }

    /// Most recently updated tickets, newest first
    pub async fn list_tickets(&self) -> Result<Vec<Ticket>> {
        let timer = OperationTimer::new("list_tickets");

        let tickets = self.store.recent_tickets(self.list_limit).await?;

        debug!(count = tickets.len(), limit = self.list_limit, "Tickets listed");
        timer.finish();
        Ok(tickets)
    }

    /// Score a reply and write it back to its ticket
    pub async fn reply(&self, reply: TicketReply) -> Result<Ticket> {
        let ticket = self.fetch_ticket(reply.ticket_id).await?;
        self.record_reply(&ticket, reply.message).await
    }

    /// Look up one ticket, failing with `NotFound` if it does not exist
    pub async fn fetch_ticket(&self, id: Uuid) -> Result<Ticket> {
        self.store.find_ticket(id).await?.ok_or(TriageError::NotFound(id))
    }

    /// Score `message` and store it as the latest reply on `ticket`.
    ///
    /// A row deleted since it was fetched is reported as `NotFound`.
    pub async fn record_reply(&self, ticket: &Ticket, message: String) -> Result<Ticket> {
        let timer = OperationTimer::new("reply");

        let scores = self.rules.score(&message);
        self.metrics.record_scores(&scores, message.chars().count());

        let update = TicketUpdate::from_reply(message, scores, Utc::now());
        let updated = self
            .store
            .update_ticket(ticket.id, update)
            .await?
            .ok_or(TriageError::NotFound(ticket.id))?;

        info!(
            ticket_id = %updated.id,
            urgency = i64::from(updated.urgency),
            importance = i64::from(updated.importance),
            sentiment = %updated.sentiment,
            "Reply scored"
        );
        timer.finish();
        Ok(updated)
    }
}
