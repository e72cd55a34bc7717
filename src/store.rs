//! Database gateway abstraction
//!
//! Handlers never hold a gateway between requests. Each request asks a
//! [`StoreProvider`] for one, so a missing credential is reported on every
//! request and picked up as soon as it is fixed.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Ticket, TicketUpdate};

/// Row-level access to the tickets table
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Insert a new row and return it as stored
    async fn insert_ticket(&self, ticket: Ticket) -> Result<Ticket>;

    /// Most recently updated tickets, newest first
    async fn recent_tickets(&self, limit: usize) -> Result<Vec<Ticket>>;

    /// Look up a single ticket
    async fn find_ticket(&self, id: Uuid) -> Result<Option<Ticket>>;

    /// Overwrite the reply columns of a ticket. `None` if no row matched.
    async fn update_ticket(&self, id: Uuid, update: TicketUpdate) -> Result<Option<Ticket>>;
}

/// Resolves a connected gateway for one request
pub trait StoreProvider: Send + Sync {
    /// Connect, failing with a configuration error when settings are missing
    fn connect(&self) -> Result<Arc<dyn TicketStore>>;
}

/// Provider that always hands out the same gateway
pub struct SharedStore {
    store: Arc<dyn TicketStore>,
}

impl SharedStore {
    /// Wrap an already connected gateway
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }
}

impl StoreProvider for SharedStore {
    fn connect(&self) -> Result<Arc<dyn TicketStore>> {
        Ok(Arc::clone(&self.store))
    }
}
