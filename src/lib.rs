//! Ticket Triage - Support Ticket Scoring Service
//!
//! A small HTTP service for tenant support tickets. Replies are labelled
//! for urgency, importance and sentiment by keyword matching and written
//! back to the ticket row.
//!
//! # Features
//!
//! - Create, list and reply to tickets over a JSON API
//! - Configurable keyword scoring
//! - Hosted table store (PostgREST) or local SQLite storage

/// HTTP routes and error responses
pub mod api;
/// Configuration management
pub mod config;
/// SQLite ticket store
pub mod db;
/// Error types
pub mod error;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Hosted table store client
pub mod rest;
/// Database schema definitions
pub mod schema;
/// Keyword scoring
pub mod scoring;
/// Ticket operations
pub mod service;
/// Database gateway abstraction
pub mod store;
/// Input validation
pub mod validation;

// Re-export key components for easier access
pub use api::create_router;
pub use db::Database;
pub use error::{Result, TriageError};
pub use models::{Scores, Ticket};
pub use scoring::ScoringRules;
pub use service::TicketService;
