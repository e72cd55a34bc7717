use chrono::{Duration, Utc};
use tempfile::TempDir;
use uuid::Uuid;

use ticket_triage::db::Database;
use ticket_triage::models::{Scores, Sentiment, Ticket, TicketUpdate, Urgency};
use ticket_triage::scoring::ScoringRules;
use ticket_triage::store::TicketStore;

fn db_url(dir: &TempDir) -> String {
    format!("sqlite://{}", dir.path().join("tickets.db").display())
}

#[test]
fn test_database_creation_and_initialization() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db = Database::new(&db_url(&temp_dir), 2).expect("Failed to create database");

    let conn = db.get_connection().expect("Failed to get database connection");
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM tickets", [], |row| row.get(0))
        .expect("tickets table should exist");
    assert_eq!(count, 0);
}

#[test]
fn test_creates_missing_parent_directory() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let path = temp_dir.path().join("nested").join("data").join("tickets.db");

    Database::new(&format!("sqlite:{}", path.display()), 1).expect("Failed to create database");
    assert!(path.exists());
}

#[tokio::test]
async fn test_tickets_survive_reopen() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let ticket = Ticket::open(Uuid::new_v4(), Uuid::new_v4(), Utc::now());

    {
        let db = Database::new(&db_url(&temp_dir), 2).expect("Failed to create database");
        db.insert_ticket(ticket.clone()).await.expect("Failed to insert ticket");
    }

    // migrations are safe to run again on an existing file
    let db = Database::new(&db_url(&temp_dir), 2).expect("Failed to reopen database");
    let found = db.find_ticket(ticket.id).await.unwrap().expect("ticket should persist");
    assert_eq!(found.org_id, ticket.org_id);
    assert_eq!(found.scores(), Scores::default());
}

#[tokio::test]
async fn test_recent_tickets_order_and_limit() {
    let db = Database::in_memory().expect("Failed to create database");
    let base = Utc::now();

    let mut ids = Vec::new();
    for offset in [5, 1, 3, 4, 2] {
        let ticket = Ticket::open(Uuid::new_v4(), Uuid::new_v4(), base + Duration::seconds(offset));
        ids.push((offset, ticket.id));
        db.insert_ticket(ticket).await.unwrap();
    }
    ids.sort_by_key(|(offset, _)| std::cmp::Reverse(*offset));

    let recent = db.recent_tickets(3).await.unwrap();
    let recent_ids: Vec<Uuid> = recent.iter().map(|t| t.id).collect();
    let expected: Vec<Uuid> = ids.iter().take(3).map(|(_, id)| *id).collect();
    assert_eq!(recent_ids, expected);

    assert_eq!(db.recent_tickets(25).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_update_overwrites_reply_columns() {
    let db = Database::in_memory().expect("Failed to create database");
    let ticket = Ticket::open(Uuid::new_v4(), Uuid::new_v4(), Utc::now() - Duration::minutes(5));
    db.insert_ticket(ticket.clone()).await.unwrap();

    let rules = ScoringRules::default();
    let first = "Leak under the sink, I'm upset".to_string();
    let update = TicketUpdate::from_reply(first.clone(), rules.score(&first), Utc::now());
    let updated = db.update_ticket(ticket.id, update).await.unwrap().unwrap();

    assert_eq!(updated.last_message, first);
    assert_eq!(updated.urgency, Urgency::Urgent);
    assert_eq!(updated.sentiment, Sentiment::Negative);
    assert!(updated.updated_at > ticket.updated_at);

    let second = "Thanks, all sorted".to_string();
    let update = TicketUpdate::from_reply(second.clone(), rules.score(&second), Utc::now());
    let updated = db.update_ticket(ticket.id, update).await.unwrap().unwrap();

    assert_eq!(updated.last_message, second);
    assert_eq!(updated.scores(), Scores::default());
    assert_eq!(updated.org_id, ticket.org_id);
}

#[tokio::test]
async fn test_long_unicode_message_round_trips() {
    let db = Database::in_memory().expect("Failed to create database");
    let ticket = Ticket::open(Uuid::new_v4(), Uuid::new_v4(), Utc::now());
    db.insert_ticket(ticket.clone()).await.unwrap();

    let message = "💧 fuite d'eau 💧 ".repeat(20);
    let update = TicketUpdate::from_reply(message.clone(), ScoringRules::default().score(&message), Utc::now());
    let updated = db.update_ticket(ticket.id, update).await.unwrap().unwrap();

    assert_eq!(updated.last_message, message);
}
