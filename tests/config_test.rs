//! Unit tests for config.rs module

use ticket_triage::config::AppConfig;
use ticket_triage::models::{Importance, Sentiment, Urgency};

#[test]
fn test_default_server_config() {
    let config = AppConfig::default();

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.bind_address(), "127.0.0.1:3000");
}

#[test]
fn test_default_store_config() {
    let config = AppConfig::default();

    assert_eq!(config.store.backend, "rest");
    assert_eq!(config.store.table, "tickets");
    assert_eq!(config.store.url_env, "SUPABASE_URL");
    assert_eq!(config.store.url_env_fallbacks, vec!["NEXT_PUBLIC_SUPABASE_URL"]);
    assert_eq!(config.store.service_key_env, "SUPABASE_SERVICE_ROLE_KEY");
    assert_eq!(config.store.request_timeout_secs, 30);
    assert_eq!(config.store.sqlite_url, "sqlite:data/tickets.db");
}

#[test]
fn test_default_logging_config() {
    let config = AppConfig::default();

    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.file_path, None);
    assert_eq!(config.logging.format, "text");
}

#[test]
fn test_default_scoring_config() {
    let config = AppConfig::default();

    assert_eq!(config.scoring.urgency_keywords, vec!["water", "leak"]);
    assert_eq!(config.scoring.negative_keywords, vec!["angry", "upset"]);
    assert_eq!(config.scoring.importance_threshold, 200);
    assert_eq!(config.tickets.list_limit, 25);
}

#[test]
fn test_scoring_rules_follow_config() {
    let mut config = AppConfig::default();
    config.scoring.urgency_keywords = vec!["Flood".to_string(), "  ".to_string()];
    config.scoring.negative_keywords = vec!["furious".to_string()];
    config.scoring.importance_threshold = 10;

    let rules = config.scoring_rules();
    let scores = rules.score("the basement flood made me furious");
    assert_eq!(scores.urgency, Urgency::Urgent);
    assert_eq!(scores.importance, Importance::High);
    assert_eq!(scores.sentiment, Sentiment::Negative);

    // the old defaults no longer apply
    let scores = rules.score("leak");
    assert_eq!(scores.urgency, Urgency::Routine);
}

#[test]
fn test_validation_rejects_bad_values() {
    let cases: [fn(&mut AppConfig); 8] = [
        |c| c.store.backend = "postgres".to_string(),
        |c| c.store.table = String::new(),
        |c| c.store.url_env = " ".to_string(),
        |c| c.store.url_env_fallbacks = vec![String::new()],
        |c| c.store.request_timeout_secs = 0,
        |c| c.logging.level = "verbose".to_string(),
        |c| c.logging.format = "yaml".to_string(),
        |c| c.tickets.list_limit = 0,
    ];

    for (i, mutate) in cases.iter().enumerate() {
        let mut config = AppConfig::default();
        mutate(&mut config);
        assert!(config.validate().is_err(), "case {i} should be rejected");
    }
}

#[test]
fn test_validation_accepts_sqlite_backend() {
    let mut config = AppConfig::default();
    config.store.backend = "sqlite".to_string();
    config.logging.format = "json".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_reads_environment() {
    std::env::set_var("TICKET_TRIAGE_SERVER__PORT", "4100");
    std::env::set_var("TICKET_TRIAGE_SCORING__NEGATIVE_KEYWORDS", "furious,livid");

    let config = AppConfig::load().expect("configuration should load");

    std::env::remove_var("TICKET_TRIAGE_SERVER__PORT");
    std::env::remove_var("TICKET_TRIAGE_SCORING__NEGATIVE_KEYWORDS");

    assert_eq!(config.server.port, 4100);
    assert_eq!(config.scoring.negative_keywords, vec!["furious", "livid"]);
    assert_eq!(config.scoring.urgency_keywords, vec!["water", "leak"]);
    assert_eq!(config.tickets.list_limit, 25);
}
