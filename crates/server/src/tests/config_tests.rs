use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

fn scratch_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    env::temp_dir().join(format!("chat_server_{tag}_{nanos}"))
}

#[test]
fn database_urls_are_normalized() {
    let cases = [
        ("./data/test.db", "sqlite://./data/test.db"),
        ("sqlite:./data/test.db", "sqlite://./data/test.db"),
        ("sqlite://./data/test.db", "sqlite://./data/test.db"),
        ("sqlite::memory:", "sqlite::memory:"),
        ("postgres://db/chat", "postgres://db/chat"),
        ("sqlite:C:\\Users\\alice\\test.db", "sqlite:C:/Users/alice/test.db"),
        ("C:\\Users\\alice\\test.db", "sqlite:C:/Users/alice/test.db"),
        ("sqlite://C:/Users/alice/test.db", "sqlite:C:/Users/alice/test.db"),
    ];
    for (raw, expected) in cases {
        assert_eq!(normalize_database_url(raw), expected, "input {raw}");
    }
    assert_eq!(normalize_database_url("  "), Settings::default().database_url);
}

#[test]
fn memory_and_remote_urls_have_no_file() {
    assert_eq!(sqlite_file("sqlite::memory:"), None);
    assert_eq!(sqlite_file("postgres://db/chat"), None);
    assert_eq!(
        sqlite_file("sqlite://./data/chat.db?mode=rwc"),
        Some(PathBuf::from("./data/chat.db"))
    );
}

#[test]
fn file_settings_override_defaults() {
    let mut settings = Settings::default();
    apply_file_settings(
        &mut settings,
        r#"
bind_addr = "0.0.0.0:9000"
database_url = "sqlite://./tmp/chat.db"
event_capacity = 16
"#,
    );
    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(settings.database_url, "sqlite://./tmp/chat.db");
    assert_eq!(settings.event_capacity, 16);
}

#[test]
fn malformed_file_settings_are_ignored() {
    let mut settings = Settings::default();
    apply_file_settings(&mut settings, "bind_addr = [");
    assert_eq!(settings, Settings::default());
}

#[test]
fn app_prefixed_env_wins_over_short_names() {
    let mut settings = Settings::default();
    apply_env_overrides(
        &mut settings,
        env_from(&[
            ("SERVER_BIND", "127.0.0.1:1"),
            ("APP__BIND_ADDR", "127.0.0.1:2"),
            ("DATABASE_URL", "sqlite://a.db"),
            ("APP__EVENT_CAPACITY", "not-a-number"),
        ]),
    );
    assert_eq!(settings.server_bind, "127.0.0.1:2");
    assert_eq!(settings.database_url, "sqlite://a.db");
    assert_eq!(settings.event_capacity, Settings::default().event_capacity);
}

#[tokio::test]
async fn prepared_url_opens_a_fresh_database() {
    let root = scratch_dir("open");
    let db_path = root.join("nested").join("server.db");

    let prepared = prepare_database_url(&db_path.to_string_lossy()).expect("prepare");
    assert!(root.join("nested").is_dir());

    let storage = storage::Storage::new(&prepared).await.expect("open sqlite");
    storage.health_check().await.expect("healthy");
    drop(storage);
    assert!(db_path.exists(), "missing {}", db_path.display());

    fs::remove_dir_all(root).expect("cleanup");
}
