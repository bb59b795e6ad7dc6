use super::*;

async fn community(storage: &Storage, name: &str) -> CommunityId {
    storage
        .create_community(NewCommunity {
            name: name.to_string(),
            community_url: format!("https://{name}.slack.com"),
            ..NewCommunity::default()
        })
        .await
        .expect("community")
}

async fn member(storage: &Storage, community_id: CommunityId, name: &str) -> UserId {
    storage
        .create_user(NewUser {
            community_id,
            auth_id: None,
            display_name: name.to_string(),
            role: Role::Member,
        })
        .await
        .expect("user")
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("community_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("storage.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}

#[tokio::test]
async fn finds_community_by_name_with_link_fields() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let id = storage
        .create_community(NewCommunity {
            name: "rustaceans".into(),
            community_url: "https://rustaceans.slack.com".into(),
            discord_server_id: Some("1234".into()),
            private: true,
            ..NewCommunity::default()
        })
        .await
        .expect("community");

    let found = storage
        .find_community_by_name("rustaceans")
        .await
        .expect("query")
        .expect("community exists");
    assert_eq!(found.id, id);
    assert_eq!(found.kind, CommunityType::Private);
    assert_eq!(found.discord_server_id.as_deref(), Some("1234"));
    assert!(storage
        .find_community_by_name("gophers")
        .await
        .expect("query")
        .is_none());
}

#[tokio::test]
async fn lists_communities_for_auth_identity() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let first = community(&storage, "alpha").await;
    let second = community(&storage, "beta").await;
    let _other = community(&storage, "gamma").await;
    let auth = AuthId::new();
    for community_id in [first, second] {
        storage
            .create_user(NewUser {
                community_id,
                auth_id: Some(auth),
                display_name: "alice".into(),
                role: Role::Member,
            })
            .await
            .expect("user");
    }

    let communities = storage.communities_for_auth(auth).await.expect("list");
    let names: Vec<_> = communities.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
}

#[tokio::test]
async fn dms_are_scoped_to_members_and_drop_after_archive() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let community_id = community(&storage, "ops").await;
    let alice = member(&storage, community_id, "alice").await;
    let bob = member(&storage, community_id, "bob").await;
    let dm = storage
        .create_channel(community_id, "alice-bob", None, ChannelType::Dm)
        .await
        .expect("dm");
    storage.add_channel_member(dm, alice).await.expect("member");

    assert_eq!(storage.list_dms(community_id, alice).await.expect("dms").len(), 1);
    assert!(storage.list_dms(community_id, bob).await.expect("dms").is_empty());
    assert!(storage
        .list_public_channels(community_id)
        .await
        .expect("public")
        .is_empty());

    assert!(storage
        .archive_channel_for_user(dm, alice)
        .await
        .expect("archive"));
    assert!(!storage
        .archive_channel_for_user(dm, bob)
        .await
        .expect("archive"));
    assert!(storage.list_dms(community_id, alice).await.expect("dms").is_empty());
}

#[tokio::test]
async fn thread_lookup_by_increment_id() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let community_id = community(&storage, "ops").await;
    let channel = storage
        .create_channel(community_id, "general", Some("C1"), ChannelType::Public)
        .await
        .expect("channel");
    let thread = storage
        .create_thread(
            channel,
            NewThread {
                external_thread_id: Some("1680000000.123456".into()),
                ..NewThread::default()
            },
            Utc::now(),
        )
        .await
        .expect("thread");
    assert!(thread.increment_id > 0);

    let found = storage
        .find_thread_by_increment_id(thread.increment_id)
        .await
        .expect("query")
        .expect("thread exists");
    assert_eq!(found.id, thread.id);
    assert_eq!(found.external_thread_id.as_deref(), Some("1680000000.123456"));
    assert!(storage
        .find_thread_by_increment_id(thread.increment_id + 100)
        .await
        .expect("query")
        .is_none());
}

#[tokio::test]
async fn inserting_message_bumps_thread_activity() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let community_id = community(&storage, "ops").await;
    let alice = member(&storage, community_id, "alice").await;
    let channel = storage
        .create_channel(community_id, "general", None, ChannelType::Public)
        .await
        .expect("channel");
    let old = storage
        .create_thread(channel, NewThread::default(), Utc::now() - chrono::Duration::hours(2))
        .await
        .expect("old thread");
    let fresh = storage
        .create_thread(channel, NewThread::default(), Utc::now() - chrono::Duration::hours(1))
        .await
        .expect("fresh thread");

    let recent = storage.recent_threads(&[channel], 10).await.expect("recent");
    assert_eq!(recent[0].id, fresh.id);

    let message = storage
        .insert_message(old.id, channel, alice, "bump", MessageFormat::Linen, None)
        .await
        .expect("message");
    let recent = storage.recent_threads(&[channel], 10).await.expect("recent");
    assert_eq!(recent[0].id, old.id);
    assert_eq!(recent[0].last_reply_at, message.sent_at);

    let messages = storage.list_thread_messages(old.id).await.expect("messages");
    assert_eq!(messages, vec![message]);
    assert!(storage.recent_threads(&[], 10).await.expect("recent").is_empty());
}

#[tokio::test]
async fn starred_threads_round_trip() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let community_id = community(&storage, "ops").await;
    let alice = member(&storage, community_id, "alice").await;
    let channel = storage
        .create_channel(community_id, "general", None, ChannelType::Public)
        .await
        .expect("channel");
    let thread = storage
        .create_thread(channel, NewThread::default(), Utc::now())
        .await
        .expect("thread");

    storage
        .star_thread(alice, thread.id, community_id)
        .await
        .expect("star");
    storage
        .star_thread(alice, thread.id, community_id)
        .await
        .expect("star twice");
    let starred = storage
        .list_starred_threads(alice, community_id)
        .await
        .expect("starred");
    assert_eq!(starred.len(), 1);

    assert!(storage.unstar_thread(alice, thread.id).await.expect("unstar"));
    assert!(!storage.unstar_thread(alice, thread.id).await.expect("unstar"));
}

#[tokio::test]
async fn read_status_keeps_latest_mark() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let community_id = community(&storage, "ops").await;
    let alice = member(&storage, community_id, "alice").await;
    let channel = storage
        .create_channel(community_id, "general", None, ChannelType::Public)
        .await
        .expect("channel");

    assert!(storage
        .last_read_at(alice, channel)
        .await
        .expect("read")
        .is_none());
    let first = Utc::now() - chrono::Duration::minutes(5);
    let second = Utc::now();
    storage
        .mark_channel_read(alice, channel, first)
        .await
        .expect("mark");
    storage
        .mark_channel_read(alice, channel, second)
        .await
        .expect("mark");
    assert_eq!(
        storage.last_read_at(alice, channel).await.expect("read"),
        Some(second)
    );
}

#[tokio::test]
async fn repeated_imitation_id_stores_one_message() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let community_id = community(&storage, "ops").await;
    let alice = member(&storage, community_id, "alice").await;
    let channel = storage
        .create_channel(community_id, "general", None, ChannelType::Public)
        .await
        .expect("channel");
    let thread = storage
        .create_thread(channel, NewThread::default(), Utc::now())
        .await
        .expect("thread");

    let imitation_id = ImitationId::new();
    let first = storage
        .insert_message(thread.id, channel, alice, "hi", MessageFormat::Linen, Some(imitation_id))
        .await
        .expect("first");
    let again = storage
        .insert_message(thread.id, channel, alice, "hi", MessageFormat::Linen, Some(imitation_id))
        .await
        .expect("repeat");
    assert_eq!(again, first);

    storage
        .insert_message(thread.id, channel, alice, "hi", MessageFormat::Linen, None)
        .await
        .expect("untagged");
    storage
        .insert_message(thread.id, channel, alice, "hi", MessageFormat::Linen, None)
        .await
        .expect("untagged");
    let stored = storage.list_thread_messages(thread.id).await.expect("list");
    assert_eq!(stored.len(), 3);
}

#[tokio::test]
async fn lists_channel_and_community_users() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let community_id = community(&storage, "ops").await;
    let alice = member(&storage, community_id, "alice").await;
    let bob = member(&storage, community_id, "bob").await;
    let other = community(&storage, "elsewhere").await;
    member(&storage, other, "carol").await;
    let dm = storage
        .create_channel(community_id, "alice-bob", None, ChannelType::Dm)
        .await
        .expect("dm");
    storage.add_channel_member(dm, alice).await.expect("member");
    storage.add_channel_member(dm, bob).await.expect("member");
    assert!(storage.archive_channel_for_user(dm, bob).await.expect("archive"));

    let mut in_dm = storage.channel_member_ids(dm).await.expect("members");
    in_dm.sort();
    let mut expected = vec![alice, bob];
    expected.sort();
    assert_eq!(in_dm, expected);

    let mut in_community = storage.community_user_ids(community_id).await.expect("users");
    in_community.sort();
    assert_eq!(in_community, expected);
}
