use sealed_rooms::auth::digest;
use sealed_rooms::core::message::{MessageKind, StoredMessage};
use sealed_rooms::core::room::RoomRegistry;

use chrono::{TimeZone, Utc};

#[tokio::test]
async fn test_create_room_and_exists() {
    let registry = RoomRegistry::new();

    assert!(!registry.exists("r1").await);
    registry.create_room("r1", digest("pw")).await.unwrap();
    assert!(registry.exists("r1").await);

    // Room names are case-sensitive
    assert!(!registry.exists("R1").await);
}

#[tokio::test]
async fn test_create_room_never_overwrites() {
    let registry = RoomRegistry::new();

    registry.create_room("r1", digest("pw")).await.unwrap();
    let result = registry.create_room("r1", digest("other")).await;
    assert!(result.is_err());

    // The original password still stands
    assert!(registry.verify_password("r1", &digest("pw")).await);
    assert!(!registry.verify_password("r1", &digest("other")).await);
}

#[tokio::test]
async fn test_verify_password() {
    let registry = RoomRegistry::new();
    registry.create_room("r1", digest("pw")).await.unwrap();

    assert!(registry.verify_password("r1", &digest("pw")).await);
    assert!(!registry.verify_password("r1", &digest("wrong")).await);

    // Missing room fails instead of erroring
    assert!(!registry.verify_password("nowhere", &digest("pw")).await);
}

#[tokio::test]
async fn test_admin_password_lifecycle() {
    let registry = RoomRegistry::new();
    registry.create_room("r1", digest("pw")).await.unwrap();

    // Unset: verification fails
    assert!(!registry.verify_admin_password("r1", &digest("admin")).await);

    registry
        .set_admin_password("r1", digest("admin"))
        .await
        .unwrap();
    assert!(registry.verify_admin_password("r1", &digest("admin")).await);
    assert!(!registry.verify_admin_password("r1", &digest("wrong")).await);

    // Overwrite: last writer wins
    registry
        .set_admin_password("r1", digest("admin2"))
        .await
        .unwrap();
    assert!(!registry.verify_admin_password("r1", &digest("admin")).await);
    assert!(registry.verify_admin_password("r1", &digest("admin2")).await);

    // Missing room
    assert!(!registry
        .verify_admin_password("nowhere", &digest("admin"))
        .await);
    assert!(registry
        .set_admin_password("nowhere", digest("admin"))
        .await
        .is_err());
}

#[tokio::test]
async fn test_history_preserves_append_order() {
    let registry = RoomRegistry::new();
    registry.create_room("r1", digest("pw")).await.unwrap();

    let room = registry.room("r1").await.unwrap();
    for i in 0..5 {
        let t = Utc.with_ymd_and_hms(2020, 4, 19, 22, 8, i).unwrap();
        room.write().await.append_message(StoredMessage::chat(
            "alice".to_string(),
            format!("msg-{}", i),
            t,
        ));
    }

    let history = registry.history("r1").await.unwrap();
    assert_eq!(history.len(), 5);
    for (i, msg) in history.iter().enumerate() {
        assert_eq!(msg.body, format!("msg-{}", i));
        assert_eq!(msg.kind, MessageKind::Chat);
    }
}

#[tokio::test]
async fn test_clear_history() {
    let registry = RoomRegistry::new();
    registry.create_room("r1", digest("pw")).await.unwrap();

    let room = registry.room("r1").await.unwrap();
    room.write()
        .await
        .append_message(StoredMessage::info("notice".to_string()));
    assert_eq!(registry.history("r1").await.unwrap().len(), 1);

    registry.clear_history("r1").await.unwrap();
    assert!(registry.history("r1").await.unwrap().is_empty());

    assert!(registry.clear_history("nowhere").await.is_err());
    assert!(registry.history("nowhere").await.is_err());
}

#[tokio::test]
async fn test_last_message_time_tracks_history_tail() {
    let registry = RoomRegistry::new();
    registry.create_room("r1", digest("pw")).await.unwrap();

    assert!(registry.last_message_time("r1").await.is_none());
    assert!(registry.last_message_time("nowhere").await.is_none());

    let room = registry.room("r1").await.unwrap();
    let t1 = Utc.with_ymd_and_hms(2020, 4, 19, 22, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2020, 4, 19, 23, 0, 0).unwrap();
    room.write()
        .await
        .append_message(StoredMessage::chat("alice".to_string(), "one".to_string(), t1));
    room.write()
        .await
        .append_message(StoredMessage::chat("alice".to_string(), "two".to_string(), t2));

    assert_eq!(registry.last_message_time("r1").await, Some(t2));
}

#[tokio::test]
async fn test_membership_views() {
    let registry = RoomRegistry::new();
    registry.create_room("r1", digest("pw")).await.unwrap();

    let room = registry.room("r1").await.unwrap();
    room.write()
        .await
        .add_member("id-a".to_string(), "alice".to_string());
    room.write()
        .await
        .add_member("id-b".to_string(), "bob".to_string());

    let mut names = registry.member_names("r1").await;
    names.sort();
    assert_eq!(names, vec!["alice".to_string(), "bob".to_string()]);

    let mut ids = registry.member_identities("r1").await;
    ids.sort();
    assert_eq!(ids, vec!["id-a".to_string(), "id-b".to_string()]);

    assert!(registry.member_names("nowhere").await.is_empty());
}

#[tokio::test]
async fn test_room_of_reverse_lookup() {
    let registry = RoomRegistry::new();
    registry.create_room("r1", digest("pw")).await.unwrap();
    registry.create_room("r2", digest("pw")).await.unwrap();

    let room = registry.room("r2").await.unwrap();
    room.write()
        .await
        .add_member("id-b".to_string(), "bob".to_string());

    assert_eq!(registry.room_of("id-b").await, Some("r2".to_string()));
    assert_eq!(registry.room_of("id-a").await, None);

    room.write().await.remove_member("id-b");
    assert_eq!(registry.room_of("id-b").await, None);
}

#[tokio::test]
async fn test_rooms_persist_when_emptied() {
    let registry = RoomRegistry::new();
    registry.create_room("r1", digest("pw")).await.unwrap();

    let room = registry.room("r1").await.unwrap();
    room.write()
        .await
        .add_member("id-a".to_string(), "alice".to_string());
    room.write().await.remove_member("id-a");

    // Empty, but still there with its password
    assert!(registry.exists("r1").await);
    assert!(registry.verify_password("r1", &digest("pw")).await);
}
