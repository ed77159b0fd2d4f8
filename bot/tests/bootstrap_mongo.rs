mod common;

use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::IndexModel;
use pretty_assertions::assert_eq;
use tgbot::bootstrap::{self, BootstrapPlan, BootstrapPolicy, COLLECTIONS};
use tgbot::database::is_duplicate_key;
use tgbot::models::{BotSettings, SettingsPatch, SETTINGS_ID};
use tgbot::Error;

fn plan() -> BootstrapPlan {
    BootstrapPlan {
        app_user: None,
        settings: BotSettings::seed(true, 30),
    }
}

#[tokio::test]
async fn provisions_four_collections_and_one_settings_document() {
    let Some(db) = common::scratch_db("provision").await else { return };

    let report = bootstrap::run(&db, &plan(), BootstrapPolicy::Idempotent).await.unwrap();
    assert!(report.skipped.is_empty());

    let mut names = db.inner().list_collection_names(None).await.unwrap();
    names.sort();
    let mut expected: Vec<String> = COLLECTIONS.iter().map(|c| c.to_string()).collect();
    expected.sort();
    assert_eq!(names, expected);

    assert_eq!(db.raw("settings").count_documents(None, None).await.unwrap(), 1);
    let settings = db.get_settings().await.unwrap().unwrap();
    assert_eq!(settings.id, SETTINGS_ID);
    assert!(settings.auto_delete_messages);
    assert_eq!(settings.auto_delete_interval, 30);

    common::drop_db(db).await;
}

#[tokio::test]
async fn unique_indexes_reject_duplicates() {
    let Some(db) = common::scratch_db("unique").await else { return };
    bootstrap::run(&db, &plan(), BootstrapPolicy::Idempotent).await.unwrap();

    db.raw("users").insert_one(doc! { "user_id": 1_i64 }, None).await.unwrap();
    let err = db.raw("users").insert_one(doc! { "user_id": 1_i64 }, None).await.unwrap_err();
    assert!(is_duplicate_key(&err));

    db.raw("groups").insert_one(doc! { "group_id": -100_i64 }, None).await.unwrap();
    let err = db.raw("groups").insert_one(doc! { "group_id": -100_i64 }, None).await.unwrap_err();
    assert!(is_duplicate_key(&err));

    // messages tidak unik
    db.raw("messages").insert_one(doc! { "message_id": 5_i64, "chat_id": 1_i64 }, None).await.unwrap();
    db.raw("messages").insert_one(doc! { "message_id": 5_i64, "chat_id": 1_i64 }, None).await.unwrap();

    common::drop_db(db).await;
}

#[tokio::test]
async fn rerun_is_idempotent_and_keeps_settings() {
    let Some(db) = common::scratch_db("rerun").await else { return };
    bootstrap::run(&db, &plan(), BootstrapPolicy::Idempotent).await.unwrap();

    let patch = SettingsPatch {
        welcome_message: Some("halo".to_string()),
        ..Default::default()
    };
    db.update_settings(&patch).await.unwrap();

    let second = bootstrap::run(&db, &plan(), BootstrapPolicy::Idempotent).await.unwrap();
    assert!(second.is_noop());
    assert_eq!(second.skipped.len(), 4 + 5 + 1);
    assert_eq!(db.get_settings().await.unwrap().unwrap().welcome_message, "halo");
    assert_eq!(db.raw("settings").count_documents(None, None).await.unwrap(), 1);

    common::drop_db(db).await;
}

#[tokio::test]
async fn strict_rerun_fails_before_touching_anything() {
    let Some(db) = common::scratch_db("strict").await else { return };

    bootstrap::run(&db, &plan(), BootstrapPolicy::Strict).await.unwrap();
    let err = bootstrap::run(&db, &plan(), BootstrapPolicy::Strict).await.unwrap_err();
    match err {
        Error::AlreadyProvisioned(what) => {
            assert!(what.contains("collection `users`"));
            assert!(what.contains("settings `bot_settings`"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    common::drop_db(db).await;
}

#[tokio::test]
async fn strict_fails_on_partial_state_without_creating_the_rest() {
    let Some(db) = common::scratch_db("partial").await else { return };
    db.inner().create_collection("groups", None).await.unwrap();

    let err = bootstrap::run(&db, &plan(), BootstrapPolicy::Strict).await.unwrap_err();
    assert!(matches!(err, Error::AlreadyProvisioned(_)));
    assert_eq!(db.inner().list_collection_names(None).await.unwrap(), vec!["groups".to_string()]);

    common::drop_db(db).await;
}

#[tokio::test]
async fn rerun_accepts_indexes_created_under_default_names() {
    let Some(db) = common::scratch_db("default_names").await else { return };

    // seperti createIndex({user_id: 1}, {unique: true}) dari skrip init
    let model = IndexModel::builder()
        .keys(doc! { "user_id": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    db.raw("users").create_index(model, None).await.unwrap();

    let report = bootstrap::run(&db, &plan(), BootstrapPolicy::Idempotent).await.unwrap();
    assert!(report.skipped.contains(&"index `users.user_id_1`".to_string()));
    assert_eq!(db.raw("users").list_index_names().await.unwrap().len(), 2);

    let err = bootstrap::run(&db, &plan(), BootstrapPolicy::Strict).await.unwrap_err();
    match err {
        Error::AlreadyProvisioned(what) => assert!(what.contains("index `users.user_id_1`")),
        other => panic!("unexpected error: {other:?}"),
    }

    common::drop_db(db).await;
}

#[tokio::test]
async fn non_unique_index_on_unique_key_fails_before_changes() {
    let Some(db) = common::scratch_db("mismatch").await else { return };

    let model = IndexModel::builder().keys(doc! { "group_id": 1 }).build();
    db.raw("groups").create_index(model, None).await.unwrap();

    let err = bootstrap::run(&db, &plan(), BootstrapPolicy::Idempotent).await.unwrap_err();
    assert!(matches!(err, Error::IndexMismatch(_)));
    assert_eq!(db.inner().list_collection_names(None).await.unwrap(), vec!["groups".to_string()]);

    common::drop_db(db).await;
}
