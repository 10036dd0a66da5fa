//! Integration tests for the bulk upload endpoint and the full
//! upload-review-export cycle.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, post_json, upload_csv, ADMIN};
use http_body_util::BodyExt;
use sqlx::PgPool;

const CSV_ONE_ROW: &str = "Dataset ID,Data Name,Training Stage,Token Count\n\
                           DS-000001,Wiki,pretrain,20\n";

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_returns_diff_and_enqueues_pending_changes(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = upload_csv(app.clone(), CSV_ONE_ROW, "uploader", "add").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["summary"]["added"], 1);
    assert_eq!(data["summary"]["modified"], 0);
    assert_eq!(data["summary"]["deleted"], 0);
    assert_eq!(data["upload_mode"], "add");
    assert_eq!(data["diff"]["added"][0]["dataset_id"], "DS-000001");
    assert_eq!(data["diff"]["added"][0]["data"]["training_stage"], "pretrain");

    // The diff landed in the change queue, grouped by kind.
    let response = get(app, "/api/v1/changes/pending").await;
    let json = body_json(response).await;
    let added = json["data"]["added"].as_array().unwrap();
    assert_eq!(added.len(), 1);
    assert_eq!(added[0]["dataset_id"], "DS-000001");
    assert_eq!(added[0]["submitted_by"], "uploader");
    assert_eq!(added[0]["status"], "pending");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_never_mutates_registry_directly(pool: PgPool) {
    let app = common::build_test_app(pool);

    upload_csv(app.clone(), CSV_ONE_ROW, "uploader", "add").await;

    let response = get(app, "/api/v1/datasets").await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_without_file_is_a_validation_error(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = common::post_multipart(
        app,
        "/api/v1/uploads",
        vec![common::Part::Text {
            name: "submitted_by",
            value: "uploader".to_string(),
        }],
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn upload_with_unknown_mode_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = upload_csv(app, CSV_ONE_ROW, "uploader", "merge").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn approved_upload_reaches_registry_and_rediff_is_empty(pool: PgPool) {
    let app = common::build_test_app(pool);

    // Upload and find the enqueued change id.
    upload_csv(app.clone(), CSV_ONE_ROW, "uploader", "add").await;
    let pending = body_json(get(app.clone(), "/api/v1/changes/pending").await).await;
    let change_id = pending["data"]["added"][0]["id"].as_i64().unwrap();

    // Approve as the configured administrator.
    let response = post_json(
        app.clone(),
        "/api/v1/changes/approve",
        serde_json::json!({ "change_ids": [change_id], "actor": ADMIN }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The registry now holds the record.
    let datasets = body_json(get(app.clone(), "/api/v1/datasets").await).await;
    let rows = datasets["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["dataset_id"], "DS-000001");
    assert_eq!(rows[0]["data_name"], "Wiki");
    assert_eq!(rows[0]["token_count"], 20.0);

    // One matching audit entry.
    let audit = body_json(get(app.clone(), "/api/v1/audit-log").await).await;
    let entries = audit["data"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "add");
    assert_eq!(entries[0]["dataset_id"], "DS-000001");
    assert_eq!(entries[0]["changed_by"], ADMIN);

    // Re-uploading the same file now yields no further added or modified
    // entry for that identifier.
    let rediff = body_json(upload_csv(app.clone(), CSV_ONE_ROW, "uploader", "add").await).await;
    assert_eq!(rediff["data"]["summary"]["added"], 0);
    assert_eq!(rediff["data"]["summary"]["modified"], 0);
    assert_eq!(rediff["data"]["summary"]["deleted"], 0);

    // And the audit chain verifies.
    let check = body_json(get(app, "/api/v1/audit-log/integrity-check").await).await;
    assert_eq!(check["data"]["chain_valid"], true);
    assert_eq!(check["data"]["verified_entries"], 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn modified_upload_carries_old_and_new_snapshots(pool: PgPool) {
    let app = common::build_test_app(pool);

    upload_csv(app.clone(), CSV_ONE_ROW, "uploader", "add").await;
    let pending = body_json(get(app.clone(), "/api/v1/changes/pending").await).await;
    let change_id = pending["data"]["added"][0]["id"].as_i64().unwrap();
    post_json(
        app.clone(),
        "/api/v1/changes/approve",
        serde_json::json!({ "change_ids": [change_id], "actor": ADMIN }),
    )
    .await;

    // Same identifier, different stage.
    let csv = "Dataset ID,Data Name,Training Stage,Token Count\n\
               DS-000001,Wiki,finetune,20\n";
    let json = body_json(upload_csv(app, csv, "uploader", "add").await).await;

    assert_eq!(json["data"]["summary"]["modified"], 1);
    let modified = &json["data"]["diff"]["modified"][0];
    assert_eq!(modified["old"]["training_stage"], "pretrain");
    assert_eq!(modified["new"]["training_stage"], "finetune");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn export_roundtrips_through_the_same_column_mapping(pool: PgPool) {
    let app = common::build_test_app(pool);

    upload_csv(app.clone(), CSV_ONE_ROW, "uploader", "add").await;
    let pending = body_json(get(app.clone(), "/api/v1/changes/pending").await).await;
    let change_id = pending["data"]["added"][0]["id"].as_i64().unwrap();
    post_json(
        app.clone(),
        "/api/v1/changes/approve",
        serde_json::json!({ "change_ids": [change_id], "actor": ADMIN }),
    )
    .await;

    let response = get(app.clone(), "/api/v1/datasets/export").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/csv"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let exported = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(exported.starts_with("Dataset ID,Data Name,"));
    assert!(exported.contains("DS-000001"));
    assert!(exported.contains("Wiki"));

    // Feeding the export back in add-only mode is a no-op diff.
    let rediff = body_json(upload_csv(app, &exported, "uploader", "add").await).await;
    assert_eq!(rediff["data"]["summary"]["added"], 0);
    assert_eq!(rediff["data"]["summary"]["modified"], 0);
}
