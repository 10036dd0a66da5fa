//! Integration tests for the decision endpoints and their authorization
//! gate.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, post_json, upload_csv, ADMIN};
use sqlx::PgPool;

const CSV_ONE_ROW: &str = "Dataset ID,Data Name,Training Stage\n\
                           DS-000001,Wiki,pretrain\n";

async fn pending_change_id(app: axum::Router) -> i64 {
    let pending = body_json(get(app, "/api/v1/changes/pending").await).await;
    pending["data"]["added"][0]["id"].as_i64().unwrap()
}

#[sqlx::test(migrations = "../db/migrations")]
async fn non_admin_actor_gets_a_distinct_authorization_error(pool: PgPool) {
    let app = common::build_test_app(pool);

    upload_csv(app.clone(), CSV_ONE_ROW, "uploader", "add").await;
    let change_id = pending_change_id(app.clone()).await;

    let response = post_json(
        app.clone(),
        "/api/v1/changes/approve",
        serde_json::json!({ "change_ids": [change_id], "actor": "mallory" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "FORBIDDEN");
    // The error names the required administrator identity.
    assert!(json["error"].as_str().unwrap().contains(ADMIN));

    // Nothing moved: change still pending, registry empty, no audit.
    let pending = body_json(get(app.clone(), "/api/v1/changes/pending").await).await;
    assert_eq!(pending["data"]["added"].as_array().unwrap().len(), 1);
    let datasets = body_json(get(app.clone(), "/api/v1/datasets").await).await;
    assert!(datasets["data"].as_array().unwrap().is_empty());
    let audit = body_json(get(app, "/api/v1/audit-log").await).await;
    assert!(audit["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn reject_leaves_the_registry_untouched(pool: PgPool) {
    let app = common::build_test_app(pool);

    upload_csv(app.clone(), CSV_ONE_ROW, "uploader", "add").await;
    let change_id = pending_change_id(app.clone()).await;

    let response = post_json(
        app.clone(),
        "/api/v1/changes/reject",
        serde_json::json!({ "change_ids": [change_id], "actor": ADMIN }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["decided"], 1);

    let datasets = body_json(get(app.clone(), "/api/v1/datasets").await).await;
    assert!(datasets["data"].as_array().unwrap().is_empty());
    let audit = body_json(get(app.clone(), "/api/v1/audit-log").await).await;
    assert!(audit["data"].as_array().unwrap().is_empty());

    // No longer pending.
    let pending = body_json(get(app, "/api/v1/changes/pending").await).await;
    assert!(pending["data"]["added"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn deciding_unknown_ids_is_a_silent_noop(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/changes/approve",
        serde_json::json!({ "change_ids": [41, 42, 43], "actor": ADMIN }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["decided"], 0);
    assert_eq!(json["data"]["skipped"], 3);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn pending_listing_filters_by_kind(pool: PgPool) {
    let app = common::build_test_app(pool);

    upload_csv(app.clone(), CSV_ONE_ROW, "uploader", "add").await;

    let filtered = body_json(get(app.clone(), "/api/v1/changes/pending?kind=delete").await).await;
    assert!(filtered["data"]["added"].as_array().unwrap().is_empty());

    let filtered = body_json(get(app.clone(), "/api/v1/changes/pending?kind=add").await).await;
    assert_eq!(filtered["data"]["added"].as_array().unwrap().len(), 1);

    let response = get(app, "/api/v1/changes/pending?kind=rename").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn config_endpoint_names_the_reviewer(pool: PgPool) {
    let app = common::build_test_app(pool);

    let json = body_json(get(app, "/api/v1/config").await).await;
    assert_eq!(json["data"]["admin_user"], ADMIN);
    assert!(json["data"]["message"].as_str().unwrap().contains(ADMIN));
}
