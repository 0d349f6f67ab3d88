mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn server_serves_the_tree_api() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/health", server.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::OK, "expected 200 OK, got {}", res.status());

    let res = client
        .post(format!("{}/api/page-components", server.base_url))
        .json(&json!({ "scope": { "owner": Uuid::new_v4() }, "title": "Hero" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body = res.json::<Value>().await?;
    assert!(body.get("success").and_then(|v| v.as_bool()).unwrap_or(false), "success flag false or missing: {}", body);
    assert_eq!(body["data"]["position"], 1, "first component should take position 1: {}", body);

    let id = body["data"]["id"].as_str().unwrap_or_default();
    let res = client
        .get(format!("{}/api/page-components/{}", server.base_url, id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}
