#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    Router,
};
use reqwest::StatusCode;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use coop_content_api::components::ComponentRegistry;
use coop_content_api::config::AppConfig;
use coop_content_api::state::{memory_state, router, MemoryHandles};
use coop_content_api::tree::{
    MemoryTreeStore, NewNode, NodeId, ScopeKey, TreeMutator, TreeNode, TreeQueries,
};
use coop_content_api::types::EntityKind;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // The memory backend needs no database
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_coop-content-api"));
        cmd.env("CONTENT_API_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("TREE_BACKEND", "memory")
            .env("SUBMISSION_RATE_LIMIT_REQUESTS", "2")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Memory-backed engine for driving the tree directly
pub struct Engine {
    pub store: MemoryTreeStore,
    pub mutator: TreeMutator<MemoryTreeStore>,
    pub queries: TreeQueries<MemoryTreeStore>,
    pub handles: MemoryHandles,
}

pub fn engine() -> Engine {
    let store = MemoryTreeStore::new();
    let (registry, components) = ComponentRegistry::in_memory();
    let shared = Arc::new(store.clone());
    Engine {
        mutator: TreeMutator::new(shared.clone(), Arc::new(registry)),
        queries: TreeQueries::new(shared),
        handles: MemoryHandles {
            store: store.clone(),
            components,
        },
        store,
    }
}

impl Engine {
    pub async fn root(&self, kind: EntityKind, scope: &ScopeKey, title: &str) -> Result<TreeNode> {
        let node = self
            .mutator
            .create(kind, NewNode::new(scope.clone(), title).slug(slugify(title)))
            .await?;
        Ok(node)
    }

    pub async fn child(&self, kind: EntityKind, parent: NodeId, scope: &ScopeKey, title: &str) -> Result<TreeNode> {
        let node = self
            .mutator
            .create(kind, NewNode::new(scope.clone(), title).slug(slugify(title)).under(parent))
            .await?;
        Ok(node)
    }

    /// Titles of a scope's members in position order
    pub async fn order(&self, kind: EntityKind, any_member: NodeId) -> Result<Vec<String>> {
        let siblings = self.queries.siblings(kind, any_member).await?;
        Ok(siblings.into_iter().map(|n| n.title).collect())
    }

    pub async fn positions(&self, kind: EntityKind, any_member: NodeId) -> Result<Vec<i32>> {
        let siblings = self.queries.siblings(kind, any_member).await?;
        Ok(siblings.into_iter().map(|n| n.position).collect())
    }
}

pub fn slugify(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}

pub fn org() -> ScopeKey {
    ScopeKey::new(Uuid::new_v4())
}

/// In-process router over a fresh memory store
pub fn app() -> (Router, MemoryHandles) {
    let mut config = AppConfig::development();
    config.submission.rate_limit_requests = 2;
    let (state, handles) = memory_state(&config);
    (router(state, false), handles)
}

/// Send one request through the router and decode the JSON body
pub async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json)?)
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body)?).await?;
    let status = StatusCode::from_u16(response.status().as_u16())?;
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}
