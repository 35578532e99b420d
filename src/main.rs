// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Module host entrypoint (systemd-friendly).
//! Opens the store, brings the auth module to its consensus version and serves
//! metrics until interrupted.

use std::sync::Arc;

use amunchain_modkit::{
    config::NodeConfig,
    core::{
        module::{descriptor::DescriptorReport, AuthModule, ModuleError},
        security::verifier::DefaultVerifier,
        state::persistent_state::PersistentState,
    },
    monitoring::{logging, metrics::Metrics},
};
use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{error, info, warn};

/// Exit code for a failed store migration.
const EXIT_MIGRATION: i32 = 2;

struct AppState {
    module: Arc<AuthModule>,
    metrics: Arc<Metrics>,
}

#[derive(Deserialize)]
struct QueryArgs {
    arg: Option<String>,
}

async fn metrics_handler(State(app): State<Arc<AppState>>) -> Result<String, StatusCode> {
    app.metrics
        .encode_text()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

async fn capabilities_handler(State(app): State<Arc<AppState>>) -> Json<DescriptorReport> {
    Json(app.module.report())
}

async fn query_handler(
    State(app): State<Arc<AppState>>,
    Path(route): Path<String>,
    Query(q): Query<QueryArgs>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let Some(svc) = app.module.descriptor().services else {
        return Err((StatusCode::NOT_FOUND, "no services".into()));
    };
    svc.query(&route, q.arg.as_deref())
        .map(Json)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "ctrl-c handler failed");
    }
    info!("shutdown requested");
}

async fn run(cfg: NodeConfig) -> anyhow::Result<()> {
    let metrics = Arc::new(Metrics::new().context("metrics init")?);

    let data_dir = cfg.node.data_dir.to_string_lossy().to_string();
    let state = PersistentState::open(&data_dir).context("open store")?;

    let mut builder = AuthModule::builder(state)
        .metrics(metrics.clone())
        .max_tx_bytes(cfg.ante.max_tx_bytes);
    if cfg.ante.verify_signatures {
        builder = builder.signature_verifier(Arc::new(DefaultVerifier::new()));
    }
    let module = Arc::new(builder.build()?);

    if module.stored_version()?.is_none() {
        if let Some(path) = &cfg.chain.genesis_path {
            let raw = std::fs::read(path)
                .with_context(|| format!("read genesis {}", path.display()))?;
            module.import_genesis(&raw)?;
            info!(path = %path.display(), "genesis imported");
        }
    }

    let outcome = module.run_upgrade()?;
    info!(
        module = %outcome.module,
        from = ?outcome.from,
        to = outcome.to,
        steps = outcome.steps_applied,
        "store ready"
    );

    let app_state = Arc::new(AppState {
        module: module.clone(),
        metrics,
    });
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/capabilities", get(capabilities_handler))
        .route("/query/:route", get(query_handler))
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(cfg.http.listen_addr.as_str())
        .await
        .with_context(|| format!("bind {}", cfg.http.listen_addr))?;
    info!(addr = %cfg.http.listen_addr, "http listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let cfg = match NodeConfig::load_from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config: {e}");
            std::process::exit(1);
        }
    };
    logging::init(&cfg.logging);
    info!(
        node = %cfg.node.name,
        chain_id = %cfg.chain.chain_id,
        git_sha = option_env!("VERGEN_GIT_SHA").unwrap_or("unknown"),
        "modkit node starting"
    );

    if let Err(e) = run(cfg).await {
        error!(error = %e, "node stopped");
        let code = match e.downcast_ref::<ModuleError>() {
            Some(ModuleError::Migration(_)) => EXIT_MIGRATION,
            _ => 1,
        };
        std::process::exit(code);
    }
}
