use std::env::{set_var, var_os};
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use crate::auth::TokenKeys;
use crate::config::ServeArgs;
use crate::store::{DynamoStore, MemoryStore, Store};
use crate::web::{self, AppState};

pub async fn build_state(args: &ServeArgs) -> anyhow::Result<AppState> {
    let store: Arc<dyn Store> = match &args.table {
        Some(table) => {
            tracing::info!(table = %table, "using DynamoDB store");
            Arc::new(DynamoStore::from_env(table.clone()).await)
        }
        None => {
            tracing::warn!("NOTES_TABLE not set, notes are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let tokens = match &args.jwt_secret {
        Some(secret) => TokenKeys::new(secret.as_bytes(), args.token_ttl_minutes),
        None => {
            tracing::warn!("JWT_SECRET not set, tokens are invalidated on restart");
            TokenKeys::random(args.token_ttl_minutes)?
        }
    };

    Ok(AppState::new(store, tokens))
}

/// Serves the API on a socket, or through the Lambda runtime when running inside one.
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let state = build_state(&args).await?;
    let app = web::app(state);

    if var_os("AWS_LAMBDA_RUNTIME_API").is_some() {
        // API Gateway stages would otherwise prefix every path, e.g. `/prod/notes`.
        set_var("AWS_LAMBDA_HTTP_IGNORE_STAGE_IN_PATH", "true");
        tracing::info!("running inside AWS Lambda");
        return lambda_http::run(app).await.map_err(|err| anyhow::anyhow!(err));
    }

    let addr = args.addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
