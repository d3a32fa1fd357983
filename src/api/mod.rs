//! HTTP 接口模块
//!
//! axum 路由与服务启动；业务语义在 beds / auth / storage 中

pub mod handlers;

use anyhow::Context;
use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::storage::Storage;

/// 按请求注入的共享状态
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub tokens: TokenIssuer,
}

/// 组装全部路由
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/hospitals", get(handlers::list_hospitals))
        .route("/api/v1/hospitals/:id", get(handlers::hospital_details))
        .route(
            "/api/v1/beds/status",
            get(handlers::bed_status).post(handlers::update_bed_status),
        )
        .route("/api/v1/beds/requests", post(handlers::create_bed_request))
        .route("/api/v1/images/hero", get(handlers::hero_images))
        .route("/api/v1/auth/staff/login", post(handlers::staff_login))
        .route(
            "/api/v1/auth/patients/register",
            post(handlers::patient_register),
        )
        .route("/api/v1/auth/patients/login", post(handlers::patient_login))
        .route("/api/v1/auth/session", get(handlers::session))
        .with_state(state)
        .layer(cors)
}

/// 启动 HTTP 服务（含优雅关闭）
pub async fn serve(config: &Config, storage: Storage) -> anyhow::Result<()> {
    let state = AppState {
        storage,
        tokens: TokenIssuer::new(
            config.auth.token_secret.clone(),
            config.auth.token_ttl_hours,
        ),
    };

    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("监听地址不合法")?;

    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("无法绑定监听地址: {}", addr))?;

    tracing::info!("HTTP 服务已启动: http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP 服务异常退出")?;

    tracing::info!("HTTP 服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("无法监听退出信号: {}", e);
        return;
    }
    tracing::info!("收到退出信号，正在关闭...");
}
