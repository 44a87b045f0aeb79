//! Web服务器

use anyhow::Context;
use axum::{
    routing::{delete, get, post},
    Router,
};
use klinik_core::VisitService;
use std::net::SocketAddr;
use std::path::PathBuf;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;

use crate::handlers::{
    api_root, create_visit, delete_visit, delete_visit_by_query, get_summary, get_visits, health,
};

/// 处理器共享状态
#[derive(Clone)]
pub struct AppState {
    pub service: VisitService,
}

impl AppState {
    pub fn new(service: VisitService) -> Self {
        Self { service }
    }
}

pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, state: AppState, static_dir: Option<PathBuf>) -> Self {
        let mut app = create_app(state);
        if let Some(dir) = static_dir {
            info!("Serving static files from {}", dir.display());
            app = app.nest_service("/static", ServeDir::new(dir));
        }

        Self { addr, app }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        info!("Starting web server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("Failed to bind {}", self.addr))?;
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Web server terminated unexpectedly")?;

        info!("Web server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

/// 构建路由（不含静态文件）
pub fn create_app(state: AppState) -> Router {
    Router::new()
        // 根路径
        .route("/", get(api_root))
        // 健康检查
        .route("/health", get(health))
        // API路由
        .nest("/api/v1", api_routes())
        // 兼容旧前端的路径
        .route("/get-data", get(get_visits))
        .route("/submit-data", post(create_visit))
        .route("/delete-data", delete(delete_visit_by_query))
        .route("/api/get-data", get(get_visits))
        .route("/api/submit-data", post(create_visit))
        .route("/api/delete-data", delete(delete_visit_by_query))
        .with_state(state)
        // 全局中间件
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
}

/// API v1 路由
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api_root))
        .route("/visits", get(get_visits).post(create_visit))
        .route("/visits/:id", delete(delete_visit))
        .route("/summary", get(get_summary))
}
