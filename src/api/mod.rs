// Copyright (c) MySocial Team
// SPDX-License-Identifier: Apache-2.0

pub mod handlers;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::state::AppState;
use crate::storage::MAX_IMAGE_BYTES;

/// Build the application router with all routes and middleware attached.
pub fn build_router(state: AppState) -> Router {
    let config = Config::get();

    let cors = if config.api.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::permissive()
    };

    Router::new()
        // General routes
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::get_metrics))
        // User routes
        .route(
            "/api/users",
            get(handlers::users::list_users).post(handlers::users::register_account),
        )
        .route(
            "/api/users/:id",
            get(handlers::users::get_user).patch(handlers::users::update_user),
        )
        .route(
            "/api/users/:id/follow",
            post(handlers::social_graph::follow_user)
                .delete(handlers::social_graph::unfollow_user)
                .get(handlers::social_graph::follow_status),
        )
        .route(
            "/api/users/:id/followers",
            get(handlers::social_graph::get_followers),
        )
        .route(
            "/api/users/:id/following",
            get(handlers::social_graph::get_following),
        )
        .route(
            "/api/users/upload-avatar",
            post(handlers::uploads::upload_avatar),
        )
        // Post routes
        .route(
            "/api/posts",
            get(handlers::posts::list_posts).post(handlers::posts::create_post),
        )
        .route(
            "/api/posts/upload-image",
            post(handlers::uploads::upload_post_image),
        )
        .route(
            "/api/posts/:id",
            get(handlers::posts::get_post)
                .patch(handlers::posts::update_post)
                .delete(handlers::posts::delete_post),
        )
        .route(
            "/api/posts/:id/like",
            post(handlers::engagement::toggle_like).delete(handlers::engagement::unlike_post),
        )
        .route(
            "/api/posts/:id/comments",
            get(handlers::engagement::list_comments).post(handlers::engagement::create_comment),
        )
        .route(
            "/api/posts/:id/comments/:comment_id",
            patch(handlers::engagement::update_comment)
                .delete(handlers::engagement::delete_comment),
        )
        // Notification routes
        .route(
            "/api/notifications",
            get(handlers::notifications::list_notifications)
                .patch(handlers::notifications::mark_all_read),
        )
        .route(
            "/api/notifications/:id",
            patch(handlers::notifications::mark_read),
        )
        // Admin routes
        .route("/api/admin/users/:id", get(handlers::admin::admin_get_user))
        .route(
            "/api/admin/users/:id/promote",
            post(handlers::admin::promote_user),
        )
        .route(
            "/api/admin/users/:id/deactivate",
            post(handlers::admin::deactivate_user),
        )
        .route(
            "/api/admin/users/:id/reactivate",
            post(handlers::admin::reactivate_user),
        )
        .route(
            "/api/admin/posts/:id",
            delete(handlers::admin::admin_delete_post),
        )
        .route(
            "/api/admin/posts/:id/reconcile",
            post(handlers::admin::reconcile_post),
        )
        // Add state and middleware
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the API server
pub async fn start_api_server(state: AppState) -> Result<()> {
    let config = Config::get();
    let app = build_router(state);

    let addr = format!("{}:{}", config.api.host, config.api.port);
    info!("Starting API server on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received, stopping API server");
}
