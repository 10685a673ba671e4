//! HTTP router and metrics recorder

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::handlers::{self, health, index, ready};
use crate::rate_limit::{limit_api, limit_auth};
use crate::state::AppState;

/// Build the full application router
pub fn build_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let request_timeout = state.request_timeout();

    // Register and login (strict per-IP limit)
    let auth_routes = Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route_layer(middleware::from_fn_with_state(state.clone(), limit_auth));

    let api_routes = Router::new()
        // Account
        .route("/auth/me", get(handlers::me))
        .route("/auth/logout", post(handlers::logout))
        // Projects
        .route(
            "/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route(
            "/projects/{id}",
            get(handlers::get_project)
                .put(handlers::update_project)
                .delete(handlers::delete_project),
        )
        .route(
            "/projects/{id}/permissions",
            post(handlers::add_project_permission),
        )
        .route(
            "/projects/{id}/permissions/{pid}",
            put(handlers::update_project_permission).delete(handlers::delete_project_permission),
        )
        // Riders
        .route(
            "/riders",
            get(handlers::list_riders).post(handlers::create_rider),
        )
        .route(
            "/riders/{id}",
            get(handlers::get_rider)
                .put(handlers::update_rider)
                .delete(handlers::delete_rider),
        )
        .route(
            "/riders/{id}/permissions",
            post(handlers::add_rider_permission),
        )
        .route(
            "/riders/{id}/permissions/{pid}",
            put(handlers::update_rider_permission).delete(handlers::delete_rider_permission),
        )
        // Comments
        .route(
            "/riders/{id}/comments",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        .route(
            "/riders/{id}/comments/{cid}",
            put(handlers::update_comment).delete(handlers::delete_comment),
        )
        // Subscriptions
        .route("/subscriptions/types", get(handlers::list_plans))
        .route("/subscriptions/my-subscription", get(handlers::my_subscription))
        .route("/subscriptions/checkout", post(handlers::create_checkout))
        .route("/subscriptions/transactions", get(handlers::list_transactions))
        .route(
            "/subscriptions/transactions/{id}",
            get(handlers::get_transaction),
        )
        // Activity and favorites
        .route("/user/activities", get(handlers::list_activities))
        .route(
            "/user/favorites",
            get(handlers::list_favorites).post(handlers::create_favorite),
        )
        .route("/user/favorites/{id}", axum::routing::delete(handlers::delete_favorite))
        // Upstream sync
        .route("/sync/refresh", post(handlers::sync::refresh))
        .route_layer(middleware::from_fn_with_state(state.clone(), limit_api));

    // Webhook route (separate - uses raw body, no JSON parsing)
    let webhook_routes = Router::new().route("/webhook/stripe", post(handlers::stripe_webhook));

    // Health routes (no timeout - must always respond quickly)
    let health_routes = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/ready", get(ready));

    // Metrics route (no timeout)
    let metrics_route = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    // Build middleware stack (order matters - outermost first)
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .merge(auth_routes)
        .merge(api_routes)
        .merge(webhook_routes)
        .layer(middleware)
        .merge(health_routes)
        .merge(metrics_route)
        .with_state(state)
}

/// Install the Prometheus recorder and describe the service's metrics
pub fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Most operations are one or two queries; checkout calls out to Stripe
    let latency_buckets = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("rider_operation_duration_seconds".to_string()),
            latency_buckets,
        )?;

    let handle = builder.install_recorder()?;

    metrics::describe_counter!(
        "rider_registrations_total",
        "Total accounts registered"
    );
    metrics::describe_counter!(
        "rider_checkouts_created_total",
        "Total checkout sessions created"
    );
    metrics::describe_counter!(
        "rider_webhooks_processed_total",
        "Total webhooks processed by status"
    );
    metrics::describe_counter!(
        "rider_quota_rejections_total",
        "Rider creations rejected by plan quota"
    );
    metrics::describe_counter!(
        "rider_permission_denials_total",
        "Rider access denials by action"
    );
    metrics::describe_counter!(
        "rider_rate_limited_total",
        "Requests rejected by the per-IP limiter by bucket"
    );
    metrics::describe_counter!("rider_bds_sync_total", "BDS sync passes by result");
    metrics::describe_histogram!(
        "rider_operation_duration_seconds",
        "Operation latency in seconds by operation type"
    );

    Ok(handle)
}
