//! # Axum router
//!
//! JSON API under `/api`, plus `/healthz` and `/metrics`. Authentication is
//! resolved by extractors, so a protected route answers 401/403 before its
//! handler body runs.

mod error;
pub mod extract;
pub mod handlers;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info_span;

pub use error::{ApiError, ApiResult};

use crate::state::AppState;
use handlers::{accounts, chapters, stories, volumes};

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/stories", get(stories::search).post(stories::create))
        .route(
            "/stories/{story_id}",
            get(stories::detail).put(stories::update).delete(stories::remove),
        )
        .route("/stories/{story_id}/banner", put(stories::set_banner))
        .route("/stories/{story_id}/rating", post(accounts::rate))
        .route("/stories/{story_id}/volumes", post(volumes::add))
        .route("/stories/{story_id}/volumes/order", put(volumes::reorder))
        .route(
            "/stories/{story_id}/volumes/{volume_id}",
            put(volumes::rename).delete(volumes::remove),
        )
        .route(
            "/stories/{story_id}/volumes/{volume_id}/chapters",
            post(volumes::add_chapter),
        )
        .route(
            "/stories/{story_id}/volumes/{volume_id}/chapters/order",
            put(volumes::reorder_chapters),
        )
        .route(
            "/stories/{story_id}/chapters/{chapter_id}",
            get(chapters::read).put(chapters::update).delete(chapters::remove),
        )
        .route(
            "/stories/{story_id}/chapters/{chapter_id}/views",
            post(chapters::record_view),
        )
        .route(
            "/stories/{story_id}/chapters/{chapter_id}/comments",
            get(chapters::list_comments).post(chapters::post_comment),
        )
        .route("/comments/{comment_id}", delete(chapters::delete_comment))
        .route("/banner", get(stories::banner))
        .route("/auth/register", post(accounts::register))
        .route("/auth/login", post(accounts::login))
        .route("/auth/me", get(accounts::me))
        .route("/me/preferences", get(accounts::preferences))
        .route(
            "/me/favorites/{story_id}",
            put(accounts::add_favorite).delete(accounts::remove_favorite),
        )
        .route(
            "/me/bookmarks/{story_id}",
            put(accounts::set_bookmark).delete(accounts::remove_bookmark),
        );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let trace = TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
        let request_id = req
            .headers()
            .get(&REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        info_span!("http", method = %req.method(), uri = %req.uri(), request_id)
    });

    Router::new()
        .nest("/api", api)
        .route("/healthz", get(handlers::healthz))
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn_with_state(state.clone(), count_requests))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(REQUEST_ID, MakeRequestUuid))
                .layer(trace)
                .layer(PropagateRequestIdLayer::new(REQUEST_ID))
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}

async fn count_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let response = next.run(req).await;
    state
        .metrics
        .observe_request(method.as_str(), response.status().as_u16());
    response
}
