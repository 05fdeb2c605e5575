// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, category, comment, genre, review, title, user},
    state::AppState,
    utils::jwt::authenticate,
};

/// Assembles the main application router.
///
/// * Mounts every resource under `/api/v1`.
/// * Resolves the caller on every API request (anonymous without a token).
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/token", post(auth::token));

    let catalog_routes = Router::new()
        .route(
            "/categories",
            get(category::list_categories).post(category::create_category),
        )
        .route("/categories/{slug}", delete(category::delete_category))
        .route("/genres", get(genre::list_genres).post(genre::create_genre))
        .route("/genres/{slug}", delete(genre::delete_genre))
        .route("/titles", get(title::list_titles).post(title::create_title))
        .route(
            "/titles/{title_id}",
            get(title::get_title)
                .put(title::replace_title)
                .patch(title::update_title)
                .delete(title::delete_title),
        );

    let content_routes = Router::new()
        .route(
            "/titles/{title_id}/reviews",
            get(review::list_reviews).post(review::create_review),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}",
            get(review::get_review)
                .patch(review::update_review)
                .delete(review::delete_review),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments",
            get(comment::list_comments).post(comment::create_comment),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
            get(comment::get_comment)
                .patch(comment::update_comment)
                .delete(comment::delete_comment),
        );

    // `/users/me` is a static segment and wins over `/users/{username}`.
    let user_routes = Router::new()
        .route("/users", get(user::list_users).post(user::create_user))
        .route("/users/me", get(user::get_me).patch(user::update_me))
        .route(
            "/users/{username}",
            get(user::get_user)
                .patch(user::update_user)
                .delete(user::delete_user),
        );

    let api_routes = Router::new()
        .merge(auth_routes)
        .merge(catalog_routes)
        .merge(content_routes)
        .merge(user_routes)
        .layer(middleware::from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .nest("/api/v1", api_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
