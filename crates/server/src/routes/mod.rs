//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /api/auth/session               - Establish session from signed hand-off
//! DELETE /api/auth/session               - Logout
//! GET    /api/auth/me                    - Current user
//!
//! # Brand kits
//! GET    /api/brand-kits                 - List
//! POST   /api/brand-kits                 - Create
//! GET    /api/brand-kits/{id}            - Show
//! PUT    /api/brand-kits/{id}            - Replace
//! DELETE /api/brand-kits/{id}            - Delete
//! POST   /api/brand-kits/{id}/activate   - Make the only active kit
//!
//! # Creations
//! GET    /api/creations                  - List (?limit&offset&kind)
//! GET    /api/creations/{id}             - Show
//! PUT    /api/creations/{id}             - Edit headline/content/metadata
//! DELETE /api/creations/{id}             - Delete
//! POST   /api/creations/{id}/share       - Create share token
//! DELETE /api/creations/{id}/share       - Revoke share token
//! GET    /api/my-flyers                  - Flyers only
//!
//! # Generation (rate limited)
//! POST   /api/generate                   - One design
//! POST   /api/adburst                    - Up to four variations
//!
//! # Social
//! GET    /api/social-accounts            - List
//! POST   /api/social-accounts            - Connect
//! PUT    /api/social-accounts/{id}       - Update
//! DELETE /api/social-accounts/{id}       - Disconnect
//! GET    /api/social-posts               - List (?status)
//! POST   /api/social-posts               - Schedule
//! PUT    /api/social-posts/{id}          - Edit while scheduled
//! DELETE /api/social-posts/{id}          - Delete
//!
//! # Inspiration
//! GET    /api/ad-inspiration/search      - Image search (?q&limit)
//! GET    /api/ad-inspiration/saved       - Saved ads
//! POST   /api/ad-inspiration/saved       - Save ad
//! DELETE /api/ad-inspiration/saved/{id}  - Delete saved ad
//!
//! # Credits and sharing
//! GET    /api/credits                    - Balance, tier, recent transactions
//! GET    /api/share/{token}              - Public JSON view
//! GET    /share/{token}                  - Public HTML page
//! ```

pub mod auth;
pub mod brand_kits;
pub mod creations;
pub mod credits;
pub mod extract;
pub mod generate;
pub mod inspiration;
pub mod share;
pub mod social;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter, generation_rate_limiter};
use crate::state::AppState;

/// Session establishment, behind the auth limiter.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/session", post(auth::establish).delete(auth::logout))
        .layer(auth_rate_limiter())
        .route("/me", get(auth::me))
}

/// Endpoints that launch a browser, behind the generation limiter.
pub fn generation_routes() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate::generate))
        .route("/adburst", post(generate::adburst))
        .layer(generation_rate_limiter())
}

/// Brand kit routes.
pub fn brand_kit_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(brand_kits::list).post(brand_kits::create))
        .route(
            "/{id}",
            get(brand_kits::show)
                .put(brand_kits::update)
                .delete(brand_kits::delete),
        )
        .route("/{id}/activate", post(brand_kits::activate))
}

/// Creation library routes.
pub fn creation_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(creations::list))
        .route(
            "/{id}",
            get(creations::show)
                .put(creations::update)
                .delete(creations::delete),
        )
        .route(
            "/{id}/share",
            post(creations::share).delete(creations::unshare),
        )
}

/// Social account and post routes.
pub fn social_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/social-accounts",
            get(social::list_accounts).post(social::create_account),
        )
        .route(
            "/social-accounts/{id}",
            put(social::update_account).delete(social::delete_account),
        )
        .route(
            "/social-posts",
            get(social::list_posts).post(social::create_post),
        )
        .route(
            "/social-posts/{id}",
            put(social::update_post).delete(social::delete_post),
        )
}

/// Inspiration routes.
pub fn inspiration_routes() -> Router<AppState> {
    Router::new()
        .route("/search", get(inspiration::search))
        .route(
            "/saved",
            get(inspiration::list_saved).post(inspiration::save),
        )
        .route("/saved/{id}", axum::routing::delete(inspiration::delete_saved))
}

/// Everything under `/api`.
pub fn api_routes() -> Router<AppState> {
    let general = Router::new()
        .nest("/brand-kits", brand_kit_routes())
        .nest("/creations", creation_routes())
        .route("/my-flyers", get(creations::my_flyers))
        .merge(social_routes())
        .nest("/ad-inspiration", inspiration_routes())
        .route("/credits", get(credits::summary))
        .route("/share/{token}", get(share::show_json))
        .layer(api_rate_limiter());

    Router::new()
        .nest("/auth", auth_routes())
        .merge(generation_routes())
        .merge(general)
}

/// All application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api", api_routes())
        .route("/share/{token}", get(share::show_page))
}
