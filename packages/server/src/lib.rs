pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod feed;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod seed;
pub mod state;
pub mod utils;

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::CorsConfig;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "RiceHub API",
        version = "1.0.0",
        description = "API for the RiceHub desktop customization sharing platform"
    ),
    tags(
        (name = "Auth", description = "Registration, login and session info"),
        (name = "Rices", description = "The rice feed, rice CRUD, stars and downloads"),
        (name = "Users", description = "Profiles, avatars and moderation bans"),
        (name = "Comments", description = "Comments on rices"),
        (name = "Reports", description = "User reports against rices and comments"),
        (name = "Tags", description = "Curated tag list"),
        (name = "Admin", description = "Service administration"),
        (name = "Health", description = "Liveness probe"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(cors.max_age));

    if cors.allow_origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = cors
            .allow_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer.allow_origin(origins)
    }
}

/// Build the application router.
///
/// Stored media is served read-only under `/public`, matching the
/// default `cdn_url`; deployments with a real CDN point `cdn_url`
/// elsewhere and can firewall this route off.
pub fn build_router(state: AppState) -> axum::Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", routes::api_routes(&state.config))
        .split_for_parts();

    router
        .nest_service(
            "/public",
            ServeDir::new(&state.config.storage.root_dir),
        )
        .layer(cors_layer(&state.config.server.cors))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api))
}
