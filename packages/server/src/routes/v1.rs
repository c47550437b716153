use axum::extract::DefaultBodyLimit;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/rices", rice_routes(config))
        .nest("/users", user_routes(config))
        .nest("/comments", comment_routes())
        .nest("/reports", report_routes())
        .nest("/tags", tag_routes())
        .nest("/admin", admin_routes())
        .routes(routes!(handlers::health::health))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

fn rice_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    // A creation request carries the archive plus every preview image.
    let upload_limit =
        config.storage.max_file_size as usize * (config.storage.max_previews as usize + 1);

    OpenApiRouter::new()
        .routes(routes!(
            handlers::rice::fetch_rices,
            handlers::rice::create_rice
        ))
        .routes(routes!(
            handlers::rice::get_rice,
            handlers::rice::update_rice,
            handlers::rice::delete_rice
        ))
        .routes(routes!(handlers::rice::get_rice_comments))
        .routes(routes!(
            handlers::rice::download_dotfiles,
            handlers::rice::replace_dotfiles
        ))
        .routes(routes!(handlers::rice::add_preview))
        .routes(routes!(handlers::rice::delete_preview))
        .routes(routes!(
            handlers::rice::star_rice,
            handlers::rice::unstar_rice
        ))
        .layer(DefaultBodyLimit::max(upload_limit))
}

fn user_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::user::list_users))
        .routes(routes!(
            handlers::user::get_user,
            handlers::user::delete_user
        ))
        .routes(routes!(handlers::user::get_user_rices))
        .routes(routes!(handlers::rice::get_rice_by_slug))
        .routes(routes!(handlers::user::update_display_name))
        .routes(routes!(handlers::user::update_password))
        .routes(routes!(
            handlers::user::upload_avatar,
            handlers::user::delete_avatar
        ))
        .routes(routes!(handlers::user::ban_user, handlers::user::unban_user))
        .layer(DefaultBodyLimit::max(config.storage.max_file_size as usize))
}

fn comment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::comment::add_comment,
            handlers::comment::list_comments
        ))
        .routes(routes!(
            handlers::comment::get_comment,
            handlers::comment::update_comment,
            handlers::comment::delete_comment
        ))
}

fn report_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::report::create_report,
            handlers::report::list_reports
        ))
        .routes(routes!(handlers::report::get_report))
        .routes(routes!(handlers::report::close_report))
}

fn tag_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::tag::list_tags,
            handlers::tag::create_tag
        ))
        .routes(routes!(
            handlers::tag::update_tag,
            handlers::tag::delete_tag
        ))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::admin::get_stats))
}
