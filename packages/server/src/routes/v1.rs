use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/members", member_routes())
        .nest("/teams", team_routes())
        .nest("/sub-teams", sub_team_routes())
        .nest("/sponsors", sponsor_routes())
        .nest("/gallery", gallery_routes())
        .nest("/videos", video_routes())
        .nest("/admin", admin_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::logout))
        .routes(routes!(handlers::auth::me))
        .routes(routes!(handlers::auth::update_password))
        .routes(routes!(handlers::auth::update_email))
}

fn member_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::member::update_profile_picture,
            handlers::member::delete_profile_picture
        ))
        .layer(handlers::member::profile_picture_body_limit())
}

fn team_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::team::list_teams,
            handlers::team::create_team
        ))
        .routes(routes!(
            handlers::team::get_team,
            handlers::team::update_team,
            handlers::team::delete_team
        ))
        .layer(handlers::team::team_upload_body_limit())
}

fn sub_team_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::sub_team::list_sub_teams,
            handlers::sub_team::create_sub_team
        ))
        .routes(routes!(
            handlers::sub_team::get_sub_team,
            handlers::sub_team::update_sub_team,
            handlers::sub_team::delete_sub_team
        ))
        .layer(handlers::sub_team::sub_team_upload_body_limit())
}

fn sponsor_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::sponsor::list_sponsors,
            handlers::sponsor::create_sponsor
        ))
        .routes(routes!(
            handlers::sponsor::get_sponsor,
            handlers::sponsor::update_sponsor,
            handlers::sponsor::delete_sponsor
        ))
        .layer(handlers::sponsor::sponsor_upload_body_limit())
}

fn gallery_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::gallery::list_gallery_items,
            handlers::gallery::create_gallery_item
        ))
        .routes(routes!(
            handlers::gallery::get_gallery_item,
            handlers::gallery::update_gallery_item,
            handlers::gallery::delete_gallery_item
        ))
        .layer(handlers::gallery::gallery_upload_body_limit())
}

fn video_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::video::list_videos,
            handlers::video::create_video
        ))
        .routes(routes!(
            handlers::video::get_video,
            handlers::video::update_video,
            handlers::video::delete_video
        ))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::admin::list_allowed_members,
            handlers::admin::add_allowed_member
        ))
        .routes(routes!(handlers::admin::remove_allowed_member))
        .routes(routes!(handlers::admin::list_members))
        .routes(routes!(handlers::admin::soft_delete_member))
        .routes(routes!(handlers::admin::assign_member_team))
        .routes(routes!(handlers::admin::change_member_role))
}
