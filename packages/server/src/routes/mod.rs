use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/user", user_routes())
        .nest("/recipe", recipe_routes(config))
        .nest("/admin", admin_routes())
        .nest("/media", media_routes())
        .routes(routes!(handlers::health::health))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::user::create_user))
        .routes(routes!(handlers::user::create_token))
        .routes(routes!(
            handlers::user::get_me,
            handlers::user::replace_me,
            handlers::user::update_me
        ))
}

fn recipe_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(handlers::tag::list_tags, handlers::tag::create_tag))
        .routes(routes!(
            handlers::tag::get_tag,
            handlers::tag::replace_tag,
            handlers::tag::update_tag,
            handlers::tag::delete_tag
        ))
        .routes(routes!(
            handlers::ingredient::list_ingredients,
            handlers::ingredient::create_ingredient
        ))
        .routes(routes!(
            handlers::ingredient::get_ingredient,
            handlers::ingredient::replace_ingredient,
            handlers::ingredient::update_ingredient,
            handlers::ingredient::delete_ingredient
        ))
        .routes(routes!(
            handlers::recipe::list_recipes,
            handlers::recipe::create_recipe
        ))
        .routes(routes!(
            handlers::recipe::get_recipe,
            handlers::recipe::replace_recipe,
            handlers::recipe::update_recipe,
            handlers::recipe::delete_recipe
        ));

    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::recipe::upload_recipe_image))
        .layer(handlers::recipe::upload_body_limit(&config.media));

    crud.merge(upload)
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::admin::list_users,
            handlers::admin::create_user
        ))
        .routes(routes!(handlers::admin::get_user, handlers::admin::update_user))
}

fn media_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::media::get_recipe_image))
}
