use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::posts::list_posts,
        api::posts::create_post,
        api::posts::get_post,
        api::posts::update_post,
        api::posts::delete_post,
    ),
    tags(
        (name = "inkpost", description = "Inkpost API")
    )
)]
pub struct ApiDoc;
