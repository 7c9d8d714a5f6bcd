use super::handlers::{health, sign_out};
use utoipa::OpenApi;

/// `OpenAPI` document for the machine-facing routes. HTML pages are not documented.
#[derive(OpenApi)]
#[openapi(
    paths(health::health, sign_out::sign_out),
    components(schemas(health::Health)),
    tags(
        (name = "health", description = "Liveness and build information"),
        (name = "auth", description = "Session lifecycle")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
