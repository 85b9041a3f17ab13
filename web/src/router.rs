use crate::{
    controller::{health_check_controller, integration_controller},
    params, AppState,
};
use axum::{
    routing::{get, post},
    Router,
};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Integration Broker API"
        ),
        paths(
            health_check_controller::health_check,
            integration_controller::authorize,
            integration_controller::oauth_callback,
            integration_controller::credentials,
            integration_controller::load,
        ),
        components(
            schemas(
                params::integration::UserOrgParams,
                params::integration::LoadParams,
            )
        ),
        tags(
            (name = "integration_broker", description = "OAuth brokering and item listing for third-party integrations")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(integration_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn integration_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/integrations/{provider}/authorize",
            post(integration_controller::authorize),
        )
        .route(
            "/integrations/{provider}/oauth2callback",
            get(integration_controller::oauth_callback),
        )
        .route(
            "/integrations/{provider}/credentials",
            post(integration_controller::credentials),
        )
        .route(
            "/integrations/{provider}/load",
            post(integration_controller::load),
        )
        .with_state(app_state)
}

pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}
