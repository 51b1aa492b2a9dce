use actix_cors::Cors;
use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware::Logger,
    web, App, Error,
};

use crate::auth::AuthMiddleware;
use crate::routes::{self, health, TOTAL_COUNT_HEADER};
use crate::{openapi, state::AppState};

/// Builds the application: CORS and request logging around everything,
/// `/health` and `/v3/api-docs` in the open, and the REST API under `/api`
/// behind `AuthMiddleware`.
///
/// Shared by `main` and the integration tests.
pub fn create_app(
    state: web::Data<AppState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .wrap(
            Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .expose_headers([TOTAL_COUNT_HEADER])
                .max_age(3600),
        )
        .wrap(Logger::default())
        .service(health::health)
        .service(openapi::api_docs)
        .service(
            web::scope("/api")
                .wrap(AuthMiddleware)
                .configure(routes::config),
        )
}
