use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::participation::verify,
        handlers::participation::spin,
        handlers::participation::claim,
        handlers::participation::get_prizes,
        handlers::participation::get_records,
    ),
    components(
        schemas(
            VerifyRequest,
            VerifyResponse,
            SpinRequest,
            SpinResponse,
            ClaimRequest,
            ClaimResponse,
            PrizeResponse,
            RecordQuery,
            ParticipantRecordResponse,
            ApiError,
        )
    ),
    tags(
        (name = "participation", description = "Spin & Win participation API"),
    ),
    info(
        title = "Spin & Win Backend API",
        version = "1.0.0",
        description = "Expo booth spin-the-wheel REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
