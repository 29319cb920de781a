use crate::config::{ServerConfig, MAX_PAYLOAD_BYTES};
use crate::error::ApiError;
use crate::features::{validate_request, FEATURE_COUNT};
use crate::model::artifact::ModelArtifact;
use crate::model::inference::run_inference;
use crate::model::model_utils::Backend;
use actix_web::http::header::ContentType;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use log::{debug, error, info};
use serde::Serialize;

const INDEX_MESSAGE: &str = "GaussianNB Iris model server. Go to /form";
const FORM_HTML: &str = include_str!("assets/form.html");

#[derive(Serialize)]
struct HealthcheckResponse {
    version: String,
    status: String,
}

#[derive(Serialize)]
struct ModelInfoResponse {
    backend: Backend,
    n_features: usize,
    classes: Vec<String>,
}

async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(INDEX_MESSAGE)
}

async fn form() -> impl Responder {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(FORM_HTML)
}

async fn healthcheck() -> impl Responder {
    let response = HealthcheckResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "ok".to_string(),
    };
    HttpResponse::Ok().json(response)
}

async fn model_info(artifact: web::Data<ModelArtifact>) -> impl Responder {
    let model = artifact.model();
    let response = ModelInfoResponse {
        backend: model.backend(),
        n_features: model.n_features(),
        classes: artifact.target_names().to_vec(),
    };
    HttpResponse::Ok().json(response)
}

// The body is taken raw so that it is parsed as JSON whatever the Content-Type.
async fn read_body(payload: web::Payload) -> Result<web::Bytes, ApiError> {
    match payload.to_bytes_limited(MAX_PAYLOAD_BYTES).await {
        Ok(Ok(body)) => Ok(body),
        Ok(Err(e)) => {
            debug!("failed to read request body: {e}");
            Err(ApiError::InvalidJson)
        }
        Err(_) => Err(ApiError::PayloadTooLarge {
            limit: MAX_PAYLOAD_BYTES,
        }),
    }
}

async fn predict(
    artifact: web::Data<ModelArtifact>,
    payload: web::Payload,
) -> Result<HttpResponse, ApiError> {
    let body = read_body(payload).await?;
    let features = validate_request(&body, FEATURE_COUNT).map_err(|e| {
        debug!("rejected prediction request: {e}");
        e
    })?;

    let response = run_inference(&artifact, &features).await.map_err(|e| {
        error!("inference failed: {e:#}");
        ApiError::Internal(e)
    })?;

    Ok(HttpResponse::Ok().json(response))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/form", web::get().to(form))
        .route("/health", web::get().to(healthcheck))
        .route("/model", web::get().to(model_info))
        .route("/predict", web::post().to(predict));
}

pub async fn run_server(config: ServerConfig, artifact: ModelArtifact) -> std::io::Result<()> {
    let shared_artifact = web::Data::new(artifact);
    let address = config.bind_address();

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(shared_artifact.clone())
            .configure(routes)
    });
    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    info!("Serving predictions on http://{address}");
    server.bind(address)?.run().await
}
