use actix_files::Files;
use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use log::{error, info, warn};
use shared::{ErrorResponse, HealthResponse};
use std::path::PathBuf;
use uuid::Uuid;

use crate::analysis::verdict::prefix;
use crate::analysis::{AnalysisError, Analyzer, UploadedImage};

const FILE_FIELD: &str = "file";

/// Static facts reported by `/health`.
#[derive(Clone)]
pub struct ServiceInfo {
    pub system_name: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("No file uploaded")]
    NoFile,
    #[error("Upload could not be read: {0}")]
    Upload(String),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("Analysis failed: {0}")]
    Internal(String),
}

impl ResponseError for PredictError {
    fn status_code(&self) -> StatusCode {
        match self {
            PredictError::NoFile | PredictError::Upload(_) => StatusCode::BAD_REQUEST,
            PredictError::Analysis(AnalysisError::Decode(_))
            | PredictError::Analysis(AnalysisError::MissingInput(_)) => StatusCode::BAD_REQUEST,
            PredictError::Analysis(AnalysisError::PayloadTooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            PredictError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig, static_dir: PathBuf) {
    configure_api(cfg);
    cfg.service(Files::new("/", static_dir).index_file("index.html"));
}

pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/predict").route(web::post().to(predict)))
        .service(web::resource("/health").route(web::get().to(health)));
}

async fn predict(
    analyzer: web::Data<Analyzer>,
    payload: Multipart,
) -> Result<HttpResponse, PredictError> {
    let request_id = Uuid::new_v4();
    let upload = match read_upload(payload, analyzer.max_upload_bytes()).await {
        Ok(upload) => upload,
        Err(e) => {
            warn!("[{}] Rejected upload: {}", request_id, e);
            return Err(e);
        }
    };

    let filename = upload.filename.clone();
    info!("[{}] Analyzing: {:?} ({} bytes)", request_id, filename, upload.bytes.len());

    let analyzer = analyzer.into_inner();
    let outcome = web::block(move || analyzer.analyze(&upload)).await;

    let verdict = match outcome {
        Ok(Ok(verdict)) => verdict,
        Ok(Err(e)) => {
            let e = PredictError::from(e);
            warn!("[{}] {:?} rejected: {}", request_id, filename, e);
            return Err(e);
        }
        Err(e) => {
            error!("[{}] Analysis of {:?} failed: {:?}", request_id, filename, e);
            return Err(PredictError::Internal(e.to_string()));
        }
    };

    info!("[{}] Image hash: {}...", request_id, prefix(&verdict.fingerprint, 16));
    info!(
        "[{}] Prediction: {} (confidence {:.2}%, probability {:.4})",
        request_id, verdict.label, verdict.confidence_percent, verdict.probability
    );
    for indicator in &verdict.indicators {
        info!("[{}]   - {}", request_id, indicator);
    }

    Ok(HttpResponse::Ok().json(verdict.to_response()))
}

/// Pulls the `file` part out of the form, enforcing the size limit while
/// streaming. Other parts are drained and ignored.
async fn read_upload(mut payload: Multipart, limit: usize) -> Result<UploadedImage, PredictError> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| PredictError::Upload(e.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            while field
                .try_next()
                .await
                .map_err(|e| PredictError::Upload(e.to_string()))?
                .is_some()
            {}
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();
        if filename.is_empty() {
            return Err(AnalysisError::MissingInput("Empty filename").into());
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| PredictError::Upload(e.to_string()))?
        {
            if bytes.len() + chunk.len() > limit {
                return Err(AnalysisError::PayloadTooLarge {
                    size: bytes.len() + chunk.len(),
                    limit,
                }
                .into());
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok(UploadedImage { bytes, filename });
    }
    Err(PredictError::NoFile)
}

async fn health(analyzer: web::Data<Analyzer>, info: web::Data<ServiceInfo>) -> HttpResponse {
    let (cancer_samples, normal_samples) = analyzer.seen().counts();
    HttpResponse::Ok().json(HealthResponse {
        status: "running".to_string(),
        system: info.system_name.clone(),
        cancer_samples,
        normal_samples,
        started_at: info.started_at.to_rfc3339(),
    })
}
