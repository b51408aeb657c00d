use actix_multipart::Multipart;
use actix_web::{web, Error, HttpResponse, Result};
use futures_util::StreamExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::classifier::{decode_image, Classify};
use crate::models::{DiagnosisResponse, ErrorBody, HealthResponse};
use crate::pipeline::{format_confidence, DiagnosisPipeline};

/// `POST /diagnose`: multipart image upload in, diagnosis out.
///
/// Generic over the classifier so tests can drive it with a stub model.
pub async fn diagnose<C: Classify + 'static>(
    pipeline: web::Data<DiagnosisPipeline<C>>,
    mut payload: Multipart,
) -> Result<HttpResponse, Error> {
    let request_id = Uuid::new_v4();

    // Collect the upload in memory; there is exactly one file field and
    // images are small.
    let mut image_bytes: Vec<u8> = Vec::new();
    while let Some(item) = payload.next().await {
        let mut field = item?;
        while let Some(chunk) = field.next().await {
            let data = chunk?;
            image_bytes.extend_from_slice(&data);
        }
    }

    // No file is a prompt, not an error.
    if image_bytes.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ErrorBody {
            error: "Please upload a leaf image".to_string(),
        }));
    }

    let image = match decode_image(&image_bytes) {
        Ok(image) => image,
        Err(err) => {
            warn!(%request_id, "rejected upload: {err}");
            return Err(err.into());
        }
    };

    let result = pipeline.diagnose(&image)?;
    let confidence_display = format_confidence(result.confidence);
    info!(
        %request_id,
        label = %result.label,
        confidence = %confidence_display,
        "diagnosis served"
    );

    Ok(HttpResponse::Ok().json(DiagnosisResponse {
        label: result.label,
        confidence: result.confidence,
        confidence_display,
        remedy: result.remedy,
    }))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Prediction;
    use crate::error::ClassifierError;
    use crate::remedies::{RemedyTable, FALLBACK_REMEDY};
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use image::DynamicImage;

    struct FixedClassifier {
        label: &'static str,
        confidence: f32,
    }

    impl Classify for FixedClassifier {
        fn classify(&self, _image: &DynamicImage) -> Result<Prediction, ClassifierError> {
            Ok(Prediction {
                label: self.label.to_string(),
                confidence: self.confidence,
            })
        }
    }

    fn pipeline_data(
        label: &'static str,
        confidence: f32,
    ) -> web::Data<DiagnosisPipeline<FixedClassifier>> {
        web::Data::new(DiagnosisPipeline::new(
            FixedClassifier { label, confidence },
            RemedyTable::builtin(),
        ))
    }

    fn png_bytes() -> Vec<u8> {
        let mut out = std::io::Cursor::new(Vec::new());
        DynamicImage::new_rgb8(8, 8)
            .write_to(&mut out, image::ImageOutputFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn multipart_request(file_bytes: &[u8]) -> test::TestRequest {
        let boundary = "leafdoc-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"file\"; filename=\"leaf.png\"\r\n\
              Content-Type: image/png\r\n\r\n",
        );
        body.extend_from_slice(file_bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        test::TestRequest::post()
            .uri("/diagnose")
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            ))
            .set_payload(body)
    }

    #[actix_web::test]
    async fn diagnose_returns_label_confidence_and_remedy() {
        let app = test::init_service(
            App::new().app_data(pipeline_data("Healthy", 0.9321)).service(
                web::resource("/diagnose")
                    .route(web::post().to(diagnose::<FixedClassifier>)),
            ),
        )
        .await;

        let req = multipart_request(&png_bytes()).to_request();
        let resp: DiagnosisResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.label, "Healthy");
        assert_eq!(resp.confidence_display, "0.93");
        assert_eq!(resp.remedy, RemedyTable::builtin().lookup("Healthy"));
    }

    #[actix_web::test]
    async fn unknown_class_gets_the_fallback_remedy() {
        let app = test::init_service(
            App::new()
                .app_data(pipeline_data("Martian Blight", 0.5))
                .service(
                    web::resource("/diagnose")
                        .route(web::post().to(diagnose::<FixedClassifier>)),
                ),
        )
        .await;

        let req = multipart_request(&png_bytes()).to_request();
        let resp: DiagnosisResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(resp.remedy, FALLBACK_REMEDY);
    }

    #[actix_web::test]
    async fn empty_upload_prompts_for_an_image() {
        let app = test::init_service(
            App::new().app_data(pipeline_data("Healthy", 0.9)).service(
                web::resource("/diagnose")
                    .route(web::post().to(diagnose::<FixedClassifier>)),
            ),
        )
        .await;

        let req = multipart_request(b"").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = test::read_body_json(resp).await;
        assert!(body.error.contains("upload"));
    }

    #[actix_web::test]
    async fn garbage_bytes_are_rejected_as_bad_request() {
        let app = test::init_service(
            App::new().app_data(pipeline_data("Healthy", 0.9)).service(
                web::resource("/diagnose")
                    .route(web::post().to(diagnose::<FixedClassifier>)),
            ),
        )
        .await;

        let req = multipart_request(b"definitely not an image").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn health_reports_ok() {
        let app = test::init_service(
            App::new().service(web::resource("/health").route(web::get().to(health))),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp: HealthResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.status, "ok");
    }
}
