use actix_web::{http::header::ContentType, web, HttpResponse};
use serde::Deserialize;
use tracing::{error, info};

use crate::app::{render_page, PageState};
use crate::db::Database;
use crate::error::ApiError;
use crate::models::prediction::Prediction;
use crate::models::review::Review;
use crate::oracle::{ModelVariant, PredictionOracle};

/// Raw form body. Fields are optional here so that a missing one becomes
/// our own bad-request response.
#[derive(Deserialize, Debug)]
pub struct ReviewSubmission {
    pub text: Option<String>,
    pub model: Option<String>,
}

/// Registers the form routes. `form_limit` caps the urlencoded body in bytes.
pub fn configure(form_limit: usize) -> impl Fn(&mut web::ServiceConfig) + Clone {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::FormConfig::default().limit(form_limit))
            .service(
                web::resource("/")
                    .route(web::get().to(index_page))
                    .route(web::post().to(submit_review)),
            );
    }
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(body)
}

pub async fn index_page() -> HttpResponse {
    html(render_page(PageState::empty()))
}

pub async fn submit_review(
    db: web::Data<Database>,
    oracle: web::Data<dyn PredictionOracle>,
    form: web::Form<ReviewSubmission>,
) -> Result<HttpResponse, ApiError> {
    let ReviewSubmission { text, model } = form.into_inner();
    let text = text.ok_or(ApiError::MissingField("text"))?;
    let model = model.ok_or(ApiError::MissingField("model"))?;

    let variant = ModelVariant::from_flag(&model);
    let output = oracle.predict(&text, variant).await.map_err(|e| {
        error!("[API] Oracle failed for {:?}: {}", variant, e);
        e
    })?;
    let prediction = Prediction::from_output(variant, output).map_err(|e| {
        error!("[API] Unusable oracle output for {:?}: {}", variant, e);
        e
    })?;

    let review = Review::new(text, prediction.sentiment, prediction.rating, model);
    let id = db.insert_review(&review).await.map_err(|e| {
        error!("[API] Database error: {:?}", e);
        e
    })?;
    info!(
        "[API] Review {} ({}) predicted {} / {} with model {}",
        id,
        review.preview(),
        prediction.sentiment,
        prediction.rating,
        review.model
    );

    let Review { text, model, .. } = review;
    Ok(html(render_page(PageState {
        text,
        selected_model: model,
        prediction: Some(prediction),
    })))
}
