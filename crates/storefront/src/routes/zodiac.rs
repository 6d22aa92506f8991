//! Zodiac crystal quiz.
//!
//! The quiz form submits with GET, so results are shareable links and work
//! without JavaScript. `/api/recommendations` serves the same data as JSON.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use tracing::instrument;

use moonstone_core::{Element, ZodiacSign};

use crate::error::{AppError, Result};
use crate::filters;
use crate::recommend::{self, Intention, Recommendation};
use crate::routes::api::catalog::RecommendationQuery;
use crate::state::AppState;

/// Quiz result for the template.
pub struct QuizResult {
    pub sign: ZodiacSign,
    pub element: Element,
    pub intention: Option<Intention>,
    pub recommendations: Vec<Recommendation>,
}

/// Zodiac quiz page template.
#[derive(Template, WebTemplate)]
#[template(path = "zodiac.html")]
pub struct ZodiacTemplate {
    pub signs: [ZodiacSign; 12],
    pub intentions: [Intention; 6],
    pub result: Option<QuizResult>,
    pub error: Option<String>,
}

impl ZodiacTemplate {
    fn is_selected_sign(&self, sign: &ZodiacSign) -> bool {
        self.result.as_ref().is_some_and(|r| r.sign == *sign)
    }

    fn is_selected_intention(&self, intention: &Intention) -> bool {
        self.result
            .as_ref()
            .is_some_and(|r| r.intention == Some(*intention))
    }
}

/// Display the quiz, with results when a sign or birth date was submitted.
#[instrument(skip(state))]
pub async fn quiz(
    State(state): State<AppState>,
    Query(query): Query<RecommendationQuery>,
) -> Result<impl IntoResponse> {
    let mut template = ZodiacTemplate {
        signs: ZodiacSign::ALL,
        intentions: Intention::ALL,
        result: None,
        error: None,
    };

    if query.is_empty() {
        return Ok(template);
    }

    match query.sign().and_then(|sign| Ok((sign, query.intention()?))) {
        Ok((sign, intention)) => {
            let crystals = state.catalog().snapshot().await?;
            template.result = Some(QuizResult {
                sign,
                element: sign.element(),
                intention,
                recommendations: recommend::recommend(&crystals, sign, intention, query.limit()),
            });
        }
        Err(AppError::BadRequest(message)) => template.error = Some(message),
        Err(e) => return Err(e),
    }

    Ok(template)
}
