use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::password::{
    BreachCheckRequest, BreachCheckResponse, GeneratePasswordRequest, GeneratePasswordResponse,
    ValidatePasswordRequest, ValidatePasswordResponse,
};
use crate::password::{
    generate_strong_password, password_feedback, validate_password, DEFAULT_GENERATED_LENGTH,
};

const MAX_GENERATED_LENGTH: usize = 128;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/validate", post(validate))
        .route("/generate", post(generate))
        .route("/breached", post(breached))
}

#[utoipa::path(
    post,
    path = "/password/validate",
    tag = "Password",
    request_body = ValidatePasswordRequest,
    responses(
        (status = 200, description = "Validation result with feedback", body = ValidatePasswordResponse),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn validate(
    State(state): State<AppState>,
    Json(payload): Json<ValidatePasswordRequest>,
) -> Json<ValidatePasswordResponse> {
    let policy = payload.policy.unwrap_or(state.password_policy);
    let result = validate_password(&payload.password, &policy);
    let feedback = password_feedback(&result);

    Json(ValidatePasswordResponse::new(result, feedback))
}

#[utoipa::path(
    post,
    path = "/password/generate",
    tag = "Password",
    request_body = GeneratePasswordRequest,
    responses(
        (status = 200, description = "Generated password", body = GeneratePasswordResponse),
        (status = 400, description = "Requested length too large")
    )
)]
pub async fn generate(
    State(state): State<AppState>,
    Json(payload): Json<GeneratePasswordRequest>,
) -> AppResult<Json<GeneratePasswordResponse>> {
    let length = payload.length.unwrap_or(DEFAULT_GENERATED_LENGTH);
    if length > MAX_GENERATED_LENGTH {
        return Err(AppError::bad_request(format!(
            "length must be at most {MAX_GENERATED_LENGTH}"
        )));
    }

    let password = generate_strong_password(length);
    let result = validate_password(&password, &state.password_policy);

    Ok(Json(GeneratePasswordResponse {
        password,
        strength: result.strength,
        score: result.score,
    }))
}

#[utoipa::path(
    post,
    path = "/password/breached",
    tag = "Password",
    request_body = BreachCheckRequest,
    responses((status = 200, description = "Whether the password is known to be compromised", body = BreachCheckResponse))
)]
pub async fn breached(
    State(state): State<AppState>,
    Json(payload): Json<BreachCheckRequest>,
) -> AppResult<Json<BreachCheckResponse>> {
    let breached = state.breach.is_breached(&payload.password).await?;
    Ok(Json(BreachCheckResponse { breached }))
}
