//! JSON body extractor with `validator` checks.
//!
//! Unparsable bodies and failed validations are both answered as Malformed
//! Data (HTTP 400, code 2) in the usual envelope, with every offending field
//! named by its path (`preferences[1].duration_sec`).

use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use super::ApiError;
use crate::domain::DomainError;

/// Like `axum::Json<T>`, then runs `Validate::validate()` on the value.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            ApiError(DomainError::MalformedData(format!(
                "json parse failed: {}",
                rejection.body_text()
            )))
        })?;

        value
            .validate()
            .map_err(|errors| ApiError(DomainError::MalformedData(describe(&errors))))?;
        Ok(ValidatedJson(value))
    }
}

/// `path: message` for every failed check, sorted, joined with `; `.
fn describe(errors: &ValidationErrors) -> String {
    let mut lines = Vec::new();
    collect(errors, "", &mut lines);
    if lines.is_empty() {
        return "Invalid / missing parameters".to_string();
    }
    lines.sort();
    lines.join("; ")
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(failures) => {
                for failure in failures {
                    let msg = failure
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| failure.code.to_string());
                    out.push(format!("{path}: {msg}"));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}
