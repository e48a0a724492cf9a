//! Request body extraction and validation.
//!
//! Bodies are deserialized, then checked with `validator`. Every rule runs and
//! all failures are reported together, so a client can fix a whole form in
//! one round trip.

use axum::extract::{FromRequest, Json, Request};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use validator::{Validate, ValidationError};

use super::error::ApiError;
use crate::password::MAX_PASSWORD_BYTES;

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub msg: String,
    /// Name of the offending body field, if the failure is tied to one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

/// Collected validation failures, serialized as `{"errors": [...]}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(msg: impl Into<String>) -> Self {
        Self {
            errors: vec![FieldError {
                msg: msg.into(),
                param: None,
            }],
        }
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Flatten a `validator` report, ordering fields as `T` declares them.
    pub fn from_report<T: FieldOrder>(report: &validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = report.field_errors().into_iter().collect();
        fields.sort_by(|(a, _), (b, _)| rank::<T>(a).cmp(&rank::<T>(b)).then_with(|| a.cmp(b)));

        let errors = fields
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    msg: error
                        .message
                        .as_deref()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("Invalid value for {}", field)),
                    param: Some(field.to_string()),
                })
            })
            .collect();

        Self { errors }
    }
}

/// Body fields in the order their failures are reported.
pub trait FieldOrder {
    const FIELDS: &'static [&'static str];
}

fn rank<T: FieldOrder>(field: &str) -> usize {
    T::FIELDS
        .iter()
        .position(|known| *known == field)
        .unwrap_or(T::FIELDS.len())
}

/// JSON body extractor that runs the body's `validator` rules.
///
/// Malformed bodies and failed rules are both answered with a 400
/// `{"errors": [...]}` response.
#[must_use]
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidateJson<T>
where
    T: DeserializeOwned + Validate + FieldOrder + 'static,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = <Json<T> as FromRequest<S>>::from_request(req, state).await?;

        if let Err(report) = data.validate() {
            debug!(errors = ?report.field_errors(), "Request validation failed");
            return Err(ValidationErrors::from_report::<T>(&report).into());
        }
        Ok(Self(data))
    }
}

/// Fails for values that are empty or only whitespace.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Fails for passwords longer than bcrypt can hash without truncation.
pub fn hashable_password(value: &str) -> Result<(), ValidationError> {
    if value.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::new("password_too_long"));
    }
    Ok(())
}

/// Split a comma separated list into trimmed, non-empty items.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
