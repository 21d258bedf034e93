/// Request validation
///
/// Request bodies are extracted with [`ValidatedJson`], which deserializes
/// the JSON and then runs the type's derived [`Validate`] impl before the
/// handler sees it. Validation collects every violated rule, not just the
/// first; the handler only runs when the list is empty.
///
/// Schemas are declared on the request types with `#[validate(...)]`. This
/// module holds the `custom` and `schema` functions they share.
///
/// Unknown fields are ignored.
///
/// # Example
///
/// ```
/// use serde::Deserialize;
/// use validator::Validate;
///
/// #[derive(Deserialize, Validate)]
/// struct Signup {
///     #[validate(email(message = "Email must be a valid email address"))]
///     email: String,
/// }
///
/// assert!(Signup { email: "a@x.com".into() }.validate().is_ok());
/// assert!(Signup { email: "nope".into() }.validate().is_err());
/// ```

use std::borrow::Cow;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use chrono::{DateTime, NaiveDate};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use validator::{Validate, ValidationError};

use crate::error::ApiError;

/// Message for an update body with no updatable field
pub const NOTHING_TO_UPDATE: &str = "At least one field must be provided for update";

/// Update field that keeps absent (`None`), `null` (`Some(None)`) and a
/// value apart
///
/// `#[validate]` unwraps a literal `Option<Option<T>>` before running field
/// rules; behind this alias the rules receive the whole value, `null` included.
pub type Patch<T> = Option<Option<T>>;

/// JSON body that has passed validation
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(body_rejection)?;

        value.validate()?;
        Ok(Self(value))
    }
}

fn body_rejection(rejection: JsonRejection) -> ApiError {
    tracing::debug!(error = %rejection.body_text(), "Rejected request body");
    ApiError::field("body", &rejection.body_text())
}

/// Rejects an empty string
pub fn not_empty(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// Rejects an explicit `null` or an empty string; absence passes
pub fn filled(value: &Patch<String>) -> Result<(), ValidationError> {
    match value {
        Some(None) => Err(ValidationError::new("required")),
        Some(Some(v)) => not_empty(v),
        None => Ok(()),
    }
}

/// Membership in a fixed set of names
pub fn one_of(value: &str, allowed: &[&str], message: &'static str) -> Result<(), ValidationError> {
    if !allowed.contains(&value) {
        return Err(ValidationError::new("enum").with_message(Cow::Borrowed(message)));
    }
    Ok(())
}

/// ISO-8601 date or timestamp
pub fn iso_date(value: &str) -> Result<(), ValidationError> {
    match parse_iso_date(value) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("date")
            .with_message(Cow::Borrowed("Due date must be a valid ISO date"))),
    }
}

/// Schema rule for update bodies
pub fn at_least_one(present: bool) -> Result<(), ValidationError> {
    if !present {
        return Err(ValidationError::new("min").with_message(Cow::Borrowed(NOTHING_TO_UPDATE)));
    }
    Ok(())
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (date part kept)
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
///
/// Use with `#[serde(default, deserialize_with = "nullable")]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
