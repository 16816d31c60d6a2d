/// Request extractors that reject with [`ApiError`]
///
/// `ValidatedJson<T>` deserializes the body and runs `validator` rules;
/// `ApiQuery<T>` and `ApiPath<T>` deserialize the query string and path
/// parameters. All of them fail with 400 and the standard error body before
/// the handler runs.
///
/// [`trimmed`] and [`trimmed_opt`] strip surrounding whitespace while a body
/// is deserialized, so length rules see the value that will be stored.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use validator::Validate;

use crate::error::ApiError;

/// JSON body that passed its validation rules
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Query string parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(ApiQuery(value))
    }
}

/// Path parameters
#[derive(Debug, Clone, Copy)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(ApiPath(value))
    }
}

/// `deserialize_with` helper for text fields stored trimmed
pub fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|value| value.trim().to_string())
}

/// [`trimmed`] for optional fields; pair with `#[serde(default)]`
pub fn trimmed_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|value| value.map(|v| v.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Named {
        #[serde(deserialize_with = "trimmed")]
        name: String,

        #[serde(default, deserialize_with = "trimmed_opt")]
        nickname: Option<String>,
    }

    #[test]
    fn test_trimmed_fields() {
        let named: Named = serde_json::from_str(r#"{ "name": "  Ada  ", "nickname": "\tAL " }"#).unwrap();
        assert_eq!(named.name, "Ada");
        assert_eq!(named.nickname.as_deref(), Some("AL"));

        let named: Named = serde_json::from_str(r#"{ "name": "   " }"#).unwrap();
        assert_eq!(named.name, "");
        assert_eq!(named.nickname, None);

        let named: Named = serde_json::from_str(r#"{ "name": "x", "nickname": null }"#).unwrap();
        assert_eq!(named.nickname, None);
    }
}
