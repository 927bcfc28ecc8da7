use axum::{extract::Request, middleware::Next, response::Response};

use super::error::ApiError;
use crate::domain::Credential;

/// Header carrying the caller's platform token.
pub const API_KEY_HEADER: &str = "x-api-key";
/// Query parameter accepted when the header is absent.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Reject requests without a credential before any handler runs, and hand
/// the credential to handlers through request extensions.
pub async fn require_credential(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let credential = credential_from_request(&request).ok_or(ApiError::MissingCredential)?;
    request.extensions_mut().insert(credential);
    Ok(next.run(request).await)
}

/// The header wins over the query parameter. Blank values count as absent.
pub fn credential_from_request(request: &Request) -> Option<Credential> {
    let from_header = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(Credential::new);

    from_header.or_else(|| {
        let query = request.uri().query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == TOKEN_QUERY_PARAM)
            .and_then(|(_, value)| Credential::new(value.into_owned()))
    })
}
