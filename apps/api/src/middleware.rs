use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, Method, header};
use axum::middleware::Next;
use axum::response::Response;
use envkeep_core::{AppError, UserIdentity};
use tracing::warn;

use crate::error::ApiResult;
use crate::state::AppState;

pub const AUTH_PROXY_SECRET_HEADER: &str = "x-auth-proxy-secret";
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_ADMIN_HEADER: &str = "x-user-admin";


pub async fn require_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = identity_from_headers(request.headers(), state.auth_proxy_secret.as_str())?;

    if let Err(error) = state.member_service.activate_invites(&identity).await {
        warn!(subject = identity.subject(), %error, "failed to activate pending invitations");
    }

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Resolves the caller from headers set by the authenticating proxy.
pub fn identity_from_headers(
    headers: &HeaderMap,
    auth_proxy_secret: &str,
) -> Result<UserIdentity, AppError> {
    let presented = header_text(headers, AUTH_PROXY_SECRET_HEADER)?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;
    if presented != auth_proxy_secret {
        return Err(AppError::Unauthorized(
            "request did not come through the auth proxy".to_owned(),
        ));
    }

    let subject = header_text(headers, USER_ID_HEADER)?
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Unauthorized(format!("{USER_ID_HEADER} header is required")))?;

    let email = header_text(headers, USER_EMAIL_HEADER)?
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned);

    let is_admin = match header_text(headers, USER_ADMIN_HEADER)? {
        None => false,
        Some(value) if value.eq_ignore_ascii_case("true") => true,
        Some(value) if value.eq_ignore_ascii_case("false") => false,
        Some(value) => {
            return Err(AppError::Unauthorized(format!(
                "{USER_ADMIN_HEADER} must be 'true' or 'false', got '{value}'"
            )));
        }
    };

    Ok(UserIdentity::new(subject, email, is_admin))
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, AppError> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map_err(|_| AppError::Unauthorized(format!("{name} header is not valid text")))
        })
        .transpose()
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) {
        let headers = request.headers();

        if let Some(fetch_site) = headers.get("sec-fetch-site")
            && fetch_site == HeaderValue::from_static("cross-site")
        {
            return Err(AppError::Unauthorized("cross-site request blocked".to_owned()).into());
        }

        // Non-browser clients send neither header.
        let origin = headers
            .get(header::ORIGIN)
            .and_then(|value| value.to_str().ok());
        if let Some(origin) = origin
            && origin != state.frontend_url
        {
            return Err(AppError::Unauthorized("origin validation failed".to_owned()).into());
        }
    }

    Ok(next.run(request).await)
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
