//! One-time authorization-code grant against Intuit's app center.
//!
//! The interactive part (opening the browser, collecting the pasted
//! redirect) lives in the binary; this module only builds the consent URL,
//! picks the grant out of the redirect and exchanges it for tokens.

use base64::Engine;
use ureq::{http::Request, Agent};

use super::{TokenResponse, ACCOUNTING_SCOPE, AUTH_ENDPOINT, TOKEN_ENDPOINT};
use crate::{error::APIError, APIResult};

/// Authorization code plus the realm (company) ID Intuit appends to the
/// redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCodeGrant {
    pub code: String,
    pub realm_id: Option<String>,
    pub state: Option<String>,
}

/// Opaque value tying the redirect back to this invocation.
#[must_use]
pub fn new_state() -> String {
    format!("{:016x}", rand::random::<u64>())
}

#[must_use]
pub fn consent_url(client_id: &str, redirect_uri: &str, state: &str) -> String {
    format!(
        "{AUTH_ENDPOINT}?client_id={}&response_type=code&scope={}&redirect_uri={}&state={}",
        urlencoding::encode(client_id),
        urlencoding::encode(ACCOUNTING_SCOPE),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(state),
    )
}

/// Parses the full redirect URL the operator pasted back.
pub fn parse_redirect(redirect: &str) -> APIResult<AuthCodeGrant> {
    let url = url::Url::parse(redirect.trim())?;
    let mut code = None;
    let mut realm_id = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "realmId" => realm_id = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            _ => {}
        }
    }
    let code = code.ok_or(APIError::NoAuthCode)?;
    Ok(AuthCodeGrant {
        code,
        realm_id,
        state,
    })
}

/// Exchanges an authorization code for an access/refresh token pair.
pub fn exchange_code(
    client_id: &str,
    client_secret: &str,
    redirect_uri: &str,
    code: &str,
    client: &Agent,
) -> APIResult<TokenResponse> {
    let auth_string = format!("{client_id}:{client_secret}");
    let auth_string = base64::engine::general_purpose::STANDARD.encode(auth_string);

    let request = Request::post(TOKEN_ENDPOINT)
        .header("Authorization", format!("Basic {auth_string}"))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .header("Accept", "application/json")
        .body(format!(
            "grant_type=authorization_code&code={}&redirect_uri={}",
            urlencoding::encode(code),
            urlencoding::encode(redirect_uri),
        ))?;

    let response = client.run(request)?;

    if !response.status().is_success() {
        return Err(APIError::InvalidClient);
    }

    Ok(response.into_body().read_json()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consent_url_is_escaped() {
        let url = consent_url("abc", "http://localhost:5000/callback", "f00d");
        assert!(url.starts_with(AUTH_ENDPOINT));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A5000%2Fcallback"));
        assert!(url.contains("scope=com.intuit.quickbooks.accounting"));
        assert!(url.contains("state=f00d"));
    }

    #[test]
    fn redirect_parsing_extracts_grant() {
        let grant = parse_redirect(
            "http://localhost:5000/callback?code=AB11570386259rgh&state=f00d&realmId=4620816365257778210",
        )
        .unwrap();
        assert_eq!(grant.code, "AB11570386259rgh");
        assert_eq!(grant.realm_id.as_deref(), Some("4620816365257778210"));
        assert_eq!(grant.state.as_deref(), Some("f00d"));
    }

    #[test]
    fn redirect_without_code_is_rejected() {
        let err = parse_redirect("http://localhost:5000/callback?error=access_denied").unwrap_err();
        assert!(matches!(err, APIError::NoAuthCode));
    }
}
