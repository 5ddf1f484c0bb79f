use serde::Serialize;
use ureq::{
    http::{request::Builder, Method, Request},
    Agent, SendBody,
};
use urlencoding::encode;

use crate::{APIResult, Environment};

mod context;
pub mod authorize;
mod refresh;
pub use context::QBContext;
pub use refresh::{RefreshableQBContext, TokenResponse};

/// Intuit OAuth2 endpoints are environment-independent.
pub(crate) const AUTH_ENDPOINT: &str = "https://appcenter.intuit.com/connect/oauth2";
pub(crate) const TOKEN_ENDPOINT: &str =
    "https://oauth.platform.intuit.com/oauth2/v1/tokens/bearer";
pub(crate) const ACCOUNTING_SCOPE: &str = "com.intuit.quickbooks.accounting";

const MINOR_VERSION: &str = "75";

/// One shared blocking agent per run. Status errors are disabled so the
/// error layer can classify non-2xx bodies itself.
#[must_use]
pub fn default_agent() -> Agent {
    Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(std::time::Duration::from_secs(60)))
        .build()
        .new_agent()
}

pub(crate) fn set_headers(content_type: &str, access_token: &str, request: Builder) -> Builder {
    let bt = format!("Bearer {access_token}");
    request
        .header("Authorization", bt)
        .header("Content-Type", content_type)
        .header("Accept", "application/json")
}

pub(crate) fn build_request<B>(
    method: Method,
    path: &str,
    body: Option<&B>,
    query: Option<&[(&str, &str)]>,
    environment: Environment,
    access_token: &str,
) -> APIResult<Request<SendBody<'static>>>
where
    B: Serialize,
{
    let url = build_url(environment, path, query);
    let mut request = Request::builder().method(method.clone()).uri(url.as_str());
    request = set_headers("application/json", access_token, request);

    let request = match (method == Method::GET, body) {
        (false, Some(body)) => {
            let json_bytes = serde_json::to_vec(body)?;
            let reader = std::io::Cursor::new(json_bytes);
            request.body(SendBody::from_owned_reader(reader))
        }
        _ => request.body(SendBody::none()),
    }?;

    log::debug!(
        "built request: {} {} ({})",
        method,
        path,
        if body.is_some() {
            "with JSON body"
        } else {
            "no body"
        },
    );

    Ok(request)
}

pub(crate) fn build_url(
    environment: Environment,
    path: &str,
    query: Option<&[(&str, &str)]>,
) -> String {
    let mut url = environment.endpoint_url().to_string();
    url.push_str(path);
    let query_string = query
        .into_iter()
        .flatten()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .chain(std::iter::once(format!("minorversion={MINOR_VERSION}")))
        .collect::<Vec<_>>()
        .join("&");
    url.push('?');
    url.push_str(&query_string);
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_always_carries_minor_version() {
        let url = build_url(Environment::Sandbox, "company/123/account", None);
        assert_eq!(
            url,
            "https://sandbox-quickbooks.api.intuit.com/v3/company/123/account?minorversion=75"
        );
    }

    #[test]
    fn query_parameters_are_encoded() {
        let url = build_url(
            Environment::Production,
            "company/123/query",
            Some(&[("query", "select * from Vendor WHERE DisplayName = 'Acme Corp'")]),
        );
        assert!(url.starts_with("https://quickbooks.api.intuit.com/v3/company/123/query?query="));
        assert!(url.contains("Acme%20Corp"));
        assert!(url.ends_with("&minorversion=75"));
    }
}
