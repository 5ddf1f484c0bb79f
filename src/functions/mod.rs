use serde::{de::DeserializeOwned, Deserialize, Serialize};
use ureq::{http::Method, Agent};

use crate::{client, error::APIError, APIResult, QBContext};

pub mod create;
pub mod query;

pub use create::qb_create;
pub use query::{qb_query, qb_query_all, qb_query_single, QueryPager};

/// Sends one request under a rate-limiter permit and deserializes the
/// response, classifying non-2xx statuses through the error taxonomy.
pub(crate) fn qb_request<B, U>(
    qb: &QBContext,
    client: &Agent,
    method: Method,
    path: &str,
    body: Option<&B>,
    query: Option<&[(&str, &str)]>,
) -> APIResult<U>
where
    B: Serialize,
    U: DeserializeOwned,
{
    qb.with_permission(|qb| {
        let request = client::build_request(
            method,
            path,
            body,
            query,
            qb.environment,
            &qb.access_token,
        )?;
        let response = client.run(request)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.into_body().read_to_string().unwrap_or_default();
            return Err(APIError::from_response(status.as_u16(), body));
        }
        Ok(response.into_body().read_json::<U>()?)
    })
}

/// Envelope `QuickBooks` wraps single objects in, keyed by resource name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct QBResponse<T> {
    #[serde(
        alias = "Account",
        alias = "Employee",
        alias = "Customer",
        alias = "Class",
        alias = "Vendor",
        alias = "JournalEntry"
    )]
    pub object: T,
    #[allow(dead_code)]
    pub time: Option<String>,
}
