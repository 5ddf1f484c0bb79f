use std::fmt::Write as _;
use std::marker::PhantomData;

use qb_types::QBItem;
use serde::Deserialize;
use ureq::{http::Method, Agent};

use crate::{functions::qb_request, APIResult, QBContext};

/// Page size for full-table reads; the largest `QuickBooks` allows.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Queries for objects of type `T`. The `clause` is spliced into
/// `select * from {T} {clause}`, so it is either empty or starts with
/// `WHERE`. Returns at most `max_results` items; an empty result is not
/// an error.
pub fn qb_query<T: QBItem>(
    clause: &str,
    max_results: usize,
    qb: &QBContext,
    client: &Agent,
) -> APIResult<Vec<T>> {
    let query = build_query::<T>(clause, 1, max_results);
    let items = run_query(&query, qb, client)?;
    log::debug!("queried {} {}(s) for: {query}", items.len(), T::name());
    Ok(items)
}

/// Exact-match single lookup; `None` when nothing matched.
pub fn qb_query_single<T: QBItem>(
    clause: &str,
    qb: &QBContext,
    client: &Agent,
) -> APIResult<Option<T>> {
    Ok(qb_query(clause, 1, qb, client)?.into_iter().next())
}

/// Fetches every object matching `clause`, paging transparently.
pub fn qb_query_all<T: QBItem>(
    clause: &str,
    qb: &QBContext,
    client: &Agent,
) -> APIResult<Vec<T>> {
    let mut pager = QueryPager::new(clause, DEFAULT_PAGE_SIZE, qb, client);
    let mut items = Vec::new();
    while let Some(page) = pager.next_page()? {
        items.extend(page);
    }
    Ok(items)
}

/// Lazy paginated read using `STARTPOSITION`/`MAXRESULTS`. Each
/// `next_page` call performs one API request; dropping the pager abandons
/// the remainder of the result set.
pub struct QueryPager<'a, T: QBItem> {
    clause: String,
    page_size: usize,
    start_position: usize,
    done: bool,
    qb: &'a QBContext,
    client: &'a Agent,
    _marker: PhantomData<T>,
}

impl<'a, T: QBItem> QueryPager<'a, T> {
    #[must_use]
    pub fn new(clause: &str, page_size: usize, qb: &'a QBContext, client: &'a Agent) -> Self {
        QueryPager {
            clause: clause.to_string(),
            page_size,
            start_position: 1,
            done: false,
            qb,
            client,
            _marker: PhantomData,
        }
    }

    pub fn next_page(&mut self) -> APIResult<Option<Vec<T>>> {
        if self.done {
            return Ok(None);
        }
        let query = build_query::<T>(&self.clause, self.start_position, self.page_size);
        let items: Vec<T> = run_query(&query, self.qb, self.client)?;
        if items.len() < self.page_size {
            self.done = true;
        }
        self.start_position += items.len();
        if items.is_empty() {
            return Ok(None);
        }
        log::debug!(
            "fetched page of {} {}(s) (next position {})",
            items.len(),
            T::name(),
            self.start_position
        );
        Ok(Some(items))
    }
}

/// Escapes a value for use inside single quotes in a `QuickBooks` query.
#[must_use]
pub fn escape_query_value(value: &str) -> String {
    value.replace('\'', "\\'")
}

fn run_query<T: QBItem>(query: &str, qb: &QBContext, client: &Agent) -> APIResult<Vec<T>> {
    let response: QueryResponseExt<T> = qb_request(
        qb,
        client,
        Method::GET,
        &format!("company/{}/query", qb.company_id),
        None::<&()>,
        Some(&[("query", query)]),
    )?;
    Ok(response.query_response.items)
}

fn build_query<T: QBItem>(clause: &str, start_position: usize, max_results: usize) -> String {
    let mut query = format!("select * from {}", T::name());
    if !clause.is_empty() {
        query.push(' ');
        query.push_str(clause);
    }
    let _ = write!(query, " STARTPOSITION {start_position} MAXRESULTS {max_results}");
    query
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct QueryResponse<T> {
    #[allow(dead_code)]
    total_count: i64,
    #[serde(
        alias = "Account",
        alias = "Employee",
        alias = "Customer",
        alias = "Class",
        alias = "Vendor",
        alias = "JournalEntry"
    )]
    items: Vec<T>,
    #[allow(dead_code)]
    start_position: i64,
    #[allow(dead_code)]
    max_results: i64,
}

impl<T> Default for QueryResponse<T> {
    fn default() -> Self {
        Self {
            total_count: 0,
            items: Vec::new(),
            start_position: 0,
            max_results: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct QueryResponseExt<T> {
    #[serde(rename = "QueryResponse")]
    query_response: QueryResponse<T>,
    #[allow(dead_code)]
    time: Option<String>,
}

impl<T> Default for QueryResponseExt<T> {
    fn default() -> Self {
        Self {
            query_response: QueryResponse::default(),
            time: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use qb_types::{Account, Vendor};

    use super::*;

    #[test]
    fn query_string_carries_paging_markers() {
        let query = build_query::<Account>("", 1, 1000);
        assert_eq!(query, "select * from Account STARTPOSITION 1 MAXRESULTS 1000");

        let query = build_query::<Vendor>("WHERE DisplayName = 'Acme Corp'", 1001, 1000);
        assert_eq!(
            query,
            "select * from Vendor WHERE DisplayName = 'Acme Corp' STARTPOSITION 1001 MAXRESULTS 1000"
        );
    }

    #[test]
    fn quotes_are_escaped() {
        assert_eq!(escape_query_value("O'Brien & Co"), "O\\'Brien & Co");
    }

    #[test]
    fn parses_query_envelope() {
        let body = r#"{
            "QueryResponse": {
                "Vendor": [
                    {"Id": "7", "DisplayName": "Acme Corp", "SyncToken": "0"}
                ],
                "startPosition": 1,
                "maxResults": 1,
                "totalCount": 1
            },
            "time": "2024-12-03T10:15:30.000-07:00"
        }"#;
        let parsed: QueryResponseExt<Vendor> = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.query_response.items.len(), 1);
        assert_eq!(
            parsed.query_response.items[0].display_name.as_deref(),
            Some("Acme Corp")
        );
    }

    #[test]
    fn empty_envelope_parses_to_no_items() {
        let parsed: QueryResponseExt<Vendor> =
            serde_json::from_str(r#"{"QueryResponse": {}, "time": "t"}"#).unwrap();
        assert!(parsed.query_response.items.is_empty());
    }
}
