use qb_types::{QBCreatable, QBItem};
use ureq::{http::Method, Agent};

use super::{qb_request, QBResponse};
use crate::{error::APIError, APIResult, QBContext};

/// Creates the given item in the context's company, after checking the
/// payload carries the fields `QuickBooks` requires.
pub fn qb_create<T: QBItem + QBCreatable>(
    item: &T,
    qb: &QBContext,
    client: &Agent,
) -> APIResult<T> {
    if !item.can_create() {
        return Err(APIError::CreateMissingItems(T::name()));
    }

    let response: QBResponse<T> = qb_request(
        qb,
        client,
        Method::POST,
        &format!("company/{}/{}", qb.company_id, T::qb_id()),
        Some(item),
        None,
    )?;

    match response.object.id() {
        Some(id) => log::info!("created {} with id {}", T::name(), id),
        None => log::warn!("created {} but no id came back", T::name()),
    }

    Ok(response.object)
}
