use eipkit_cip::status::{EMBEDDED_SERVICE_ERROR, SUCCESS};
use eipkit_cip::{aggregate, split_responses, MessageRouterRequest, MessageRouterResponse};
use tracing::debug;

use crate::error::Result;
use crate::session::Session;

/// Send `requests` as one exchange and return one reply per request, in
/// request order.
///
/// A single request goes out as-is and its reply is returned unchecked.
/// Several are aggregated into a Multiple Service Packet; the outer reply
/// may only fail with "embedded service error", in which case the
/// per-request statuses say which ones failed.
pub(crate) fn exchange_batch(
    session: &Session,
    requests: Vec<MessageRouterRequest>,
) -> Result<Vec<MessageRouterResponse>> {
    let count = requests.len();
    let request = aggregate(requests)?;
    let reply = session.send(&request)?;
    if count == 1 {
        return Ok(vec![reply]);
    }

    if reply.general_status != SUCCESS && reply.general_status != EMBEDDED_SERVICE_ERROR {
        return Err(reply.status_error().into());
    }
    let replies = split_responses(&reply.data, count)?;
    debug!(count, status = reply.general_status, "batch reply");
    Ok(replies)
}
