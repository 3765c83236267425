//! Pending request slots.
//!
//! A request accepted by the station is answered later, once the link layer
//! reports completion. The caller holds the receiving half of a oneshot
//! channel; the station keeps the [`Requester`] until it can reply.

use log::debug;
use tokio::sync::oneshot;

use crate::api::models::Result;

/// Sending half of a pending request.
pub type Requester = oneshot::Sender<Result<()>>;

/// Receiving half of a pending request.
pub type Reply = oneshot::Receiver<Result<()>>;

/// Creates a requester and the reply it resolves.
pub fn requester() -> (Requester, Reply) {
    oneshot::channel()
}

/// Answers the request held in `slot`, if any, and empties the slot.
pub(crate) fn reply(slot: &mut Option<Requester>, result: Result<()>) {
    if let Some(tx) = slot.take() {
        send(tx, result);
    }
}

/// Answers a request directly.
pub(crate) fn send(tx: Requester, result: Result<()>) {
    if tx.send(result).is_err() {
        debug!("Requester went away before the reply");
    }
}
