use thiserror::Error;

/// Chat client error taxonomy. None of these are fatal: a fetch failure is
/// retryable, a handshake failure leaves the session disconnected until the
/// next explicit connect, and a rejected send is dropped rather than queued.
///
/// Stale results (a response for a group that is no longer active) are not
/// errors at all; they are discarded where they complete.
#[derive(Debug, Error)]
pub enum ChatError {
    /// History or group listing fetch failed: network error or non-2xx.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// The websocket/subscription handshake failed or timed out.
    #[error("websocket handshake failed: {0}")]
    Handshake(String),

    /// A send was attempted while not connected. No retry, no queueing.
    #[error("message rejected: websocket not connected")]
    SendRejected,
}
