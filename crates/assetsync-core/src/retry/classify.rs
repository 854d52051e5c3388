//! Map engine and channel failures onto retry kinds.

use crate::channel::ChannelError;
use crate::error::AssetError;
use crate::retry::policy::FailureKind;

pub fn classify_http_status(code: u32) -> FailureKind {
    match code {
        429 | 503 => FailureKind::Throttled,
        500..=599 => FailureKind::ServerError(code as u16),
        _ => FailureKind::Final,
    }
}

/// Timeouts and connection-level curl failures are retryable; the rest are final.
pub fn classify_curl_error(e: &curl::Error) -> FailureKind {
    if e.is_operation_timedout() {
        return FailureKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return FailureKind::Connection;
    }
    FailureKind::Final
}

pub fn classify_channel_error(e: &ChannelError) -> FailureKind {
    match e {
        ChannelError::Curl(ce) => classify_curl_error(ce),
        ChannelError::Http(code) => classify_http_status(*code),
        ChannelError::Truncated { .. } => FailureKind::Connection,
        ChannelError::Overrun { .. }
        | ChannelError::NotFound(_)
        | ChannelError::Rejected(_)
        | ChannelError::Protocol(_)
        | ChannelError::Io(_) => FailureKind::Final,
    }
}

/// Only `NetworkTransfer` can be retryable; every other engine error is final.
pub fn classify(e: &AssetError) -> FailureKind {
    match e {
        AssetError::NetworkTransfer(ce) => classify_channel_error(ce),
        _ => FailureKind::Final,
    }
}
