//! Error types for the kiosk wire protocol.

use thiserror::Error;

/// Errors raised while decoding controller payloads.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The text was not valid JSON, or did not match the expected shape.
    #[error("malformed payload: {0}")]
    Malformed(#[source] serde_json::Error),

    /// A payload for a recognized push type had the wrong shape.
    #[error("invalid payload for `{kind}`: {source}")]
    InvalidPayload {
        /// The push type whose payload failed to decode.
        kind: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// A session state outside the controller's state set.
    #[error("unknown session state: {0}")]
    UnknownSessionState(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ProtocolError::UnknownSessionState("WASHING".into());
        assert_eq!(err.to_string(), "unknown session state: WASHING");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProtocolError>();
    }
}
