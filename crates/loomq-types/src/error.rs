//! Error types for the loomq broker.
//!
//! Provides [`BrokerError`] as the top-level error type and [`CodecError`]
//! for wire-level decode failures. Decode failures are recoverable (the
//! offending message is logged and dropped); most `BrokerError` variants
//! are fatal to the operation that produced them.

use thiserror::Error;

/// Top-level error type for broker operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BrokerError {
    /// A configured plugin name did not resolve against the registry.
    #[error("unknown plugin '{name}'")]
    UnknownPlugin {
        /// The name that failed to resolve.
        name: String,
    },

    /// Configuration is malformed or semantically invalid.
    #[error("invalid config: {reason}")]
    ConfigInvalid {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// A channel endpoint's peer is gone. Only happens once the broker is
    /// tearing down, so a send on a closed endpoint ends the plugin's loop.
    #[error("channel closed: {endpoint} endpoint")]
    ChannelClosed {
        /// Which of the five endpoints failed.
        endpoint: &'static str,
    },

    /// An envelope failed to decode.
    #[error("protocol error: {0}")]
    Protocol(#[from] CodecError),

    /// Underlying I/O error (config file access and the like).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file failed to parse.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// JSON serialization / deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors produced when decoding a frame stack into an envelope.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The frame stack had no frames at all.
    #[error("empty message")]
    Empty,

    /// No empty delimiter frame separating the route stack from the payload.
    #[error("missing route delimiter frame")]
    MissingDelimiter,

    /// Nothing followed the delimiter frame.
    #[error("missing tag frame")]
    MissingTag,

    /// The tag frame was not valid UTF-8.
    #[error("tag frame is not valid UTF-8")]
    BadTag,

    /// A route hop frame was not valid UTF-8.
    #[error("route hop frame is not valid UTF-8")]
    BadRouteHop,

    /// The body frame was not valid JSON.
    #[error("malformed body frame: {0}")]
    BadBody(#[source] serde_json::Error),
}

/// Convenience alias used throughout the broker crates.
pub type Result<T> = std::result::Result<T, BrokerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_plugin_display() {
        let err = BrokerError::UnknownPlugin {
            name: "frobsrv".into(),
        };
        assert_eq!(err.to_string(), "unknown plugin 'frobsrv'");
    }

    #[test]
    fn channel_closed_display() {
        let err = BrokerError::ChannelClosed { endpoint: "upreq" };
        assert_eq!(err.to_string(), "channel closed: upreq endpoint");
    }

    #[test]
    fn codec_error_wraps_into_broker_error() {
        let err = BrokerError::from(CodecError::MissingDelimiter);
        assert!(matches!(err, BrokerError::Protocol(_)));
        assert!(err.to_string().contains("missing route delimiter"));
    }

    #[test]
    fn io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no config");
        let err = BrokerError::from(io);
        assert!(matches!(err, BrokerError::Io(_)));
    }
}
