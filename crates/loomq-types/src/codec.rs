//! Frame-stack wire codec.
//!
//! The wire unit is a stack of byte frames:
//!
//! ```text
//! [route hop]* [empty delimiter] [tag] [json body]?
//! ```
//!
//! Route hops come first so intermediate hops can prepend their address
//! without touching the payload; the empty delimiter frame marks where the
//! route stack ends. A request freshly sent by a plugin has an empty route
//! stack -- just the delimiter -- which the broker core stamps as the
//! message travels.

use serde_json::Value;

use crate::envelope::Envelope;
use crate::error::CodecError;

/// Raw wire representation of one message.
pub type Frames = Vec<Vec<u8>>;

/// Encode an envelope into its frame stack.
pub fn encode(env: &Envelope) -> Frames {
    let mut frames: Frames = env
        .route
        .iter()
        .map(|hop| hop.clone().into_bytes())
        .collect();
    frames.push(Vec::new());
    frames.push(env.tag.clone().into_bytes());
    if let Some(body) = &env.body {
        // Serializing a serde_json::Value cannot fail.
        frames.push(serde_json::to_vec(body).unwrap_or_else(|_| b"null".to_vec()));
    }
    frames
}

/// Decode a frame stack back into an envelope.
///
/// Fails with a [`CodecError`] on malformed input; callers treat that as a
/// recoverable protocol error and drop the message.
pub fn decode(frames: &[Vec<u8>]) -> Result<Envelope, CodecError> {
    if frames.is_empty() {
        return Err(CodecError::Empty);
    }
    let delim = frames
        .iter()
        .position(|f| f.is_empty())
        .ok_or(CodecError::MissingDelimiter)?;

    let route = frames[..delim]
        .iter()
        .map(|f| String::from_utf8(f.clone()).map_err(|_| CodecError::BadRouteHop))
        .collect::<Result<Vec<_>, _>>()?;

    let mut rest = frames[delim + 1..].iter();
    let tag = rest.next().ok_or(CodecError::MissingTag)?;
    let tag = String::from_utf8(tag.clone()).map_err(|_| CodecError::BadTag)?;
    let body: Option<Value> = match rest.next() {
        Some(f) => Some(serde_json::from_slice(f).map_err(CodecError::BadBody)?),
        None => None,
    };

    Ok(Envelope { tag, body, route })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encode_then_decode_request() {
        let mut env = Envelope::new("kvs.put", Some(json!({"key": "a", "val": 1})));
        env.route = vec!["client-1".into()];

        let frames = encode(&env);
        // route hop, delimiter, tag, body
        assert_eq!(frames.len(), 4);
        assert!(frames[1].is_empty());

        let back = decode(&frames).expect("decode");
        assert_eq!(back, env);
    }

    #[test]
    fn bodyless_envelope_has_no_body_frame() {
        let env = Envelope::new("sync.pulse", None);
        let frames = encode(&env);
        assert_eq!(frames.len(), 2);

        let back = decode(&frames).expect("decode");
        assert!(back.body.is_none());
        assert!(back.route.is_empty());
    }

    #[test]
    fn empty_stack_is_rejected() {
        assert!(matches!(decode(&[]), Err(CodecError::Empty)));
    }

    #[test]
    fn missing_delimiter_is_rejected() {
        let frames = vec![b"kvs.get".to_vec(), b"{}".to_vec()];
        assert!(matches!(decode(&frames), Err(CodecError::MissingDelimiter)));
    }

    #[test]
    fn missing_tag_is_rejected() {
        let frames = vec![b"hop".to_vec(), Vec::new()];
        assert!(matches!(decode(&frames), Err(CodecError::MissingTag)));
    }

    #[test]
    fn non_utf8_tag_is_rejected() {
        let frames = vec![Vec::new(), vec![0xff, 0xfe]];
        assert!(matches!(decode(&frames), Err(CodecError::BadTag)));
    }

    #[test]
    fn non_utf8_route_hop_is_rejected() {
        let frames = vec![vec![0xff], Vec::new(), b"a.b".to_vec()];
        assert!(matches!(decode(&frames), Err(CodecError::BadRouteHop)));
    }

    #[test]
    fn malformed_body_is_rejected() {
        let frames = vec![Vec::new(), b"a.b".to_vec(), b"{not json".to_vec()];
        assert!(matches!(decode(&frames), Err(CodecError::BadBody(_))));
    }
}
