//! Message envelope and kind classification.
//!
//! An [`Envelope`] is one message unit: a dot-namespaced tag
//! (conventionally `<plugin>.<verb>`), an optional JSON body, and the
//! route stack accumulated as the message traverses hops. The
//! [`MessageKind`] is deliberately not part of the envelope or the wire
//! format -- it is assigned by the receiving loop from the endpoint the
//! message arrived on, never by the sender.

use serde_json::{json, Value};

/// Error code carried by the fallback reply for an unrecognized request
/// tag ("function not implemented").
pub const ENOSYS: i32 = 38;

/// Error code for a request whose body does not match the expected shape.
pub const EPROTO: i32 = 71;

/// Classification of a received envelope, derived from the delivering
/// endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Arrived on the downstream-request endpoint.
    Request,
    /// Arrived on the upstream-request endpoint (a response to us).
    Response,
    /// Arrived on the event fan-out.
    Event,
    /// Arrived on the passive debug tap. Not counted in statistics.
    Snoop,
}

impl MessageKind {
    /// Lowercase name for logging.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Request => "request",
            MessageKind::Response => "response",
            MessageKind::Event => "event",
            MessageKind::Snoop => "snoop",
        }
    }
}

/// One message unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Dot-namespaced tag, e.g. `"kvs.get"`.
    pub tag: String,
    /// Optional structured body.
    pub body: Option<Value>,
    /// Address hops accumulated on the way here, outermost first. A reply
    /// retraces this stack back to the original sender.
    pub route: Vec<String>,
}

impl Envelope {
    /// Create an envelope with an empty route stack.
    pub fn new(tag: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            tag: tag.into(),
            body,
            route: Vec::new(),
        }
    }

    /// Exact tag equality.
    pub fn matches(&self, tag: &str) -> bool {
        self.tag == tag
    }

    /// Mutate this request in place into a success reply carrying `body`.
    /// The route stack is preserved so the reply retraces to the sender.
    pub fn reply_with(&mut self, body: Value) {
        self.body = Some(body);
    }

    /// Mutate this request in place into an error reply carrying `errnum`.
    pub fn reply_errnum(&mut self, errnum: i32) {
        self.body = Some(json!({ "errnum": errnum }));
    }

    /// The numeric error code of an error reply, if this is one.
    pub fn errnum(&self) -> Option<i64> {
        self.body.as_ref()?.get("errnum")?.as_i64()
    }

    /// Render the route stack as text, hops joined with `!`.
    pub fn route_str(&self) -> String {
        self.route.join("!")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_is_exact() {
        let env = Envelope::new("kvs.get", None);
        assert!(env.matches("kvs.get"));
        assert!(!env.matches("kvs.get2"));
        assert!(!env.matches("kvs"));
    }

    #[test]
    fn reply_preserves_route() {
        let mut env = Envelope::new("kvs.get", Some(json!({"key": "a"})));
        env.route = vec!["client-7".into(), "broker".into()];

        env.reply_with(json!({"val": 42}));
        assert_eq!(env.route, vec!["client-7".to_string(), "broker".to_string()]);
        assert_eq!(env.body, Some(json!({"val": 42})));
        assert!(env.errnum().is_none());
    }

    #[test]
    fn error_reply_carries_errnum() {
        let mut env = Envelope::new("kvs.nope", Some(json!({})));
        env.reply_errnum(ENOSYS);
        assert_eq!(env.errnum(), Some(ENOSYS as i64));
    }

    #[test]
    fn route_str_joins_hops() {
        let mut env = Envelope::new("a.b", None);
        assert_eq!(env.route_str(), "");
        env.route = vec!["one".into(), "two".into()];
        assert_eq!(env.route_str(), "one!two");
    }

    #[test]
    fn kind_names() {
        assert_eq!(MessageKind::Request.as_str(), "request");
        assert_eq!(MessageKind::Snoop.as_str(), "snoop");
    }
}
