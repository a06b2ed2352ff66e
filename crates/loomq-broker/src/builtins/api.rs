//! External-API front-end plugin.
//!
//! The listener that bridges external clients into the broker lives
//! outside this crate; the registry entry exists so configurations naming
//! `api` resolve. Every request it receives falls back to the standard
//! "not implemented" reply.

use async_trait::async_trait;

use crate::plugin::Plugin;

struct ApiPlugin;

pub fn build() -> Box<dyn Plugin> {
    Box::new(ApiPlugin)
}

#[async_trait]
impl Plugin for ApiPlugin {
    fn name(&self) -> &'static str {
        "api"
    }
}
