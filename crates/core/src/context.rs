//! Caller context threaded through every resource operation.

use serde::{Deserialize, Serialize};

/// Identifies who is making a request.
///
/// Resolution of this identity (tokens, sessions) happens outside this
/// workspace; operations only ever receive the resolved value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestContext {
    pub user_id: String,
}

impl RequestContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}
