//! Request-scoped caller identity.
//!
//! Resolved by the HTTP layer from the session token; the composition core
//! only ever sees this struct, never the token itself.

#[derive(Debug, Clone, PartialEq)]
pub struct Caller {
    pub user_id: i32,
    pub session_id: String,
}

impl Caller {
    pub fn new(user_id: i32, session_id: impl Into<String>) -> Self {
        Self {
            user_id,
            session_id: session_id.into(),
        }
    }
}
