//! Request-scoped values handed to every collaborator.

use uuid::Uuid;

/// Per-request context.
///
/// Cancellation is not carried here: dropping the operation's future
/// cancels every collaborator call it is awaiting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Correlation id for logs.
    pub request_id: Uuid,

    /// Raw bearer token, if the caller presented one.
    pub bearer_token: Option<String>,

    /// Authenticated caller, set by the service once auth succeeded.
    pub caller_id: Option<Uuid>,
}

impl RequestContext {
    pub fn new() -> Self {
        RequestContext {
            request_id: Uuid::new_v4(),
            ..RequestContext::default()
        }
    }

    /// Context carrying `token` as the bearer credential.
    pub fn with_token(token: impl Into<String>) -> Self {
        RequestContext {
            bearer_token: Some(token.into()),
            ..RequestContext::new()
        }
    }

    /// Copy of this context attributed to `caller`.
    pub fn with_caller(&self, caller: Uuid) -> Self {
        RequestContext {
            caller_id: Some(caller),
            ..self.clone()
        }
    }

    /// Acting user, nil when unattributed.
    pub fn caller_or_nil(&self) -> Uuid {
        self.caller_id.unwrap_or_else(Uuid::nil)
    }
}
