//! Session binding for remote calls.
//!
//! [`RemoteSession`] ties together the content client, the authenticated
//! session context, and the retry policy, so that every component reaches
//! the remote service through the same throttle-aware path:
//!
//! ```rust,ignore
//! let session = RemoteSession::new(client.as_ref(), &ctx, &retry);
//! let members = session
//!     .call("get_group_members", |c, ctx| c.get_group_members(ctx, group.id))
//!     .await?;
//! ```

use std::future::Future;

use permission_audit_sdk::{ContentClient, RemoteError, SessionContext};

use super::error::DomainError;
use super::retry::RetryPolicy;

/// Client, session context, and retry policy borrowed for one run.
#[derive(Clone, Copy)]
pub struct RemoteSession<'a> {
    client: &'a dyn ContentClient,
    ctx: &'a SessionContext,
    retry: &'a RetryPolicy,
}

impl<'a> RemoteSession<'a> {
    #[must_use]
    pub fn new(
        client: &'a dyn ContentClient,
        ctx: &'a SessionContext,
        retry: &'a RetryPolicy,
    ) -> Self {
        Self { client, ctx, retry }
    }

    #[must_use]
    pub fn ctx(&self) -> &'a SessionContext {
        self.ctx
    }

    /// Perform one remote round trip under the retry policy.
    ///
    /// # Errors
    ///
    /// See [`RetryPolicy::execute`].
    pub async fn call<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T, DomainError>
    where
        F: FnMut(&'a dyn ContentClient, &'a SessionContext) -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let (client, ctx) = (self.client, self.ctx);
        self.retry.execute(operation, || call(client, ctx)).await
    }
}
