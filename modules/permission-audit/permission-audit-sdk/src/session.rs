use secrecy::SecretString;

/// `SessionContext` carries the authenticated session for one audit run.
///
/// Established once by the caller before the walk starts and passed
/// explicitly to every [`ContentClient`](crate::ContentClient) call.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    /// Root site the session was established against.
    site_url: String,
    /// Access token for the remote service. Wrapped in `SecretString` so
    /// `Debug` redacts it.
    bearer_token: Option<SecretString>,
}

impl SessionContext {
    #[must_use]
    pub fn builder() -> SessionContextBuilder {
        SessionContextBuilder::default()
    }

    #[must_use]
    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    #[must_use]
    pub fn bearer_token(&self) -> Option<&SecretString> {
        self.bearer_token.as_ref()
    }
}

#[derive(Default)]
pub struct SessionContextBuilder {
    site_url: String,
    bearer_token: Option<SecretString>,
}

impl SessionContextBuilder {
    #[must_use]
    pub fn site_url(mut self, url: &str) -> Self {
        url.clone_into(&mut self.site_url);
        self
    }

    #[must_use]
    pub fn bearer_token(mut self, token: impl Into<SecretString>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn build(self) -> SessionContext {
        SessionContext {
            site_url: self.site_url,
            bearer_token: self.bearer_token,
        }
    }
}
