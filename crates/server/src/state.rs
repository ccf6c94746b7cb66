//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::SecretString;

use crate::config::ServerConfig;
use crate::db::{Clock, Repositories};
use crate::payments::{PaymentGateway, WebhookVerifier};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Services are built per request from the
/// borrowed handles.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    repos: Repositories,
    gateway: Arc<dyn PaymentGateway>,
    verifier: WebhookVerifier,
    clock: Arc<dyn Clock>,
    admin_token: Option<SecretString>,
}

impl AppState {
    /// Create application state from loaded configuration.
    #[must_use]
    pub fn new(
        config: &ServerConfig,
        repos: Repositories,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let verifier = WebhookVerifier::new(
            config.stripe.webhook_secret.clone(),
            config.stripe.webhook_tolerance,
        );
        Self::from_parts(repos, gateway, verifier, clock, config.admin_token.clone())
    }

    /// Assemble state from already-built parts.
    #[must_use]
    pub fn from_parts(
        repos: Repositories,
        gateway: Arc<dyn PaymentGateway>,
        verifier: WebhookVerifier,
        clock: Arc<dyn Clock>,
        admin_token: Option<SecretString>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                repos,
                gateway,
                verifier,
                clock,
                admin_token,
            }),
        }
    }

    #[must_use]
    pub fn repos(&self) -> &Repositories {
        &self.inner.repos
    }

    /// Get a reference to the payment gateway client.
    #[must_use]
    pub fn gateway(&self) -> &dyn PaymentGateway {
        self.inner.gateway.as_ref()
    }

    #[must_use]
    pub fn verifier(&self) -> &WebhookVerifier {
        &self.inner.verifier
    }

    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }

    /// Bearer token for `/admin/*`, if admin auth is enabled.
    #[must_use]
    pub fn admin_token(&self) -> Option<&SecretString> {
        self.inner.admin_token.as_ref()
    }
}
