//! Effective pricing configuration.

use darkroom_core::{PricingConfig, PricingOverride};
use tracing::{instrument, warn};

use super::ServiceError;
use crate::db::SettingsRepository;

/// Resolves and updates the store's pricing.
pub struct PricingService<'a> {
    settings: &'a dyn SettingsRepository,
}

impl<'a> PricingService<'a> {
    #[must_use]
    pub const fn new(settings: &'a dyn SettingsRepository) -> Self {
        Self { settings }
    }

    /// Defaults with the stored override laid over them, field by field.
    ///
    /// Never fails: a missing override is normal, and an unreadable one is
    /// logged and treated as missing.
    #[instrument(skip(self))]
    pub async fn resolve(&self) -> PricingConfig {
        match self.settings.get_pricing().await {
            Ok(Some(over)) => PricingConfig::default().with_override(&over),
            Ok(None) => PricingConfig::default(),
            Err(e) => {
                warn!(error = %e, "Failed to load pricing override, using defaults");
                PricingConfig::default()
            }
        }
    }

    /// Replace the stored override and return the new effective pricing.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for negative amounts and
    /// `ServiceError::Repository` if the write fails.
    #[instrument(skip(self, pricing))]
    pub async fn replace_override(
        &self,
        pricing: &PricingOverride,
    ) -> Result<PricingConfig, ServiceError> {
        let effective = PricingConfig::default().with_override(pricing);
        let amounts = [
            effective.shipping.standard,
            effective.shipping.express,
            effective.add_ons.frame.black,
            effective.add_ons.frame.white,
            effective.add_ons.gift_wrap,
            effective.add_ons.signed,
        ];
        if amounts.iter().any(|m| m.is_negative()) {
            return Err(ServiceError::InvalidArgument(
                "prices must not be negative".to_string(),
            ));
        }

        self.settings.put_pricing(pricing).await?;
        Ok(effective)
    }
}
