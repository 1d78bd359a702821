//! Provider registry.
//!
//! # Responsibilities
//! - Hold the ordered list of upstream resolvers
//! - Guarantee the list is non-empty and every weight is positive
//!
//! Order is only the fallback order after the weighted pick; it never acts
//! as a priority.

use std::ops::Deref;

use thiserror::Error;

use crate::config::ProviderConfig;
use crate::upstream::provider::{ProviderDescriptor, ProviderError};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("provider registry cannot be empty")]
    Empty,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Read-only, non-empty list of upstream resolvers.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<ProviderDescriptor>,
}

impl ProviderRegistry {
    pub fn new(providers: Vec<ProviderDescriptor>) -> Result<Self, RegistryError> {
        if providers.is_empty() {
            return Err(RegistryError::Empty);
        }
        Ok(Self { providers })
    }

    /// Build the registry from configuration entries.
    pub fn from_config(configs: &[ProviderConfig]) -> Result<Self, RegistryError> {
        let providers = configs
            .iter()
            .map(ProviderDescriptor::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(providers)
    }

    /// Sum of all weights.
    pub fn total_weight(&self) -> u64 {
        self.providers.iter().map(|p| u64::from(p.weight.get())).sum()
    }

    pub fn providers(&self) -> &[ProviderDescriptor] {
        &self.providers
    }
}

impl Deref for ProviderRegistry {
    type Target = [ProviderDescriptor];

    fn deref(&self) -> &Self::Target {
        &self.providers
    }
}
