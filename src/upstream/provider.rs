//! Upstream resolver descriptor.

use std::fmt;
use std::num::NonZeroU32;

use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::config::ProviderConfig;

/// Error building a descriptor from configuration.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider '{0}' must have a positive weight")]
    ZeroWeight(String),

    #[error("provider '{name}' has an invalid url: {source}")]
    InvalidUrl {
        name: String,
        #[source]
        source: url::ParseError,
    },
}

/// A single upstream DoH resolver. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDescriptor {
    pub name: String,
    pub url: Url,
    pub weight: NonZeroU32,
    pub category: String,
    pub description: String,
}

impl ProviderDescriptor {
    pub fn new(name: impl Into<String>, url: Url, weight: NonZeroU32) -> Self {
        Self {
            name: name.into(),
            url,
            weight,
            category: String::new(),
            description: String::new(),
        }
    }
}

impl TryFrom<&ProviderConfig> for ProviderDescriptor {
    type Error = ProviderError;

    fn try_from(config: &ProviderConfig) -> Result<Self, Self::Error> {
        let weight = NonZeroU32::new(config.weight)
            .ok_or_else(|| ProviderError::ZeroWeight(config.name.clone()))?;
        let url = Url::parse(&config.url).map_err(|source| ProviderError::InvalidUrl {
            name: config.name.clone(),
            source,
        })?;

        Ok(Self {
            name: config.name.clone(),
            url,
            weight,
            category: config.category.clone(),
            description: config.description.clone(),
        })
    }
}

impl fmt::Display for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.url)
    }
}
