//! Pricing lookups

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Source of hourly compute rates.
///
/// `Ok(None)` means the source has no data for the pair; an `Err` means the
/// lookup itself failed. A zero rate is treated as "no data" by callers.
#[async_trait]
pub trait PricingSource: Send + Sync {
    async fn spot_rate(&self, resource_type: &str, region: &str)
        -> anyhow::Result<Option<Decimal>>;

    async fn on_demand_rate(
        &self,
        resource_type: &str,
        region: &str,
    ) -> anyhow::Result<Option<Decimal>>;
}

/// One row of a static price table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticRate {
    pub resource_type: String,
    /// Applies to every region when unset
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub spot: Option<Decimal>,
    #[serde(default)]
    pub on_demand: Option<Decimal>,
}

/// Pricing source backed by a fixed table, for offline runs and tests
#[derive(Debug, Clone, Default)]
pub struct StaticPricingSource {
    rates: Vec<StaticRate>,
}

impl StaticPricingSource {
    pub fn new(rates: Vec<StaticRate>) -> Self {
        Self { rates }
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Region-specific rows win over region-less ones
    fn lookup(&self, resource_type: &str, region: &str) -> Option<&StaticRate> {
        let mut fallback = None;
        for rate in self.rates.iter().filter(|r| r.resource_type == resource_type) {
            match rate.region.as_deref() {
                Some(r) if r == region => return Some(rate),
                None if fallback.is_none() => fallback = Some(rate),
                _ => {}
            }
        }
        fallback
    }
}

#[async_trait]
impl PricingSource for StaticPricingSource {
    async fn spot_rate(
        &self,
        resource_type: &str,
        region: &str,
    ) -> anyhow::Result<Option<Decimal>> {
        Ok(self.lookup(resource_type, region).and_then(|r| r.spot))
    }

    async fn on_demand_rate(
        &self,
        resource_type: &str,
        region: &str,
    ) -> anyhow::Result<Option<Decimal>> {
        Ok(self.lookup(resource_type, region).and_then(|r| r.on_demand))
    }
}
