//! Cost projection and ranking

use super::pricing::PricingSource;
use super::rate_cache::{RateCache, ResolvedRate};
use crate::error::{bounded, Collaborator};
use crate::models::{CostImpactRank, CostProjection, RateSource, ResourceDescriptor};
use crate::observability::ScannerMetrics;
use crate::policy::Verdict;
use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Billing hours in an average month
pub const HOURS_PER_MONTH: i64 = 730;

const HOURS_PER_DAY: i64 = 24;
const HOURS_PER_WEEK: i64 = 168;

/// Monthly spend at or above which impact is high
pub fn high_impact_threshold() -> Decimal {
    Decimal::new(50, 0)
}

/// Monthly spend at or above which impact is medium
pub fn medium_impact_threshold() -> Decimal {
    Decimal::new(10, 0)
}

/// Monthly spend above which an underutilized resource is worth flagging
pub fn expensive_underutilized_threshold() -> Decimal {
    Decimal::new(10, 0)
}

pub fn rank_from_monthly(monthly: Decimal) -> CostImpactRank {
    if monthly >= high_impact_threshold() {
        CostImpactRank::High
    } else if monthly >= medium_impact_threshold() {
        CostImpactRank::Medium
    } else {
        CostImpactRank::Low
    }
}

/// Idle-but-billed heuristic: an underutilized resource is projected at half
/// its nominal runtime.
fn utilization_factor(underutilized: Option<bool>) -> Decimal {
    if underutilized == Some(true) {
        Decimal::new(5, 1)
    } else {
        Decimal::ONE
    }
}

fn cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Build a projection from an already-resolved rate
pub fn project(
    descriptor: &ResourceDescriptor,
    rate: ResolvedRate,
    underutilized: Option<bool>,
) -> CostProjection {
    let factor = utilization_factor(underutilized);
    let forecast = |hours: i64| cents(rate.hourly * Decimal::from(hours) * factor);
    let monthly_forecast = forecast(HOURS_PER_MONTH);

    CostProjection {
        resource_id: descriptor.resource_id.clone(),
        region: descriptor.region.clone(),
        resource_type: descriptor.resource_type.clone(),
        hourly_rate: rate.hourly,
        rate_source: rate.source,
        daily_forecast: forecast(HOURS_PER_DAY),
        weekly_forecast: forecast(HOURS_PER_WEEK),
        monthly_forecast,
        rank: rank_from_monthly(monthly_forecast),
        underutilized,
    }
}

/// Underutilized with a known price and a monthly forecast above $10
pub fn is_expensive_underutilized(projection: &CostProjection) -> bool {
    projection.underutilized == Some(true)
        && projection.hourly_rate > Decimal::ZERO
        && projection.monthly_forecast > expensive_underutilized_threshold()
}

/// Sort by descending monthly forecast, resource ID breaking ties
pub fn rank_by_impact(projections: &mut [CostProjection]) {
    projections.sort_by(|a, b| {
        b.monthly_forecast
            .cmp(&a.monthly_forecast)
            .then_with(|| a.resource_id.cmp(&b.resource_id))
    });
}

/// Sum of monthly forecasts
pub fn total_monthly(projections: &[CostProjection]) -> Decimal {
    projections.iter().map(|p| p.monthly_forecast).sum()
}

/// Maps resources to cost projections using a pricing source and a shared
/// rate cache
#[derive(Clone)]
pub struct CostEstimator {
    pricing: Arc<dyn PricingSource>,
    cache: Arc<RateCache>,
    timeout: Duration,
    metrics: Option<ScannerMetrics>,
}

impl CostEstimator {
    pub fn new(pricing: Arc<dyn PricingSource>, cache: Arc<RateCache>, timeout: Duration) -> Self {
        Self {
            pricing,
            cache,
            timeout,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: ScannerMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn cache(&self) -> &Arc<RateCache> {
        &self.cache
    }

    /// Resolve the hourly rate for a resource type in a region.
    ///
    /// Spot is tried first; on-demand is used when spot has no data or the
    /// spot lookup fails. Only positive rates are cached, so a pair that
    /// failed both lookups is retried on the next call.
    pub async fn resolve_rate(&self, resource_type: &str, region: &str) -> ResolvedRate {
        if let Some(rate) = self.cache.get(region, resource_type) {
            self.record_lookup(true);
            return rate;
        }
        self.record_lookup(false);

        let scope = format!("{}/{}", region, resource_type);

        let spot = self
            .lookup(&scope, RateSource::Spot, self.pricing.spot_rate(resource_type, region))
            .await;
        let resolved = match spot {
            Some(hourly) => Some(ResolvedRate {
                hourly,
                source: RateSource::Spot,
            }),
            None => self
                .lookup(
                    &scope,
                    RateSource::OnDemand,
                    self.pricing.on_demand_rate(resource_type, region),
                )
                .await
                .map(|hourly| ResolvedRate {
                    hourly,
                    source: RateSource::OnDemand,
                }),
        };

        match resolved {
            Some(rate) => {
                self.cache.insert(region, resource_type, rate);
                rate
            }
            None => {
                warn!(
                    region = %region,
                    resource_type = %resource_type,
                    "No hourly rate available, projecting zero cost"
                );
                ResolvedRate::unavailable()
            }
        }
    }

    /// One pricing call; `None` for no data, zero, or failure
    async fn lookup<F>(&self, scope: &str, source: RateSource, call: F) -> Option<Decimal>
    where
        F: std::future::Future<Output = anyhow::Result<Option<Decimal>>>,
    {
        let start = Instant::now();
        let result = bounded(Collaborator::Pricing, scope, self.timeout, call).await;
        if let Some(metrics) = &self.metrics {
            metrics.observe_collaborator_latency(Collaborator::Pricing, start.elapsed().as_secs_f64());
        }

        match result {
            Ok(Some(rate)) if rate > Decimal::ZERO => Some(rate),
            Ok(_) => {
                debug!(scope = %scope, source = ?source, "No pricing data");
                None
            }
            Err(e) => {
                if let Some(metrics) = &self.metrics {
                    metrics.inc_collaborator_errors(Collaborator::Pricing);
                }
                warn!(scope = %scope, source = ?source, error = %e, "Pricing lookup failed");
                None
            }
        }
    }

    fn record_lookup(&self, hit: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.record_rate_lookup(hit);
        }
    }

    /// Project cost for a resource given its evaluation outcome
    pub async fn estimate(&self, descriptor: &ResourceDescriptor, verdict: &Verdict) -> CostProjection {
        let rate = self
            .resolve_rate(&descriptor.resource_type, &descriptor.region)
            .await;
        project(descriptor, rate, verdict.underutilized())
    }
}
