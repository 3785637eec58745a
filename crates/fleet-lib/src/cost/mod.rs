//! Cost estimation
//!
//! Maps a resource and its evaluation outcome to hourly, daily, weekly and
//! monthly projections. All currency math is fixed-precision decimal.

mod estimator;
mod pricing;
mod rate_cache;

pub use estimator::{
    expensive_underutilized_threshold, high_impact_threshold, is_expensive_underutilized,
    medium_impact_threshold, project, rank_by_impact, rank_from_monthly, total_monthly,
    CostEstimator, HOURS_PER_MONTH,
};
pub use pricing::{PricingSource, StaticPricingSource, StaticRate};
pub use rate_cache::{RateCache, ResolvedRate};
