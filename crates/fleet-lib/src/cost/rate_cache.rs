//! Hourly rate cache
//!
//! Resolved rates are cached per (region, resource type) for the lifetime of
//! the cache object. Entries never expire; a racing duplicate insert simply
//! overwrites an equal value.

use crate::models::RateSource;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};

/// A rate together with where it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRate {
    pub hourly: Decimal,
    pub source: RateSource,
}

impl ResolvedRate {
    pub fn unavailable() -> Self {
        Self {
            hourly: Decimal::ZERO,
            source: RateSource::Unavailable,
        }
    }
}

#[derive(Debug, Default)]
pub struct RateCache {
    rates: DashMap<(String, String), ResolvedRate>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, region: &str, resource_type: &str) -> Option<ResolvedRate> {
        let key = (region.to_string(), resource_type.to_string());
        match self.rates.get(&key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(*entry.value())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, region: &str, resource_type: &str, rate: ResolvedRate) {
        self.rates
            .insert((region.to_string(), resource_type.to_string()), rate);
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}
