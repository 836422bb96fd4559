use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use thiserror::Error;

#[cfg(test)]
use mockall::{automock, predicate::*};

/// Services that must all be offered in a region before it is worth
/// presenting to the operator.
pub const REQUIRED_SERVICES: [&str; 5] = ["ec2", "sqs", "kms", "efs", "sns"];

/// A region needs at least this many zones in the `available` state.
pub const MIN_AVAILABLE_ZONES: usize = 3;

/// Why the credential probe failed. Each variant maps to its own
/// remediation message; all of them are fatal.
///
/// The SDK is compiled into the binary, so the "SDK missing" failure the
/// equivalent scripted tools report cannot happen here; anything that is
/// neither a missing-credential nor a rejected-credential case lands in
/// `Api`.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no AWS credentials were found by the default provider chain")]
    NoCredentials,
    #[error("AWS rejected the call: {0}")]
    Unauthorized(String),
    #[error("the probe call failed: {0}")]
    Api(String),
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait CredentialCheck: Debug {
    /// Issue a minimal read-only call to confirm the ambient credentials
    /// are present and usable.
    async fn verify(&self) -> Result<(), ProbeError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait RegionCatalog: Debug {
    async fn partitions(&self) -> Result<Vec<String>, String>;
    async fn regions_for_service(
        &self,
        service: &str,
        partition: &str,
    ) -> Result<Vec<String>, String>;
    async fn available_zone_count(&self, region: &str) -> Result<usize, String>;
}

/// The candidate regions still in play, in first-seen enumeration order,
/// plus the partition each one belongs to. The order is the contract the
/// numbered prompts rely on; filtering stages preserve it and the pool
/// never grows after discovery.
#[derive(Debug, Default)]
pub struct RegionPool {
    regions: Vec<String>,
    partition_by_region: HashMap<String, String>,
}

impl RegionPool {
    pub fn new(regions: Vec<String>, partition_by_region: HashMap<String, String>) -> Self {
        Self {
            regions,
            partition_by_region,
        }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(String::as_str)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.regions.get(index).map(String::as_str)
    }

    pub fn partition_of(&self, region: &str) -> Option<&str> {
        self.partition_by_region.get(region).map(String::as_str)
    }

    /// Remove and return the region at `index` (0-based).
    pub fn remove(&mut self, index: usize) -> Option<String> {
        if index < self.regions.len() {
            Some(self.regions.remove(index))
        } else {
            None
        }
    }

    fn retain<F: FnMut(&str) -> bool>(&mut self, mut keep: F) {
        self.regions.retain(|region| keep(region));
    }
}

/// Outcome of the zone health check for one region.
#[derive(Debug, PartialEq, Eq)]
pub enum ZoneCheck {
    Qualified(usize),
    TooFew(usize),
    Failed(String),
}

/// What the operator settled on. Built up across the prompts and written
/// out exactly once after confirmation.
#[derive(Debug, PartialEq, Eq)]
pub struct Selections {
    pub home_region: String,
    pub remote_region: String,
    pub bucket_prefix: String,
}

/// Runs the two read-only stages: region discovery (service-availability
/// intersection) and availability-zone qualification.
#[derive(Debug)]
pub struct RegionFinder<C: RegionCatalog> {
    catalog: C,
}

impl<C: RegionCatalog> RegionFinder<C> {
    pub fn new(catalog: C) -> Self {
        Self { catalog }
    }

    /// Regions where every service in `services` is available.
    ///
    /// The pool is seeded from the first service's candidates and
    /// intersected with each subsequent service's set, so an empty
    /// `services` list yields an empty pool. Any catalog failure here is
    /// propagated; discovery cannot proceed on partial data.
    pub async fn discover(&self, services: &[&str]) -> Result<RegionPool, String> {
        let partitions = self.catalog.partitions().await?;

        let mut partition_by_region: HashMap<String, String> = HashMap::new();
        let mut pool: Option<Vec<String>> = None;

        for service in services {
            let mut candidates = Vec::new();
            for partition in &partitions {
                let regions = self.catalog.regions_for_service(service, partition).await?;
                for region in regions {
                    partition_by_region
                        .entry(region.clone())
                        .or_insert_with(|| partition.clone());
                    candidates.push(region);
                }
            }
            pool = Some(match pool {
                None => candidates,
                Some(kept) => kept
                    .into_iter()
                    .filter(|region| candidates.contains(region))
                    .collect(),
            });
        }

        Ok(RegionPool::new(
            pool.unwrap_or_default(),
            partition_by_region,
        ))
    }

    /// Drop regions with fewer than [`MIN_AVAILABLE_ZONES`] healthy zones.
    ///
    /// A failed zone query disqualifies that one region instead of
    /// aborting; the report carries the verdict for every region so the
    /// caller can narrate the result.
    pub async fn qualify(&self, pool: &mut RegionPool) -> Vec<(String, ZoneCheck)> {
        let mut report = Vec::with_capacity(pool.len());

        for region in pool.regions.clone() {
            let check = match self.catalog.available_zone_count(&region).await {
                Ok(count) if count >= MIN_AVAILABLE_ZONES => ZoneCheck::Qualified(count),
                Ok(count) => ZoneCheck::TooFew(count),
                Err(reason) => {
                    tracing::warn!(region = %region, %reason, "zone status query failed");
                    ZoneCheck::Failed(reason)
                }
            };
            report.push((region, check));
        }

        pool.retain(|region| {
            report
                .iter()
                .any(|(name, check)| name == region && matches!(check, ZoneCheck::Qualified(_)))
        });

        report
    }
}
