//! Query façade
//!
//! Decides between serving from cache and driving a live refresh, and
//! renders the two views the CLI exposes: the full grouped inventory and
//! the per-host variable set.

use crate::aws::client::ResourceClient;
use crate::config::Config;
use crate::inventory::route53::Route53Records;
use crate::inventory::{
    format_groups, host_vars, Aggregator, CacheKind, CacheStore, Index, Inventory,
};
use anyhow::{Context, Result};

/// One inventory run over a provider client.
///
/// Generic over [`ResourceClient`] so tests can substitute a fake provider.
pub struct App<C> {
    client: C,
    config: Config,
    cache: CacheStore,
    tags_only: bool,
    inventory: Inventory,
    index: Index,
}

impl<C: ResourceClient> App<C> {
    pub fn new(client: C, config: Config, cache: CacheStore, tags_only: bool) -> Self {
        Self {
            client,
            config,
            cache,
            tags_only,
            inventory: Inventory::new(),
            index: Index::new(),
        }
    }

    /// The underlying provider client.
    pub fn client(&self) -> &C {
        &self.client
    }

    fn cache_kind(&self) -> CacheKind {
        if self.tags_only {
            CacheKind::TagsOnly
        } else {
            CacheKind::Full
        }
    }

    pub fn cache_is_valid(&self) -> bool {
        self.cache.is_valid(self.cache_kind())
    }

    /// Rebuilds the whole inventory from the provider and persists it.
    ///
    /// Regions are walked in sequence and every failure is fatal; partial
    /// coverage is never written to the cache.
    pub async fn refresh_all(&mut self) -> Result<()> {
        let route53 = if self.config.route53 {
            Some(Route53Records::fetch(&self.client, &self.config.route53_excluded_zones).await?)
        } else {
            None
        };

        let regions = self.regions().await?;
        let mut aggregator = Aggregator::new();

        for region in &regions {
            tracing::info!("querying region {region}");

            let instances = self
                .client
                .list_instances(region)
                .await
                .with_context(|| format!("failed to list instances in {region}"))?;
            for instance in &instances {
                aggregator.add_instance(instance, region, &self.config, route53.as_ref())?;
            }

            let databases = self
                .client
                .list_db_instances(region)
                .await
                .with_context(|| format!("failed to list database instances in {region}"))?;
            for database in &databases {
                aggregator.add_rds_instance(database, region)?;
            }
        }

        self.cache
            .write(&aggregator.inventory, &aggregator.index, self.tags_only)?;
        self.inventory = aggregator.inventory;
        self.index = aggregator.index;

        tracing::info!(
            "refreshed {} groups across {} regions",
            self.inventory.len(),
            regions.len()
        );
        Ok(())
    }

    /// The configured region list, with "all" expanded through the provider
    /// minus the exclusion set.
    async fn regions(&self) -> Result<Vec<String>> {
        if self.config.regions.len() == 1 && self.config.regions[0] == "all" {
            let all = self
                .client
                .list_region_names()
                .await
                .context("failed to enumerate regions")?;
            Ok(all
                .into_iter()
                .filter(|r| !self.config.regions_exclude.contains(r))
                .collect())
        } else {
            Ok(self.config.regions.clone())
        }
    }

    /// The grouped inventory: from memory right after a refresh, verbatim
    /// from the cache file otherwise.
    pub fn list(&self) -> Result<String> {
        if !self.inventory.is_empty() {
            format_groups(&self.inventory, self.tags_only)
        } else {
            self.cache.load_payload(self.cache_kind())
        }
    }

    /// All `ec2_*` variables for one host, identified by its endpoint.
    ///
    /// An endpoint missing from the index forces one refresh; if it is
    /// still unknown afterwards the host is presumed decommissioned and an
    /// empty object is returned instead of an error.
    pub async fn host(&mut self, endpoint: &str) -> Result<String> {
        if self.index.is_empty() {
            self.index = self.cache.load_index()?;
        }

        if !self.index.contains_key(endpoint) {
            tracing::info!("{endpoint} not in cached index, refreshing");
            self.refresh_all().await?;
        }

        let Some((region, instance_id)) = self.index.get(endpoint) else {
            return Ok(serde_json::to_string_pretty(&serde_json::Map::new())?);
        };

        let instance = self
            .client
            .get_instance(region, instance_id)
            .await
            .with_context(|| format!("failed to describe instance {instance_id} in {region}"))?;

        let vars = host_vars::flatten(&instance, region);
        Ok(serde_json::to_string_pretty(&vars)?)
    }
}
