//! Grouping engine
//!
//! Folds one resource record at a time into the grouped inventory and the
//! endpoint index.

use super::route53::Route53Records;
use super::{Index, Inventory};
use crate::aws::records::{Ec2Instance, RdsInstance};
use crate::config::Config;
use anyhow::{bail, Result};

/// Accumulates the grouped inventory and the endpoint index for one refresh.
///
/// Built fresh per refresh and handed back to the caller afterwards; it
/// never outlives a run.
#[derive(Debug, Default)]
pub struct Aggregator {
    pub inventory: Inventory,
    pub index: Index,
}

/// Replaces every character outside `[A-Za-z0-9-]` with an underscore so
/// the result is usable as a group name. Preserves character count.
pub fn to_safe(word: &str) -> String {
    word.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one EC2 instance into the inventory and index.
    ///
    /// Instances that are not running, or that have no reachable address,
    /// are skipped. A response without a security-group list aborts the
    /// run: the API no longer looks like the one this tool understands.
    pub fn add_instance(
        &mut self,
        instance: &Ec2Instance,
        region: &str,
        config: &Config,
        route53: Option<&Route53Records>,
    ) -> Result<()> {
        if instance.state != "running" {
            return Ok(());
        }

        // Instances inside a VPC are addressed by a different attribute.
        let attr = if instance.subnet_id.as_deref().is_some_and(|s| !s.is_empty()) {
            &config.vpc_destination_variable
        } else {
            &config.destination_variable
        };
        let Some(dest) = instance.address_attr(attr) else {
            bail!("unknown destination attribute in configuration: {attr}");
        };
        if dest.is_empty() {
            // Not addressable, e.g. a private VPC subnet without the chosen
            // address. Skipped, not an error.
            return Ok(());
        }
        let dest = dest.to_string();

        self.index
            .insert(dest.clone(), (region.to_string(), instance.id.clone()));

        // Group of one, keyed by instance id.
        self.inventory.insert(instance.id.clone(), vec![dest.clone()]);

        self.push(region, &dest);
        self.push(&instance.placement, &dest);
        self.push(&to_safe(&format!("type_{}", instance.instance_type)), &dest);

        if let Some(key_name) = instance.key_name.as_deref().filter(|k| !k.is_empty()) {
            self.push(&to_safe(&format!("key_{key_name}")), &dest);
        }

        let Some(groups) = &instance.security_groups else {
            bail!(
                "instance {} came back without a security group list; \
                 the API response looks incompatible with this tool",
                instance.id
            );
        };
        for group in groups {
            self.push(&to_safe(&format!("security_group_{}", group.name)), &dest);
        }

        for (k, v) in &instance.tags {
            let key = to_safe(&format!("tag_{k}={v}"));
            self.push(&key, &dest);
            self.keep_first(&format!("first_in_{key}"), &dest);
        }

        if let Some(route53) = route53 {
            for name in route53.names_for(instance) {
                self.push(&name, &dest);
            }
        }

        Ok(())
    }

    /// Folds one RDS instance into the inventory and index.
    ///
    /// Same shape as [`add_instance`](Self::add_instance): only "available"
    /// databases with an endpoint address are admitted.
    pub fn add_rds_instance(&mut self, instance: &RdsInstance, region: &str) -> Result<()> {
        if instance.status != "available" {
            return Ok(());
        }

        let dest = instance.endpoint_address.clone();
        if dest.is_empty() {
            return Ok(());
        }

        self.index
            .insert(dest.clone(), (region.to_string(), instance.id.clone()));

        self.inventory.insert(instance.id.clone(), vec![dest.clone()]);

        self.push(region, &dest);
        self.push(&instance.availability_zone, &dest);
        self.push(&to_safe(&format!("type_{}", instance.instance_class)), &dest);

        let Some(groups) = &instance.security_groups else {
            bail!(
                "database {} came back without a security group list; \
                 the API response looks incompatible with this tool",
                instance.id
            );
        };
        if let Some(group) = groups.first() {
            self.push(&to_safe(&format!("security_group_{group}")), &dest);
        }

        self.push(&to_safe(&format!("rds_{}", instance.engine)), &dest);

        let Some(parameter_group) = &instance.parameter_group else {
            bail!(
                "database {} came back without a parameter group; \
                 the API response looks incompatible with this tool",
                instance.id
            );
        };
        self.push(
            &to_safe(&format!("rds_parameter_group_{parameter_group}")),
            &dest,
        );

        Ok(())
    }

    /// Appends to a group, creating it on first use. Order within a group is
    /// call order.
    pub fn push(&mut self, key: &str, element: &str) {
        self.inventory
            .entry(key.to_string())
            .or_default()
            .push(element.to_string());
    }

    /// Creates the group with a single element only if absent; later calls
    /// never overwrite. Only the `first_in_tag_` groups use this — note the
    /// index takes the opposite policy on duplicate endpoints (last write
    /// wins).
    pub fn keep_first(&mut self, key: &str, element: &str) {
        self.inventory
            .entry(key.to_string())
            .or_insert_with(|| vec![element.to_string()]);
    }
}
