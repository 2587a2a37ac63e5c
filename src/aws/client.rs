//! AWS resource client.
//!
//! [`ResourceClient`] is the seam between the inventory engine and the
//! provider: everything above it sees only the typed records in
//! [`records`](super::records). [`AwsClient`] is the SDK-backed production
//! implementation; tests substitute their own.

use super::context::AwsContext;
use super::records::{Ec2Instance, HostedZone, RdsInstance, RecordSet, SecurityGroupRef};
use anyhow::{Context, Result};
use std::collections::BTreeMap;

/// Provider operations the inventory engine needs.
///
/// Implementations must return an error for an unreachable or unsupported
/// region; the caller treats that as fatal for the whole run.
#[allow(async_fn_in_trait)]
pub trait ResourceClient {
    /// All EC2 instances in a region, regardless of state.
    async fn list_instances(&self, region: &str) -> Result<Vec<Ec2Instance>>;

    /// All RDS database instances in a region.
    async fn list_db_instances(&self, region: &str) -> Result<Vec<RdsInstance>>;

    /// One instance by id, for host-detail lookups.
    async fn get_instance(&self, region: &str, instance_id: &str) -> Result<Ec2Instance>;

    /// All Route 53 hosted zones.
    async fn list_zones(&self) -> Result<Vec<HostedZone>>;

    /// All record sets of one hosted zone.
    async fn list_records(&self, zone_id: &str) -> Result<Vec<RecordSet>>;

    /// Names of every region the account can reach.
    async fn list_region_names(&self) -> Result<Vec<String>>;
}

/// Production client over the AWS SDK.
#[derive(Clone, Debug)]
pub struct AwsClient {
    context: AwsContext,
}

impl AwsClient {
    pub async fn new() -> Self {
        Self {
            context: AwsContext::new().await,
        }
    }
}

impl ResourceClient for AwsClient {
    async fn list_instances(&self, region: &str) -> Result<Vec<Ec2Instance>> {
        let client = self.context.ec2_client(region);
        let mut instances = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut request = client.describe_instances();
            if let Some(token) = &next_token {
                request = request.next_token(token);
            }
            let response = request
                .send()
                .await
                .with_context(|| format!("DescribeInstances failed in {region}"))?;

            for reservation in response.reservations() {
                for instance in reservation.instances() {
                    instances.push(ec2_record(instance));
                }
            }

            next_token = response.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        tracing::debug!("{region}: {} instances", instances.len());
        Ok(instances)
    }

    async fn list_db_instances(&self, region: &str) -> Result<Vec<RdsInstance>> {
        let client = self.context.rds_client(region);
        let mut databases = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut request = client.describe_db_instances();
            if let Some(marker) = &marker {
                request = request.marker(marker);
            }
            let response = request
                .send()
                .await
                .with_context(|| format!("DescribeDBInstances failed in {region}"))?;

            for db in response.db_instances() {
                databases.push(rds_record(db));
            }

            marker = response.marker().map(str::to_string);
            if marker.is_none() {
                break;
            }
        }

        tracing::debug!("{region}: {} database instances", databases.len());
        Ok(databases)
    }

    async fn get_instance(&self, region: &str, instance_id: &str) -> Result<Ec2Instance> {
        let client = self.context.ec2_client(region);
        let response = client
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .with_context(|| format!("DescribeInstances failed for {instance_id} in {region}"))?;

        let instance = response
            .reservations()
            .iter()
            .flat_map(|r| r.instances())
            .next()
            .with_context(|| format!("instance {instance_id} not found in {region}"))?;

        Ok(ec2_record(instance))
    }

    async fn list_zones(&self) -> Result<Vec<HostedZone>> {
        let client = self.context.route53_client();
        let mut zones = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut request = client.list_hosted_zones();
            if let Some(marker) = &marker {
                request = request.marker(marker);
            }
            let response = request.send().await.context("ListHostedZones failed")?;

            for zone in response.hosted_zones() {
                zones.push(HostedZone {
                    id: zone.id().trim_start_matches("/hostedzone/").to_string(),
                    name: zone.name().to_string(),
                });
            }

            if !response.is_truncated() {
                break;
            }
            marker = response.next_marker().map(str::to_string);
            if marker.is_none() {
                break;
            }
        }

        Ok(zones)
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<RecordSet>> {
        let client = self.context.route53_client();
        let mut record_sets = Vec::new();
        let mut next: Option<(String, aws_sdk_route53::types::RrType)> = None;

        loop {
            let mut request = client.list_resource_record_sets().hosted_zone_id(zone_id);
            if let Some((name, rr_type)) = &next {
                request = request
                    .start_record_name(name)
                    .start_record_type(rr_type.clone());
            }
            let response = request
                .send()
                .await
                .with_context(|| format!("ListResourceRecordSets failed for zone {zone_id}"))?;

            for set in response.resource_record_sets() {
                record_sets.push(RecordSet {
                    name: set.name().to_string(),
                    records: set
                        .resource_records()
                        .iter()
                        .map(|r| r.value().to_string())
                        .collect(),
                });
            }

            if !response.is_truncated() {
                break;
            }
            next = match (response.next_record_name(), response.next_record_type()) {
                (Some(name), Some(rr_type)) => Some((name.to_string(), rr_type.clone())),
                _ => None,
            };
            if next.is_none() {
                break;
            }
        }

        Ok(record_sets)
    }

    async fn list_region_names(&self) -> Result<Vec<String>> {
        // DescribeRegions is answered by any region endpoint.
        let client = self.context.ec2_client("us-east-1");
        let response = client
            .describe_regions()
            .send()
            .await
            .context("DescribeRegions failed")?;

        Ok(response
            .regions()
            .iter()
            .filter_map(|r| r.region_name().map(str::to_string))
            .collect())
    }
}

fn ec2_record(instance: &aws_sdk_ec2::types::Instance) -> Ec2Instance {
    let tags: BTreeMap<String, String> = instance
        .tags()
        .iter()
        .filter_map(|t| Some((t.key()?.to_string(), t.value()?.to_string())))
        .collect();

    // Field access instead of the accessor: the accessor flattens the Option
    // and the aggregator needs to see an absent list as a schema mismatch.
    let security_groups = instance.security_groups.as_ref().map(|groups| {
        groups
            .iter()
            .map(|g| SecurityGroupRef {
                id: g.group_id().unwrap_or_default().to_string(),
                name: g.group_name().unwrap_or_default().to_string(),
            })
            .collect()
    });

    Ec2Instance {
        id: instance.instance_id().unwrap_or_default().to_string(),
        state: instance
            .state()
            .and_then(|s| s.name())
            .map(|n| n.as_str().to_string())
            .unwrap_or_default(),
        placement: instance
            .placement()
            .and_then(|p| p.availability_zone())
            .unwrap_or_default()
            .to_string(),
        instance_type: instance
            .instance_type()
            .map(|t| t.as_str().to_string())
            .unwrap_or_default(),
        key_name: instance.key_name().map(str::to_string),
        subnet_id: instance.subnet_id().map(str::to_string),
        vpc_id: instance.vpc_id().map(str::to_string),
        public_dns_name: instance.public_dns_name().unwrap_or_default().to_string(),
        private_dns_name: instance.private_dns_name().unwrap_or_default().to_string(),
        ip_address: instance.public_ip_address().unwrap_or_default().to_string(),
        private_ip_address: instance
            .private_ip_address()
            .unwrap_or_default()
            .to_string(),
        security_groups,
        tags,
        architecture: instance.architecture().map(|a| a.as_str().to_string()),
        image_id: instance.image_id().map(str::to_string),
        launch_time: instance.launch_time().map(|t| t.to_string()),
        platform: instance.platform().map(|p| p.as_str().to_string()),
        ami_launch_index: instance.ami_launch_index().map(i64::from),
        ebs_optimized: instance.ebs_optimized(),
        source_dest_check: instance.source_dest_check(),
        root_device_name: instance.root_device_name().map(str::to_string),
        root_device_type: instance.root_device_type().map(|t| t.as_str().to_string()),
        virtualization_type: instance
            .virtualization_type()
            .map(|t| t.as_str().to_string()),
        hypervisor: instance.hypervisor().map(|h| h.as_str().to_string()),
        client_token: instance.client_token().map(str::to_string),
    }
}

fn rds_record(db: &aws_sdk_rds::types::DbInstance) -> RdsInstance {
    RdsInstance {
        id: db.db_instance_identifier().unwrap_or_default().to_string(),
        status: db.db_instance_status().unwrap_or_default().to_string(),
        availability_zone: db.availability_zone().unwrap_or_default().to_string(),
        instance_class: db.db_instance_class().unwrap_or_default().to_string(),
        engine: db.engine().unwrap_or_default().to_string(),
        endpoint_address: db
            .endpoint()
            .and_then(|e| e.address())
            .unwrap_or_default()
            .to_string(),
        security_groups: db.db_security_groups.as_ref().map(|groups| {
            groups
                .iter()
                .filter_map(|g| g.db_security_group_name().map(str::to_string))
                .collect()
        }),
        parameter_group: db
            .db_parameter_groups()
            .first()
            .and_then(|g| g.db_parameter_group_name())
            .map(str::to_string),
    }
}
