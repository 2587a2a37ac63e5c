//! Route 53 name-resolution map
//!
//! Maps every resource-record value (an address or hostname) to the set of
//! domain names pointing at it, so instances can be grouped by DNS name.
//! Rebuilt in full on every refresh; never cached.

use crate::aws::client::ResourceClient;
use crate::aws::records::Ec2Instance;
use anyhow::{Context, Result};
use std::collections::{BTreeSet, HashMap};

/// The instance attributes a domain name may point at.
const ADDRESS_ATTRIBUTES: [&str; 4] = [
    "public_dns_name",
    "private_dns_name",
    "ip_address",
    "private_ip_address",
];

/// Lookup table from record value to the domain names carrying it.
#[derive(Debug, Default)]
pub struct Route53Records {
    records: HashMap<String, BTreeSet<String>>,
}

impl Route53Records {
    /// Walks every hosted zone except the excluded ones and collects all
    /// record sets. Zone names are compared with the trailing dot stripped
    /// on both sides.
    pub async fn fetch<C: ResourceClient>(client: &C, excluded_zones: &[String]) -> Result<Self> {
        let mut records: HashMap<String, BTreeSet<String>> = HashMap::new();

        let zones = client
            .list_zones()
            .await
            .context("failed to list hosted zones")?;

        for zone in zones {
            let zone_name = zone.name.strip_suffix('.').unwrap_or(&zone.name);
            if excluded_zones
                .iter()
                .any(|z| z.trim_end_matches('.') == zone_name)
            {
                continue;
            }

            let record_sets = client
                .list_records(&zone.id)
                .await
                .with_context(|| format!("failed to list records of zone {zone_name}"))?;

            for record_set in record_sets {
                let name = record_set
                    .name
                    .strip_suffix('.')
                    .unwrap_or(&record_set.name)
                    .to_string();
                for value in record_set.records {
                    records.entry(value).or_default().insert(name.clone());
                }
            }
        }

        Ok(Self { records })
    }

    /// Domain names pointing at any of the instance's four addresses, or an
    /// empty list when nothing points at it.
    pub fn names_for(&self, instance: &Ec2Instance) -> Vec<String> {
        let mut names = BTreeSet::new();
        for attr in ADDRESS_ATTRIBUTES {
            if let Some(value) = instance.address_attr(attr) {
                if let Some(found) = self.records.get(value) {
                    names.extend(found.iter().cloned());
                }
            }
        }
        names.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::records::{HostedZone, RdsInstance, RecordSet};

    struct StaticClient {
        zones: Vec<HostedZone>,
        records: Vec<(String, RecordSet)>,
    }

    impl ResourceClient for StaticClient {
        async fn list_instances(&self, _region: &str) -> Result<Vec<Ec2Instance>> {
            Ok(Vec::new())
        }
        async fn list_db_instances(&self, _region: &str) -> Result<Vec<RdsInstance>> {
            Ok(Vec::new())
        }
        async fn get_instance(&self, _region: &str, id: &str) -> Result<Ec2Instance> {
            anyhow::bail!("no instance {id}")
        }
        async fn list_zones(&self) -> Result<Vec<HostedZone>> {
            Ok(self.zones.clone())
        }
        async fn list_records(&self, zone_id: &str) -> Result<Vec<RecordSet>> {
            Ok(self
                .records
                .iter()
                .filter(|(z, _)| z == zone_id)
                .map(|(_, r)| r.clone())
                .collect())
        }
        async fn list_region_names(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn sample_client() -> StaticClient {
        StaticClient {
            zones: vec![
                HostedZone {
                    id: "Z1".to_string(),
                    name: "example.com.".to_string(),
                },
                HostedZone {
                    id: "Z2".to_string(),
                    name: "internal.example.com.".to_string(),
                },
            ],
            records: vec![
                (
                    "Z1".to_string(),
                    RecordSet {
                        name: "web.example.com.".to_string(),
                        records: vec!["1.2.3.4".to_string()],
                    },
                ),
                (
                    "Z2".to_string(),
                    RecordSet {
                        name: "db.internal.example.com.".to_string(),
                        records: vec!["1.2.3.4".to_string()],
                    },
                ),
            ],
        }
    }

    #[tokio::test]
    async fn builds_value_to_name_map_without_trailing_dots() {
        let map = Route53Records::fetch(&sample_client(), &[]).await.unwrap();

        let instance = Ec2Instance {
            ip_address: "1.2.3.4".to_string(),
            ..Default::default()
        };
        assert_eq!(
            map.names_for(&instance),
            vec![
                "db.internal.example.com".to_string(),
                "web.example.com".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn excluded_zones_are_skipped() {
        let excluded = vec!["internal.example.com".to_string()];
        let map = Route53Records::fetch(&sample_client(), &excluded)
            .await
            .unwrap();

        let instance = Ec2Instance {
            ip_address: "1.2.3.4".to_string(),
            ..Default::default()
        };
        assert_eq!(map.names_for(&instance), vec!["web.example.com".to_string()]);
    }

    #[tokio::test]
    async fn unknown_address_yields_no_names() {
        let map = Route53Records::fetch(&sample_client(), &[]).await.unwrap();

        let instance = Ec2Instance {
            ip_address: "9.9.9.9".to_string(),
            ..Default::default()
        };
        assert!(map.names_for(&instance).is_empty());
    }
}
