//! Typed resource records returned by the AWS adapter.
//!
//! The inventory engine only ever sees these structs; the raw SDK types stay
//! inside [`client`](super::client). Fields the API may omit entirely are
//! `Option` so callers can tell "absent from the response" apart from
//! "present but empty" — the aggregator treats the former as an incompatible
//! API response and aborts the run.

use std::collections::BTreeMap;

/// A security group attached to an instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecurityGroupRef {
    pub id: String,
    pub name: String,
}

/// One EC2 instance, reduced to the attributes the inventory cares about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ec2Instance {
    pub id: String,
    /// Lowercase state name, e.g. "running".
    pub state: String,
    /// Availability zone.
    pub placement: String,
    pub instance_type: String,
    pub key_name: Option<String>,
    pub subnet_id: Option<String>,
    pub vpc_id: Option<String>,
    pub public_dns_name: String,
    pub private_dns_name: String,
    /// Public IP address.
    pub ip_address: String,
    pub private_ip_address: String,
    /// `None` means the response carried no security-group field at all.
    pub security_groups: Option<Vec<SecurityGroupRef>>,
    pub tags: BTreeMap<String, String>,

    // Detail attributes, surfaced only by host lookup.
    pub architecture: Option<String>,
    pub image_id: Option<String>,
    pub launch_time: Option<String>,
    pub platform: Option<String>,
    pub ami_launch_index: Option<i64>,
    pub ebs_optimized: Option<bool>,
    pub source_dest_check: Option<bool>,
    pub root_device_name: Option<String>,
    pub root_device_type: Option<String>,
    pub virtualization_type: Option<String>,
    pub hypervisor: Option<String>,
    pub client_token: Option<String>,
}

/// One RDS database instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RdsInstance {
    pub id: String,
    /// Lowercase status, e.g. "available".
    pub status: String,
    pub availability_zone: String,
    pub instance_class: String,
    pub engine: String,
    pub endpoint_address: String,
    /// Security group names; `None` means the field was absent entirely.
    pub security_groups: Option<Vec<String>>,
    pub parameter_group: Option<String>,
}

/// A Route 53 hosted zone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostedZone {
    pub id: String,
    /// Zone name as returned by the API, usually with a trailing dot.
    pub name: String,
}

/// A record set within a hosted zone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    pub name: String,
    /// The resource record values, e.g. the addresses an A record points at.
    pub records: Vec<String>,
}

/// A single host-detail attribute, tagged by how it flattens.
///
/// `Unsupported` is the explicit terminal case: attributes the API returns
/// but host output drops, because they have no scalar shape.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Int(i64),
    Bool(bool),
    Str(String),
    Null,
    Region(String),
    Tags(BTreeMap<String, String>),
    Groups(Vec<SecurityGroupRef>),
    Unsupported,
}

impl Ec2Instance {
    /// Resolve one of the four addressable attributes by its configured name.
    pub fn address_attr(&self, name: &str) -> Option<&str> {
        match name {
            "public_dns_name" => Some(&self.public_dns_name),
            "private_dns_name" => Some(&self.private_dns_name),
            "ip_address" => Some(&self.ip_address),
            "private_ip_address" => Some(&self.private_ip_address),
            _ => None,
        }
    }

    /// Every attribute exposed by host lookup, in declaration order.
    pub fn host_attributes(&self, region: &str) -> Vec<(&'static str, AttrValue)> {
        fn opt_str(value: &Option<String>) -> AttrValue {
            match value {
                Some(s) => AttrValue::Str(s.clone()),
                None => AttrValue::Null,
            }
        }
        fn opt_int(value: Option<i64>) -> AttrValue {
            match value {
                Some(n) => AttrValue::Int(n),
                None => AttrValue::Null,
            }
        }
        fn opt_bool(value: Option<bool>) -> AttrValue {
            match value {
                Some(b) => AttrValue::Bool(b),
                None => AttrValue::Null,
            }
        }

        let groups = match &self.security_groups {
            Some(groups) => AttrValue::Groups(groups.clone()),
            None => AttrValue::Null,
        };

        vec![
            ("id", AttrValue::Str(self.id.clone())),
            ("region", AttrValue::Region(region.to_string())),
            ("state", AttrValue::Str(self.state.clone())),
            ("placement", AttrValue::Str(self.placement.clone())),
            ("instance_type", AttrValue::Str(self.instance_type.clone())),
            ("architecture", opt_str(&self.architecture)),
            ("image_id", opt_str(&self.image_id)),
            ("key_name", opt_str(&self.key_name)),
            ("launch_time", opt_str(&self.launch_time)),
            ("platform", opt_str(&self.platform)),
            ("subnet_id", opt_str(&self.subnet_id)),
            ("vpc_id", opt_str(&self.vpc_id)),
            ("public_dns_name", AttrValue::Str(self.public_dns_name.clone())),
            ("private_dns_name", AttrValue::Str(self.private_dns_name.clone())),
            ("ip_address", AttrValue::Str(self.ip_address.clone())),
            ("private_ip_address", AttrValue::Str(self.private_ip_address.clone())),
            ("ami_launch_index", opt_int(self.ami_launch_index)),
            ("ebs_optimized", opt_bool(self.ebs_optimized)),
            ("source_dest_check", opt_bool(self.source_dest_check)),
            ("root_device_name", opt_str(&self.root_device_name)),
            ("root_device_type", opt_str(&self.root_device_type)),
            ("virtualization_type", opt_str(&self.virtualization_type)),
            ("hypervisor", opt_str(&self.hypervisor)),
            ("client_token", opt_str(&self.client_token)),
            ("tags", AttrValue::Tags(self.tags.clone())),
            ("groups", groups),
            // On the wire but with no scalar shape; host output drops them.
            ("block_device_mapping", AttrValue::Unsupported),
            ("interfaces", AttrValue::Unsupported),
            ("state_reason", AttrValue::Unsupported),
        ]
    }
}
