//! Host variable flattening
//!
//! Turns one instance record into the flat `ec2_*` variable map the
//! automation tool expects for a single host. The flatten is best-effort by
//! design: attributes with no scalar shape are dropped, not errors.

use super::aggregator::to_safe;
use crate::aws::records::{AttrValue, Ec2Instance};
use serde_json::{Map, Value};

/// Flattens the instance's attributes into `ec2_*`-prefixed variables.
///
/// Integers and booleans pass through, strings are trimmed, absent
/// optionals become empty strings, the region reduces to its name, tags
/// expand to one `ec2_tag_<key>` variable each, and security groups reduce
/// to two comma-joined lists.
pub fn flatten(instance: &Ec2Instance, region: &str) -> Map<String, Value> {
    let mut vars = Map::new();

    for (name, value) in instance.host_attributes(region) {
        let key = to_safe(&format!("ec2_{name}"));
        match value {
            AttrValue::Int(n) => {
                vars.insert(key, Value::from(n));
            }
            AttrValue::Bool(b) => {
                vars.insert(key, Value::from(b));
            }
            AttrValue::Str(s) => {
                vars.insert(key, Value::from(s.trim()));
            }
            AttrValue::Null => {
                vars.insert(key, Value::from(""));
            }
            AttrValue::Region(name) => {
                vars.insert(key, Value::from(name));
            }
            AttrValue::Tags(tags) => {
                for (k, v) in tags {
                    vars.insert(to_safe(&format!("ec2_tag_{k}")), Value::from(v));
                }
            }
            AttrValue::Groups(groups) => {
                let ids: Vec<&str> = groups.iter().map(|g| g.id.as_str()).collect();
                let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
                vars.insert(
                    "ec2_security_group_ids".to_string(),
                    Value::from(ids.join(",")),
                );
                vars.insert(
                    "ec2_security_group_names".to_string(),
                    Value::from(names.join(",")),
                );
            }
            // The explicit terminal case of the best-effort flatten.
            AttrValue::Unsupported => {}
        }
    }

    vars
}
