//! Shared AWS configuration context.
//!
//! Loads the SDK configuration once and hands out per-region service
//! clients, so region fan-out does not re-read credentials for every call.

use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Holds the loaded SDK config and builds service clients from it.
#[derive(Clone)]
pub struct AwsContext {
    config: SdkConfig,
}

impl AwsContext {
    /// Load credentials, profile and shared settings from the environment.
    pub async fn new() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self { config }
    }

    /// EC2 client bound to the given region.
    pub fn ec2_client(&self, region: &str) -> aws_sdk_ec2::Client {
        let conf = aws_sdk_ec2::config::Builder::from(&self.config)
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_ec2::Client::from_conf(conf)
    }

    /// RDS client bound to the given region.
    pub fn rds_client(&self, region: &str) -> aws_sdk_rds::Client {
        let conf = aws_sdk_rds::config::Builder::from(&self.config)
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_rds::Client::from_conf(conf)
    }

    /// Route 53 is a global service; the signing config still wants a region.
    pub fn route53_client(&self) -> aws_sdk_route53::Client {
        let conf = aws_sdk_route53::config::Builder::from(&self.config)
            .region(Region::new("us-east-1"))
            .build();
        aws_sdk_route53::Client::from_conf(conf)
    }
}

impl std::fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsContext").finish_non_exhaustive()
    }
}
