//! Kinds of cloud resources tracked by the janitor
//!
//! The canonical names are the upper-case strings persisted in the
//! `resourceType` column, shared with existing deployments.

use std::fmt;
use std::str::FromStr;

/// Types of cloud resources the janitor can track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// EC2 instance
    Instance,
    /// EBS volume (detachable block storage)
    EbsVolume,
    /// EBS snapshot
    EbsSnapshot,
    /// Auto scaling group
    AutoScalingGroup,
    /// Launch configuration
    LaunchConfig,
    /// S3 bucket
    S3Bucket,
    /// Security group
    SecurityGroup,
    /// Machine image
    Image,
    /// Elastic load balancer
    Elb,
}

impl ResourceKind {
    /// All known kinds, in declaration order
    pub const ALL: [ResourceKind; 9] = [
        ResourceKind::Instance,
        ResourceKind::EbsVolume,
        ResourceKind::EbsSnapshot,
        ResourceKind::AutoScalingGroup,
        ResourceKind::LaunchConfig,
        ResourceKind::S3Bucket,
        ResourceKind::SecurityGroup,
        ResourceKind::Image,
        ResourceKind::Elb,
    ];

    /// Stored name of this kind
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Instance => "INSTANCE",
            ResourceKind::EbsVolume => "EBS_VOLUME",
            ResourceKind::EbsSnapshot => "EBS_SNAPSHOT",
            ResourceKind::AutoScalingGroup => "AUTO_SCALING_GROUP",
            ResourceKind::LaunchConfig => "LAUNCH_CONFIG",
            ResourceKind::S3Bucket => "S3_BUCKET",
            ResourceKind::SecurityGroup => "SECURITY_GROUP",
            ResourceKind::Image => "IMAGE",
            ResourceKind::Elb => "ELB",
        }
    }

    /// Parse a stored name. Matching is exact; unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown resource type: {s}"))
    }
}
