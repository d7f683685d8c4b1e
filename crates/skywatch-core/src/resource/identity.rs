//! Resource types and identities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;
use std::str::FromStr;

/// Kind of cloud resource a panel targets.
///
/// The type picks the metric namespace and dimension name used when a
/// panel does not spell them out. `Other` names compare without regard to
/// ASCII case but keep their spelling for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResourceType {
    Ec2,
    Rds,
    Lambda,
    Ecs,
    Eks,
    ApiGateway,
    Nlb,
    StepFunctions,
    Other(String),
}

impl ResourceType {
    /// Default metric namespace for this resource type
    pub fn default_namespace(&self) -> String {
        match self {
            Self::Ec2 => "AWS/EC2".to_string(),
            Self::Rds => "AWS/RDS".to_string(),
            Self::Lambda => "LambdaInsights".to_string(),
            Self::Ecs | Self::Eks => "ContainerInsights".to_string(),
            Self::ApiGateway => "AWS/ApiGateway".to_string(),
            Self::Nlb => "AWS/NetworkELB".to_string(),
            Self::StepFunctions => "AWS/States".to_string(),
            Self::Other(name) => format!("AWS/{}", name),
        }
    }

    /// Default dimension name identifying a single resource
    pub fn default_dimension(&self) -> &str {
        match self {
            Self::Ec2 => "InstanceId",
            Self::Rds => "DBInstanceIdentifier",
            Self::Lambda => "FunctionName",
            Self::Ecs | Self::Eks => "ClusterName",
            Self::ApiGateway => "ApiName",
            Self::Nlb => "LoadBalancer",
            Self::StepFunctions => "StateMachineArn",
            Self::Other(_) => "Name",
        }
    }

    /// Canonical short name, e.g. `EC2`
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ec2 => "EC2",
            Self::Rds => "RDS",
            Self::Lambda => "Lambda",
            Self::Ecs => "ECS",
            Self::Eks => "EKS",
            Self::ApiGateway => "ApiGateway",
            Self::Nlb => "NLB",
            Self::StepFunctions => "States",
            Self::Other(name) => name,
        }
    }
}

impl FromStr for ResourceType {
    type Err = String;

    /// Accepts both bare (`EC2`) and namespaced (`AWS/EC2`) spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bare = match trimmed.get(..4) {
            Some(prefix) if prefix.eq_ignore_ascii_case("aws/") => &trimmed[4..],
            _ => trimmed,
        };
        if bare.is_empty() {
            return Err("resource type must not be empty".to_string());
        }

        Ok(match bare.to_ascii_lowercase().as_str() {
            "ec2" => Self::Ec2,
            "rds" => Self::Rds,
            "lambda" => Self::Lambda,
            "ecs" => Self::Ecs,
            "eks" => Self::Eks,
            "apigateway" | "api_gateway" => Self::ApiGateway,
            "nlb" | "networkelb" => Self::Nlb,
            "states" | "stepfunctions" | "step_functions" => Self::StepFunctions,
            _ => Self::Other(bare.to_string()),
        })
    }
}

impl PartialEq for ResourceType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Other(a), Self::Other(b)) => a.eq_ignore_ascii_case(b),
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }
}

impl Eq for ResourceType {}

impl Hash for ResourceType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        if let Self::Other(name) = self {
            name.to_ascii_lowercase().hash(state);
        }
    }
}

impl TryFrom<String> for ResourceType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceType> for String {
    fn from(value: ResourceType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A concrete resource: an opaque id plus its type.
///
/// The id is whatever the backend dimension expects: an instance id, a
/// function name, a load balancer ARN suffix and so on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentity {
    pub id: String,
    pub resource_type: ResourceType,
}

impl ResourceIdentity {
    pub fn new(id: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            id: id.into(),
            resource_type,
        }
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource_type, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_and_namespaced() {
        assert_eq!("EC2".parse::<ResourceType>().unwrap(), ResourceType::Ec2);
        assert_eq!("AWS/EC2".parse::<ResourceType>().unwrap(), ResourceType::Ec2);
        assert_eq!("aws/rds".parse::<ResourceType>().unwrap(), ResourceType::Rds);
        assert_eq!(
            "AWS/DynamoDB".parse::<ResourceType>().unwrap(),
            ResourceType::Other("DynamoDB".to_string())
        );
        assert!("".parse::<ResourceType>().is_err());
    }

    #[test]
    fn test_prefix_is_case_insensitive() {
        assert_eq!("Aws/EC2".parse::<ResourceType>().unwrap(), ResourceType::Ec2);
        assert_eq!(" aWs/lambda ".parse::<ResourceType>().unwrap(), ResourceType::Lambda);
        assert_eq!(
            "Aws/Kafka".parse::<ResourceType>().unwrap(),
            ResourceType::Other("Kafka".to_string())
        );
        assert!("aws/".parse::<ResourceType>().is_err());
    }

    #[test]
    fn test_other_ignores_case_but_keeps_spelling() {
        use std::collections::HashSet;

        let upper: ResourceType = "Kafka".parse().unwrap();
        let lower: ResourceType = "kafka".parse().unwrap();
        assert_eq!(upper, lower);
        assert_ne!(upper, ResourceType::Other("Kinesis".to_string()));
        assert_eq!(upper.to_string(), "Kafka");
        assert_eq!(upper.default_namespace(), "AWS/Kafka");

        let set: HashSet<ResourceType> = [upper, lower].into_iter().collect();
        assert_eq!(set.len(), 1);

        let a = ResourceIdentity::new("broker-1", "Kafka".parse().unwrap());
        let b = ResourceIdentity::new("broker-1", "KAFKA".parse().unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn test_defaults_per_type() {
        assert_eq!(ResourceType::Ec2.default_namespace(), "AWS/EC2");
        assert_eq!(ResourceType::Ec2.default_dimension(), "InstanceId");
        assert_eq!(ResourceType::Lambda.default_namespace(), "LambdaInsights");
        assert_eq!(ResourceType::Lambda.default_dimension(), "FunctionName");
        assert_eq!(
            ResourceType::Other("DynamoDB".into()).default_namespace(),
            "AWS/DynamoDB"
        );
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&ResourceType::ApiGateway).unwrap();
        assert_eq!(json, "\"ApiGateway\"");
        let parsed: ResourceType = serde_json::from_str("\"AWS/NetworkELB\"").unwrap();
        assert_eq!(parsed, ResourceType::Nlb);
    }
}
