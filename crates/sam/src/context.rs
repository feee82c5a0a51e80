use serde::{Deserialize, Serialize};

/// Deployment values substituted for pseudo-parameters during expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct TransformContext {
    pub region: String,
    pub account_id: String,
    pub stack_name: String,
    pub partition: String,
}

impl Default for TransformContext {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            account_id: "123456789012".to_string(),
            stack_name: "sam-app".to_string(),
            partition: "aws".to_string(),
        }
    }
}

impl TransformContext {
    /// The value substituted for a pseudo-parameter, if it is one we know.
    #[must_use]
    pub fn pseudo_value(&self, name: &str) -> Option<&str> {
        match name {
            "AWS::Region" => Some(&self.region),
            "AWS::AccountId" => Some(&self.account_id),
            "AWS::StackName" => Some(&self.stack_name),
            "AWS::Partition" => Some(&self.partition),
            _ => None,
        }
    }
}
