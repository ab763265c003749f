//! Execution roles and their inline default policies.

use serde::Serialize;
use serde_json::{Value, json};

use crate::error::StackError;
use crate::intrinsics::{PARTITION, get_att, join, reference};
use crate::template::{Resource, Template, logical_id};

pub const ROLE_TYPE: &str = "AWS::IAM::Role";
pub const POLICY_TYPE: &str = "AWS::IAM::Policy";

const POLICY_VERSION: &str = "2012-10-17";
const LAMBDA_PRINCIPAL: &str = "lambda.amazonaws.com";
const BASIC_EXECUTION_POLICY: &str = ":iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

/// Actions granted by a table's read-write data grant.
pub const TABLE_READ_WRITE_ACTIONS: [&str; 12] = [
    "dynamodb:BatchGetItem",
    "dynamodb:GetRecords",
    "dynamodb:GetShardIterator",
    "dynamodb:Query",
    "dynamodb:GetItem",
    "dynamodb:Scan",
    "dynamodb:ConditionCheckItem",
    "dynamodb:BatchWriteItem",
    "dynamodb:PutItem",
    "dynamodb:UpdateItem",
    "dynamodb:DeleteItem",
    "dynamodb:DescribeTable",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub effect: &'static str,
    pub action: Vec<String>,
    pub resource: Vec<Value>,
}

impl PolicyStatement {
    pub fn allow<'a>(actions: impl IntoIterator<Item = &'a str>, resources: Vec<Value>) -> Self {
        Self {
            effect: "Allow",
            action: actions.into_iter().map(str::to_string).collect(),
            resource: resources,
        }
    }
}

/// A role assumable by Lambda.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    logical_id: String,
}

impl Role {
    /// Declare `<owner>ServiceRole`, carrying the basic execution managed
    /// policy so the function can write its logs.
    pub fn for_lambda(template: &mut Template, owner: &str) -> Result<Self, StackError> {
        let id = logical_id(&[owner, "ServiceRole"])?;
        let properties = json!({
            "AssumeRolePolicyDocument": {
                "Statement": [{
                    "Action": "sts:AssumeRole",
                    "Effect": "Allow",
                    "Principal": { "Service": LAMBDA_PRINCIPAL }
                }],
                "Version": POLICY_VERSION
            },
            "ManagedPolicyArns": [
                join("", vec![json!("arn:"), reference(PARTITION), json!(BASIC_EXECUTION_POLICY)])
            ]
        });
        template.add_resource(&id, Resource::new(ROLE_TYPE, properties))?;
        Ok(Self { logical_id: id })
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn arn(&self) -> Value {
        get_att(&self.logical_id, "Arn")
    }

    pub fn default_policy_id(&self) -> Result<String, StackError> {
        logical_id(&[&self.logical_id, "DefaultPolicy"])
    }

    /// Append `statement` to the role's default policy, creating the policy on
    /// first use. Returns the policy's logical id.
    pub fn add_to_policy(
        &self,
        template: &mut Template,
        statement: PolicyStatement,
    ) -> Result<String, StackError> {
        let policy_id = self.default_policy_id()?;
        let statement = serde_json::to_value(statement)?;

        if template.resource(&policy_id).is_none() {
            let properties = json!({
                "PolicyDocument": {
                    "Statement": [statement],
                    "Version": POLICY_VERSION
                },
                "PolicyName": policy_id,
                "Roles": [reference(&self.logical_id)]
            });
            template.add_resource(&policy_id, Resource::new(POLICY_TYPE, properties))?;
            return Ok(policy_id);
        }

        let policy = template.resource_mut(&policy_id)?;
        policy.properties["PolicyDocument"]["Statement"]
            .as_array_mut()
            .ok_or_else(|| StackError::MalformedResource(policy_id.clone()))?
            .push(statement);
        Ok(policy_id)
    }
}
