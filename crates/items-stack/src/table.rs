use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::StackError;
use crate::function::Function;
use crate::iam::{PolicyStatement, TABLE_READ_WRITE_ACTIONS};
use crate::intrinsics::{get_att, reference};
use crate::template::{RemovalPolicy, Resource, Template};

pub const TABLE_TYPE: &str = "AWS::DynamoDB::Table";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttributeType {
    #[serde(rename = "S")]
    String,
    #[serde(rename = "N")]
    Number,
    #[serde(rename = "B")]
    Binary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub attribute_type: AttributeType,
}

impl Attribute {
    pub fn string(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attribute_type: AttributeType::String,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableProps {
    pub table_name: Option<String>,
    pub partition_key: Attribute,
    pub removal_policy: RemovalPolicy,
    pub read_capacity: u32,
    pub write_capacity: u32,
}

impl TableProps {
    /// Provisioned 5/5 and retained on removal unless told otherwise.
    pub fn new(partition_key: Attribute) -> Self {
        Self {
            table_name: None,
            partition_key,
            removal_policy: RemovalPolicy::Retain,
            read_capacity: 5,
            write_capacity: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    logical_id: String,
}

impl Table {
    pub fn declare(template: &mut Template, id: &str, props: &TableProps) -> Result<Self, StackError> {
        let mut properties = json!({
            "AttributeDefinitions": [{
                "AttributeName": props.partition_key.name,
                "AttributeType": props.partition_key.attribute_type
            }],
            "KeySchema": [{
                "AttributeName": props.partition_key.name,
                "KeyType": "HASH"
            }],
            "ProvisionedThroughput": {
                "ReadCapacityUnits": props.read_capacity,
                "WriteCapacityUnits": props.write_capacity
            }
        });
        if let Some(name) = &props.table_name {
            properties["TableName"] = json!(name);
        }

        let resource = Resource::new(TABLE_TYPE, properties).with_removal_policy(props.removal_policy);
        template.add_resource(id, resource)?;
        Ok(Self {
            logical_id: id.to_string(),
        })
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// Resolves to the physical table name.
    pub fn table_name(&self) -> Value {
        reference(&self.logical_id)
    }

    pub fn table_arn(&self) -> Value {
        get_att(&self.logical_id, "Arn")
    }

    /// Allow `function` every data-plane read and write on this table. The
    /// function is ordered after the policy carrying the grant.
    pub fn grant_read_write_data(
        &self,
        template: &mut Template,
        function: &Function,
    ) -> Result<(), StackError> {
        let statement = PolicyStatement::allow(TABLE_READ_WRITE_ACTIONS, vec![self.table_arn()]);
        let policy_id = function.role().add_to_policy(template, statement)?;
        function.add_dependency(template, &policy_id)?;
        debug!(table = %self.logical_id, function = function.logical_id(), "granted read-write data");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::function::{Architecture, Code, FunctionProps};

    use super::*;

    fn items_table(template: &mut Template) -> Table {
        let props = TableProps {
            table_name: Some("items".to_string()),
            removal_policy: RemovalPolicy::Destroy,
            ..TableProps::new(Attribute::string("itemId"))
        };
        Table::declare(template, "items", &props).unwrap()
    }

    #[test]
    fn declares_string_hash_key_table() {
        let mut template = Template::new();
        items_table(&mut template);

        let resource = template.resource("items").unwrap();
        assert_eq!(resource.resource_type, TABLE_TYPE);
        assert_eq!(resource.deletion_policy, Some(RemovalPolicy::Destroy));
        assert_eq!(resource.update_replace_policy, Some(RemovalPolicy::Destroy));
        assert_eq!(
            resource.properties,
            json!({
                "AttributeDefinitions": [{"AttributeName": "itemId", "AttributeType": "S"}],
                "KeySchema": [{"AttributeName": "itemId", "KeyType": "HASH"}],
                "ProvisionedThroughput": {"ReadCapacityUnits": 5, "WriteCapacityUnits": 5},
                "TableName": "items"
            })
        );
    }

    #[test]
    fn retained_by_default() {
        let mut template = Template::new();
        Table::declare(&mut template, "t", &TableProps::new(Attribute::string("pk"))).unwrap();
        let resource = template.resource("t").unwrap();
        assert_eq!(resource.deletion_policy, Some(RemovalPolicy::Retain));
        assert!(resource.properties.get("TableName").is_none());
    }

    #[test]
    fn grant_adds_statement_and_dependency() {
        let mut template = Template::new();
        let table = items_table(&mut template);
        let code = Code {
            s3_bucket: json!("bucket"),
            s3_key: "create/bootstrap.zip".to_string(),
        };
        let function = Function::declare(
            &mut template,
            "createItemFunction",
            &FunctionProps::new(Architecture::Arm64),
            code,
        )
        .unwrap();

        table.grant_read_write_data(&mut template, &function).unwrap();

        let policy = template
            .resource("createItemFunctionServiceRoleDefaultPolicy")
            .unwrap();
        let statement = &policy.properties["PolicyDocument"]["Statement"][0];
        assert_eq!(statement["Effect"], "Allow");
        assert_eq!(statement["Resource"][0], json!({"Fn::GetAtt": ["items", "Arn"]}));
        let actions = statement["Action"].as_array().unwrap();
        for action in ["dynamodb:GetItem", "dynamodb:Scan", "dynamodb:PutItem", "dynamodb:UpdateItem", "dynamodb:DeleteItem"] {
            assert!(actions.contains(&json!(action)), "missing {action}");
        }

        let function = template.resource("createItemFunction").unwrap();
        assert!(function.depends_on.contains("createItemFunctionServiceRoleDefaultPolicy"));
    }
}
