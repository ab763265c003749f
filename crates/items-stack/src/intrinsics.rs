//! CloudFormation intrinsic functions and pseudo parameters.

use serde_json::{Value, json};

pub const PARTITION: &str = "AWS::Partition";
pub const REGION: &str = "AWS::Region";
pub const ACCOUNT_ID: &str = "AWS::AccountId";
pub const URL_SUFFIX: &str = "AWS::URLSuffix";

/// `{"Ref": id}`
pub fn reference(id: &str) -> Value {
    json!({ "Ref": id })
}

/// `{"Fn::GetAtt": [id, attribute]}`
pub fn get_att(id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [id, attribute] })
}

/// `{"Fn::Join": [separator, parts]}`
pub fn join(separator: &str, parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": [separator, parts] })
}
