//! Composition of the items service: one table, one function per operation,
//! and the REST API routing to them.

use std::collections::BTreeMap;

use serde_json::json;
use tracing::{debug, info};

use items_core::config::{DEFAULT_PRIMARY_KEY, PRIMARY_KEY_VAR, TABLE_NAME_VAR};
use items_core::{Operation, ROUTES};

use crate::api::{ApiResource, Integration, MethodOptions, RestApi};
use crate::cors::add_cors_options;
use crate::error::StackError;
use crate::function::{Architecture, Code, Function, FunctionProps};
use crate::intrinsics::reference;
use crate::table::{Attribute, Table, TableProps};
use crate::template::{Parameter, RemovalPolicy, Template};

pub const TABLE_ID: &str = "items";
pub const API_ID: &str = "itemsApi";
pub const ASSETS_BUCKET_PARAMETER: &str = "AssetsBucket";

const DESCRIPTION: &str = "Items REST API backed by one Lambda function per operation and a DynamoDB table";

/// Deployment knobs. Defaults reproduce the reference deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackConfig {
    pub stack_name: String,
    pub table_name: String,
    pub api_name: String,
    pub stage_name: String,
    pub architecture: Architecture,
    pub memory_size: u32,
    pub timeout_secs: u32,
    /// Prepended to `<binary>/bootstrap.zip` to form each code key.
    pub asset_prefix: String,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            stack_name: "ApiLambdaCrudDynamoDBExample".to_string(),
            table_name: "items".to_string(),
            api_name: "Items Service".to_string(),
            stage_name: "prod".to_string(),
            architecture: Architecture::Arm64,
            memory_size: 128,
            timeout_secs: 10,
            asset_prefix: String::new(),
        }
    }
}

impl StackConfig {
    pub fn code_key(&self, operation: Operation) -> String {
        format!("{}{}/bootstrap.zip", self.asset_prefix, operation.binary_name())
    }
}

/// A named template.
#[derive(Debug, Clone, PartialEq)]
pub struct Stack {
    name: String,
    template: Template,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: Template::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn template_mut(&mut self) -> &mut Template {
        &mut self.template
    }
}

/// Build the whole stack described by `config`.
pub fn compose(config: &StackConfig) -> Result<Stack, StackError> {
    let mut stack = Stack::new(&config.stack_name);
    let template = stack.template_mut();
    template.set_description(DESCRIPTION);
    template.add_parameter(
        ASSETS_BUCKET_PARAMETER,
        Parameter::string("S3 bucket holding each function's bootstrap.zip"),
    )?;

    let table_props = TableProps {
        table_name: Some(config.table_name.clone()),
        removal_policy: RemovalPolicy::Destroy,
        ..TableProps::new(Attribute::string(DEFAULT_PRIMARY_KEY))
    };
    let table = Table::declare(template, TABLE_ID, &table_props)?;

    let props = FunctionProps {
        memory_size: config.memory_size,
        timeout_secs: config.timeout_secs,
        ..FunctionProps::new(config.architecture)
    }
    .env(PRIMARY_KEY_VAR, json!(DEFAULT_PRIMARY_KEY))
    .env(TABLE_NAME_VAR, table.table_name());

    let mut functions = BTreeMap::new();
    for operation in Operation::ALL {
        let code = Code {
            s3_bucket: reference(ASSETS_BUCKET_PARAMETER),
            s3_key: config.code_key(operation),
        };
        let function = Function::declare(template, operation.construct_id(), &props, code)?;
        table.grant_read_write_data(template, &function)?;
        functions.insert(operation, function);
    }

    let api = RestApi::declare(template, API_ID, &config.api_name)?;
    let mut resources = Vec::new();
    for route in ROUTES {
        let resource = resource_for(template, &api, &mut resources, route.path)?;
        let function = functions
            .get(&route.operation)
            .ok_or_else(|| StackError::UnknownResource(route.operation.construct_id().to_string()))?;
        let method = resource.add_method(
            template,
            route.method,
            Integration::lambda(function),
            MethodOptions::default(),
        )?;
        debug!(%method, path = route.path, operation = %route.operation, "routed");
    }

    for resource in &resources {
        add_cors_options(template, resource)?;
    }

    let stage = api.deploy(template, &config.stage_name)?;
    info!(
        stack = %config.stack_name,
        resources = template.resources().len(),
        %stage,
        "stack composed"
    );
    Ok(stack)
}

/// Find or declare the resource node for `path`, declaring missing
/// ancestors along the way. `resources` keeps every node below the root in
/// creation order.
fn resource_for(
    template: &mut Template,
    api: &RestApi,
    resources: &mut Vec<ApiResource>,
    path: &str,
) -> Result<ApiResource, StackError> {
    let mut node = api.root();
    for part in path.split('/').filter(|part| !part.is_empty()) {
        let child_path = match node.path() {
            "/" => format!("/{part}"),
            parent => format!("{parent}/{part}"),
        };
        node = match resources.iter().find(|r| r.path() == child_path) {
            Some(existing) => existing.clone(),
            None => {
                let created = node.add_resource(template, part)?;
                resources.push(created.clone());
                created
            }
        };
    }
    Ok(node)
}
