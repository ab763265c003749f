use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::Value;

use crate::error::StackError;

pub const FORMAT_VERSION: &str = "2010-09-09";

const MAX_LOGICAL_ID_LEN: usize = 255;

/// Derive a logical id from construct path components by keeping only their
/// ASCII alphanumeric characters.
///
/// `["itemsApi", "{id}", "GET"]` becomes `itemsApiidGET`.
pub fn logical_id(parts: &[&str]) -> Result<String, StackError> {
    let id: String = parts
        .iter()
        .flat_map(|part| part.chars())
        .filter(char::is_ascii_alphanumeric)
        .collect();

    if id.is_empty() || id.len() > MAX_LOGICAL_ID_LEN {
        return Err(StackError::InvalidLogicalId(parts.join("/")));
    }
    Ok(id)
}

/// What happens to a resource when it leaves the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RemovalPolicy {
    #[serde(rename = "Delete")]
    Destroy,
    Retain,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub resource_type: String,
    pub properties: Value,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub depends_on: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<RemovalPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<RemovalPolicy>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, properties: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            properties,
            depends_on: BTreeSet::new(),
            deletion_policy: None,
            update_replace_policy: None,
        }
    }

    pub fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        self.depends_on.insert(logical_id.into());
        self
    }

    /// Apply `policy` to both deletion and replacement.
    pub fn with_removal_policy(mut self, policy: RemovalPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self.update_replace_policy = Some(policy);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    #[serde(rename = "Type")]
    pub parameter_type: String,
    pub description: String,
}

impl Parameter {
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            parameter_type: "String".to_string(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A CloudFormation template. Every section is an ordered map, so the same
/// composition always serializes to the same bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    format_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    parameters: BTreeMap<String, Parameter>,
    resources: BTreeMap<String, Resource>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    outputs: BTreeMap<String, Output>,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            description: None,
            parameters: BTreeMap::new(),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    /// Parameters and resources share one logical-id namespace.
    fn ensure_free(&self, id: &str) -> Result<(), StackError> {
        if self.resources.contains_key(id) || self.parameters.contains_key(id) {
            return Err(StackError::DuplicateLogicalId(id.to_string()));
        }
        Ok(())
    }

    pub fn add_resource(&mut self, id: &str, resource: Resource) -> Result<(), StackError> {
        self.ensure_free(id)?;
        self.resources.insert(id.to_string(), resource);
        Ok(())
    }

    pub fn add_parameter(&mut self, id: &str, parameter: Parameter) -> Result<(), StackError> {
        self.ensure_free(id)?;
        self.parameters.insert(id.to_string(), parameter);
        Ok(())
    }

    pub fn add_output(&mut self, id: &str, output: Output) -> Result<(), StackError> {
        if self.outputs.contains_key(id) {
            return Err(StackError::DuplicateLogicalId(id.to_string()));
        }
        self.outputs.insert(id.to_string(), output);
        Ok(())
    }

    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn resource_mut(&mut self, id: &str) -> Result<&mut Resource, StackError> {
        self.resources
            .get_mut(id)
            .ok_or_else(|| StackError::UnknownResource(id.to_string()))
    }

    pub fn resources(&self) -> &BTreeMap<String, Resource> {
        &self.resources
    }

    /// Resources of one CloudFormation type, in logical-id order.
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a Resource)> + 'a {
        self.resources
            .iter()
            .filter(move |(_, r)| r.resource_type == resource_type)
    }

    pub fn parameters(&self) -> &BTreeMap<String, Parameter> {
        &self.parameters
    }

    pub fn outputs(&self) -> &BTreeMap<String, Output> {
        &self.outputs
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, StackError> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}
