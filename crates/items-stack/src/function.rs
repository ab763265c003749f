use std::collections::BTreeMap;

use clap::ValueEnum;
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::StackError;
use crate::iam::Role;
use crate::intrinsics::get_att;
use crate::template::{Resource, Template};

pub const FUNCTION_TYPE: &str = "AWS::Lambda::Function";

/// Handler name of custom-runtime functions: the packaged executable.
pub const BOOTSTRAP_HANDLER: &str = "bootstrap";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Runtime {
    #[serde(rename = "provided.al2023")]
    ProvidedAl2023,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
pub enum Architecture {
    #[serde(rename = "arm64")]
    Arm64,
    #[serde(rename = "x86_64")]
    #[value(name = "x86-64")]
    X86_64,
}

/// Where the deployment package lives.
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    pub s3_bucket: Value,
    pub s3_key: String,
}

/// Settings shared by every function of the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionProps {
    pub runtime: Runtime,
    pub architecture: Architecture,
    pub handler: String,
    pub memory_size: u32,
    pub timeout_secs: u32,
    pub environment: BTreeMap<String, Value>,
}

impl FunctionProps {
    pub fn new(architecture: Architecture) -> Self {
        Self {
            runtime: Runtime::ProvidedAl2023,
            architecture,
            handler: BOOTSTRAP_HANDLER.to_string(),
            memory_size: 128,
            timeout_secs: 3,
            environment: BTreeMap::new(),
        }
    }

    pub fn env(mut self, name: &str, value: Value) -> Self {
        self.environment.insert(name.to_string(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    logical_id: String,
    role: Role,
}

impl Function {
    /// Declare the function `id` with its own execution role.
    pub fn declare(
        template: &mut Template,
        id: &str,
        props: &FunctionProps,
        code: Code,
    ) -> Result<Self, StackError> {
        let role = Role::for_lambda(template, id)?;

        let properties = json!({
            "Architectures": [props.architecture],
            "Code": {
                "S3Bucket": code.s3_bucket,
                "S3Key": code.s3_key
            },
            "Environment": { "Variables": props.environment },
            "Handler": props.handler,
            "MemorySize": props.memory_size,
            "Role": role.arn(),
            "Runtime": props.runtime,
            "Timeout": props.timeout_secs
        });
        let resource = Resource::new(FUNCTION_TYPE, properties).depends_on(role.logical_id());
        template.add_resource(id, resource)?;

        Ok(Self {
            logical_id: id.to_string(),
            role,
        })
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn arn(&self) -> Value {
        get_att(&self.logical_id, "Arn")
    }

    /// Order this function after `logical_id` on deployment.
    pub fn add_dependency(&self, template: &mut Template, logical_id: &str) -> Result<(), StackError> {
        template
            .resource_mut(&self.logical_id)?
            .depends_on
            .insert(logical_id.to_string());
        Ok(())
    }
}
