//! REST API Gateway constructs: the API, its resource tree, methods,
//! integrations and the deployment.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use items_core::Method;

use crate::error::StackError;
use crate::function::Function;
use crate::intrinsics::{ACCOUNT_ID, PARTITION, REGION, URL_SUFFIX, get_att, join, reference};
use crate::template::{Output, Resource, Template, logical_id};

pub const REST_API_TYPE: &str = "AWS::ApiGateway::RestApi";
pub const RESOURCE_TYPE: &str = "AWS::ApiGateway::Resource";
pub const METHOD_TYPE: &str = "AWS::ApiGateway::Method";
pub const PERMISSION_TYPE: &str = "AWS::Lambda::Permission";
pub const DEPLOYMENT_TYPE: &str = "AWS::ApiGateway::Deployment";
pub const STAGE_TYPE: &str = "AWS::ApiGateway::Stage";

const APIGATEWAY_PRINCIPAL: &str = "apigateway.amazonaws.com";

/// How API Gateway treats request bodies no template matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassthroughBehavior {
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct IntegrationResponse {
    pub status_code: String,
    pub response_parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MethodResponse {
    pub status_code: String,
    pub response_parameters: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodOptions {
    pub method_responses: Vec<MethodResponse>,
}

/// A mock integration answers from API Gateway itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockIntegration {
    pub integration_responses: Vec<IntegrationResponse>,
    pub passthrough_behavior: PassthroughBehavior,
    pub request_templates: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Integration {
    /// Lambda proxy integration. API Gateway always calls Lambda with POST.
    Lambda { function_arn: Value },
    Mock(MockIntegration),
}

impl Integration {
    pub fn lambda(function: &Function) -> Self {
        Integration::Lambda {
            function_arn: function.arn(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Integration::Lambda { function_arn } => json!({
                "IntegrationHttpMethod": "POST",
                "Type": "AWS_PROXY",
                "Uri": join("", vec![
                    json!("arn:"),
                    reference(PARTITION),
                    json!(":apigateway:"),
                    reference(REGION),
                    json!(":lambda:path/2015-03-31/functions/"),
                    function_arn.clone(),
                    json!("/invocations"),
                ])
            }),
            Integration::Mock(mock) => json!({
                "IntegrationResponses": mock.integration_responses,
                "PassthroughBehavior": mock.passthrough_behavior,
                "RequestTemplates": mock.request_templates,
                "Type": "MOCK"
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestApi {
    logical_id: String,
}

impl RestApi {
    pub fn declare(template: &mut Template, id: &str, name: &str) -> Result<Self, StackError> {
        template.add_resource(id, Resource::new(REST_API_TYPE, json!({ "Name": name })))?;
        Ok(Self {
            logical_id: id.to_string(),
        })
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// The implicit `/` resource every REST API starts with.
    pub fn root(&self) -> ApiResource {
        ApiResource {
            api_id: self.logical_id.clone(),
            logical_id: None,
            path: "/".to_string(),
        }
    }

    /// `<api>Deployment<hash>`, where the hash covers every resource and
    /// method of this API. A changed method yields a new deployment, so
    /// CloudFormation redeploys the stage instead of keeping the old one.
    pub fn deployment_id(&self, template: &Template) -> Result<String, StackError> {
        let api_ref = reference(&self.logical_id);
        let mut hasher = Sha256::new();
        for (id, resource) in template.resources().iter().filter(|(_, resource)| {
            (resource.resource_type == RESOURCE_TYPE || resource.resource_type == METHOD_TYPE)
                && resource.properties["RestApiId"] == api_ref
        }) {
            hasher.update(id.as_bytes());
            hasher.update(serde_json::to_vec(resource)?);
        }
        let digest = format!("{:x}", hasher.finalize());
        logical_id(&[&self.logical_id, "Deployment", &digest[..8]])
    }

    /// Deploy every method of this API to `stage` and export the stage URL
    /// as `<api>Endpoint`. Returns the stage's logical id.
    pub fn deploy(&self, template: &mut Template, stage: &str) -> Result<String, StackError> {
        let api_ref = reference(&self.logical_id);
        let methods: Vec<String> = template
            .resources_of_type(METHOD_TYPE)
            .filter(|(_, method)| method.properties["RestApiId"] == api_ref)
            .map(|(id, _)| id.clone())
            .collect();

        let deployment_id = self.deployment_id(template)?;
        let mut deployment = Resource::new(
            DEPLOYMENT_TYPE,
            json!({
                "Description": "Automatically created by the RestApi construct",
                "RestApiId": api_ref.clone()
            }),
        );
        deployment.depends_on.extend(methods);
        template.add_resource(&deployment_id, deployment)?;

        let stage_id = logical_id(&[&self.logical_id, "DeploymentStage", stage])?;
        template.add_resource(
            &stage_id,
            Resource::new(
                STAGE_TYPE,
                json!({
                    "DeploymentId": reference(&deployment_id),
                    "RestApiId": api_ref.clone(),
                    "StageName": stage
                }),
            ),
        )?;

        let output_id = logical_id(&[&self.logical_id, "Endpoint"])?;
        template.add_output(
            &output_id,
            Output {
                value: join("", vec![
                    json!("https://"),
                    api_ref,
                    json!(".execute-api."),
                    reference(REGION),
                    json!("."),
                    reference(URL_SUFFIX),
                    json!("/"),
                    reference(&stage_id),
                    json!("/"),
                ]),
                description: Some("Invoke URL of the deployed stage".to_string()),
            },
        )?;
        Ok(stage_id)
    }
}

/// A node of an API's resource tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResource {
    api_id: String,
    /// `None` for the root.
    logical_id: Option<String>,
    path: String,
}

impl ApiResource {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn logical_id(&self) -> Option<&str> {
        self.logical_id.as_deref()
    }

    fn id_prefix(&self) -> &str {
        self.logical_id.as_deref().unwrap_or(&self.api_id)
    }

    fn resource_ref(&self) -> Value {
        match &self.logical_id {
            Some(id) => reference(id),
            None => get_att(&self.api_id, "RootResourceId"),
        }
    }

    /// Declare the child resource `path_part` below this node.
    pub fn add_resource(&self, template: &mut Template, path_part: &str) -> Result<ApiResource, StackError> {
        let id = logical_id(&[self.id_prefix(), path_part])?;
        template.add_resource(
            &id,
            Resource::new(
                RESOURCE_TYPE,
                json!({
                    "ParentId": self.resource_ref(),
                    "PathPart": path_part,
                    "RestApiId": reference(&self.api_id)
                }),
            ),
        )?;

        let path = match self.path.as_str() {
            "/" => format!("/{path_part}"),
            parent => format!("{parent}/{path_part}"),
        };
        Ok(ApiResource {
            api_id: self.api_id.clone(),
            logical_id: Some(id),
            path,
        })
    }

    /// Declare `method` on this node. Lambda integrations also get the
    /// permission letting API Gateway invoke the function from any stage.
    /// Returns the method's logical id.
    pub fn add_method(
        &self,
        template: &mut Template,
        method: Method,
        integration: Integration,
        options: MethodOptions,
    ) -> Result<String, StackError> {
        let id = logical_id(&[self.id_prefix(), method.as_str()])?;
        if template.resource(&id).is_some() {
            return Err(StackError::DuplicateMethod {
                method,
                path: self.path.clone(),
            });
        }

        let mut properties = json!({
            "AuthorizationType": "NONE",
            "HttpMethod": method.as_str(),
            "Integration": integration.to_json(),
            "ResourceId": self.resource_ref(),
            "RestApiId": reference(&self.api_id)
        });
        if !options.method_responses.is_empty() {
            properties["MethodResponses"] = serde_json::to_value(&options.method_responses)?;
        }
        template.add_resource(&id, Resource::new(METHOD_TYPE, properties))?;

        if let Integration::Lambda { function_arn } = integration {
            self.grant_invoke(template, &id, method, function_arn)?;
        }
        Ok(id)
    }

    fn grant_invoke(
        &self,
        template: &mut Template,
        method_id: &str,
        method: Method,
        function_arn: Value,
    ) -> Result<(), StackError> {
        let id = logical_id(&[method_id, "ApiPermission"])?;
        let source_arn = join("", vec![
            json!("arn:"),
            reference(PARTITION),
            json!(":execute-api:"),
            reference(REGION),
            json!(":"),
            reference(ACCOUNT_ID),
            json!(":"),
            reference(&self.api_id),
            json!(format!("/*/{}{}", method.as_str(), self.path)),
        ]);
        template.add_resource(
            &id,
            Resource::new(
                PERMISSION_TYPE,
                json!({
                    "Action": "lambda:InvokeFunction",
                    "FunctionName": function_arn,
                    "Principal": APIGATEWAY_PRINCIPAL,
                    "SourceArn": source_arn
                }),
            ),
        )
    }
}
