use std::collections::BTreeMap;

use items_core::Method;
use items_core::cors::{MOCK_REQUEST_TEMPLATE, PREFLIGHT_HEADERS, PREFLIGHT_STATUS};

use crate::api::{
    ApiResource, Integration, IntegrationResponse, MethodOptions, MethodResponse, MockIntegration,
    PassthroughBehavior,
};
use crate::error::StackError;
use crate::template::Template;

const JSON_CONTENT_TYPE: &str = "application/json";

fn header_parameter(name: &str) -> String {
    format!("method.response.header.{name}")
}

/// Answer preflight requests on `resource` with a mock integration.
/// Returns the OPTIONS method's logical id.
pub fn add_cors_options(template: &mut Template, resource: &ApiResource) -> Result<String, StackError> {
    let status = PREFLIGHT_STATUS.to_string();

    let integration = MockIntegration {
        integration_responses: vec![IntegrationResponse {
            status_code: status.clone(),
            response_parameters: PREFLIGHT_HEADERS
                .iter()
                .map(|(name, value)| (header_parameter(name), format!("'{value}'")))
                .collect(),
        }],
        passthrough_behavior: PassthroughBehavior::Never,
        request_templates: BTreeMap::from([(
            JSON_CONTENT_TYPE.to_string(),
            MOCK_REQUEST_TEMPLATE.to_string(),
        )]),
    };
    let options = MethodOptions {
        method_responses: vec![MethodResponse {
            status_code: status,
            response_parameters: PREFLIGHT_HEADERS
                .iter()
                .map(|(name, _)| (header_parameter(name), true))
                .collect(),
        }],
    };

    resource.add_method(template, Method::Options, Integration::Mock(integration), options)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::api::RestApi;

    use super::*;

    #[test]
    fn options_method_is_a_mock_with_quoted_headers() {
        let mut template = Template::new();
        let api = RestApi::declare(&mut template, "itemsApi", "Items Service").unwrap();
        let items = api.root().add_resource(&mut template, "items").unwrap();

        let id = add_cors_options(&mut template, &items).unwrap();
        assert_eq!(id, "itemsApiitemsOPTIONS");

        let method = &template.resource(&id).unwrap().properties;
        assert_eq!(method["HttpMethod"], "OPTIONS");
        assert_eq!(method["AuthorizationType"], "NONE");

        let integration = &method["Integration"];
        assert_eq!(integration["Type"], "MOCK");
        assert_eq!(integration["PassthroughBehavior"], "NEVER");
        assert_eq!(
            integration["RequestTemplates"],
            json!({"application/json": "{\"statusCode\": 200}"})
        );

        let params = &integration["IntegrationResponses"][0]["ResponseParameters"];
        assert_eq!(integration["IntegrationResponses"][0]["StatusCode"], "200");
        assert_eq!(params["method.response.header.Access-Control-Allow-Origin"], "'*'");
        assert_eq!(params["method.response.header.Access-Control-Allow-Credentials"], "'false'");
        assert_eq!(
            params["method.response.header.Access-Control-Allow-Methods"],
            "'OPTIONS,GET,PUT,POST,DELETE'"
        );

        let declared = &method["MethodResponses"][0]["ResponseParameters"];
        assert_eq!(declared.as_object().unwrap().len(), 4);
        assert_eq!(declared["method.response.header.Access-Control-Allow-Headers"], true);
    }

    #[test]
    fn second_preflight_on_same_resource_is_rejected() {
        let mut template = Template::new();
        let api = RestApi::declare(&mut template, "itemsApi", "Items Service").unwrap();
        let items = api.root().add_resource(&mut template, "items").unwrap();

        add_cors_options(&mut template, &items).unwrap();
        let err = add_cors_options(&mut template, &items).unwrap_err();
        assert!(matches!(err, StackError::DuplicateMethod { method: Method::Options, .. }));
    }
}
