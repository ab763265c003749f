//! Static CORS preflight policy shared by the API Gateway mock integration
//! and the local development server.

pub const ALLOW_HEADERS: &str =
    "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token,X-Amz-User-Agent";
pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_CREDENTIALS: &str = "false";
// PATCH is absent even though `/items/{id}` serves it; kept as deployed.
pub const ALLOW_METHODS: &str = "OPTIONS,GET,PUT,POST,DELETE";

/// Preflight response headers, in the order the mock integration maps them.
pub const PREFLIGHT_HEADERS: [(&str, &str); 4] = [
    ("Access-Control-Allow-Headers", ALLOW_HEADERS),
    ("Access-Control-Allow-Origin", ALLOW_ORIGIN),
    ("Access-Control-Allow-Credentials", ALLOW_CREDENTIALS),
    ("Access-Control-Allow-Methods", ALLOW_METHODS),
];

/// Status code of every preflight response.
pub const PREFLIGHT_STATUS: u16 = 200;

/// Request template the mock integration evaluates to pick its response.
pub const MOCK_REQUEST_TEMPLATE: &str = "{\"statusCode\": 200}";
