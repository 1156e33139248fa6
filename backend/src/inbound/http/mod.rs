//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;
use serde_json::json;

use crate::domain::Error;

pub mod error;
pub mod health;
pub mod state;
pub mod validation;
pub mod wallet;

pub use crate::domain::ApiResult;

/// Largest accepted JSON request body.
pub const JSON_BODY_LIMIT: usize = 1024 * 1024;

/// JSON body extractor configuration reporting malformed payloads as
/// `invalid_request` errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, _req| {
            Error::invalid_request("request body is not valid JSON for this endpoint")
                .with_details(json!({ "reason": err.to_string() }))
                .into()
        })
}

/// Query string extractor configuration reporting malformed parameters as
/// `invalid_request` errors.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        Error::invalid_request("query string is malformed")
            .with_details(json!({ "reason": err.to_string() }))
            .into()
    })
}
