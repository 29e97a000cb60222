use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::request::TableRequest;
use crate::error::AppResult;

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BridgeRequest {
    pub v: u32,
    pub id: String,
    pub cmd: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct BridgeResponse<T> {
    pub v: u32,
    pub id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl<T> BridgeResponse<T> {
    pub fn ok(v: u32, id: String, data: T) -> Self {
        Self {
            v,
            id,
            status: "ok",
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn err(v: u32, id: String, code: &'static str, error: String) -> Self {
        Self {
            v,
            id,
            status: "error",
            data: None,
            error: Some(error),
            code: Some(code),
        }
    }
}

// Payloads

#[derive(Debug, Deserialize)]
pub struct RoutePayload {
    pub route: String,
}

#[derive(Debug, Deserialize)]
pub struct MarkupPayload {
    pub route: String,
    #[serde(default)]
    pub auto_initialize: Option<bool>,
}

/// Either a structured `request` or the widget's decoded `form` fields.
#[derive(Debug, Deserialize)]
pub struct RecordsPayload {
    pub route: String,
    #[serde(default)]
    pub request: Option<TableRequest>,
    #[serde(default)]
    pub form: Option<BTreeMap<String, String>>,
}

impl RecordsPayload {
    pub fn table_request(self) -> AppResult<TableRequest> {
        match (self.request, self.form) {
            (Some(req), _) => Ok(req),
            (None, Some(form)) => TableRequest::from_form(form),
            (None, None) => Ok(TableRequest::default()),
        }
    }
}
