use serde::Serialize;

use crate::{
    config::TableRegistry,
    core::{
        connection::WorkerHandle,
        markup::{render_markup, MarkupOptions},
        records::fetch_records,
        types::ResponseOptions,
    },
    error::{AppError, AppResult},
};

use super::protocol::*;

pub struct BridgeHandler {
    registry: TableRegistry,
    worker: WorkerHandle,
    options: ResponseOptions,
}

impl BridgeHandler {
    pub fn new(registry: TableRegistry, worker: WorkerHandle, options: ResponseOptions) -> Self {
        Self {
            registry,
            worker,
            options,
        }
    }

    pub async fn handle(&self, req: BridgeRequest) -> BridgeResponse<serde_json::Value> {
        if req.v != PROTOCOL_VERSION {
            let e = AppError::InvalidRequest(format!("unsupported protocol version: {}", req.v));
            return err(req, e);
        }

        let res = match req.cmd.as_str() {
            "routes" => to_value(self.registry.routes()),
            "columns" => self.handle_columns(&req.payload).await,
            "markup" => self.handle_markup(&req.payload).await,
            "records" => self.handle_records(&req.payload).await,
            other => Err(AppError::InvalidRequest(format!("unknown cmd: {other}"))),
        };

        match res {
            Ok(data) => BridgeResponse::ok(req.v, req.id, data),
            Err(e) => err(req, e),
        }
    }

    async fn handle_columns(&self, payload: &serde_json::Value) -> AppResult<serde_json::Value> {
        let p: RoutePayload = parse_payload(payload)?;
        let table = self.registry.get(&p.route)?;
        let catalog = self.worker.run(move |store| table.columns(store)).await?;
        to_value(catalog.columns())
    }

    async fn handle_markup(&self, payload: &serde_json::Value) -> AppResult<serde_json::Value> {
        let p: MarkupPayload = parse_payload(payload)?;
        let table = self.registry.get(&p.route)?;
        let options = MarkupOptions {
            auto_initialize: p.auto_initialize.unwrap_or(true),
        };
        let html = self
            .worker
            .run(move |store| render_markup(&*table, store, options))
            .await?;
        Ok(serde_json::Value::String(html))
    }

    async fn handle_records(&self, payload: &serde_json::Value) -> AppResult<serde_json::Value> {
        let p: RecordsPayload = parse_payload(payload)?;
        let table = self.registry.get(&p.route)?;
        let request = p.table_request()?;
        let options = self.options;
        let page = self
            .worker
            .run(move |store| fetch_records(&*table, store, &request, options))
            .await?;
        to_value(page)
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(payload: &serde_json::Value) -> AppResult<T> {
    serde_json::from_value(payload.clone()).map_err(|e| AppError::InvalidRequest(e.to_string()))
}

fn to_value<T: Serialize>(v: T) -> AppResult<serde_json::Value> {
    Ok(serde_json::to_value(v)?)
}

fn err(req: BridgeRequest, e: AppError) -> BridgeResponse<serde_json::Value> {
    if matches!(e, AppError::QueryFailed(_) | AppError::Internal(_)) {
        tracing::warn!(cmd = %req.cmd, error = %e, "request failed");
    }
    BridgeResponse::err(req.v, req.id, e.code(), e.to_string())
}
