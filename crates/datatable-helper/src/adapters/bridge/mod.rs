mod handler;
mod io;
mod protocol;

use crate::{
    cli::Args,
    config::TableRegistry,
    core::connection::WorkerHandle,
    error::{AppError, AppResult},
};

pub use handler::BridgeHandler;
pub use protocol::{BridgeRequest, BridgeResponse, PROTOCOL_VERSION};

use io::NdjsonIo;

pub fn run(args: Args, registry: TableRegistry) -> AppResult<()> {
    let worker = WorkerHandle::spawn(&args.db, args.busy_timeout_ms)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    rt.block_on(async move {
        let tables = registry.clone();
        worker.run(move |store| tables.validate(store)).await?;
        tracing::info!(db = %worker.db_path.display(), routes = ?registry.routes(), "bridge ready");

        let mut io = NdjsonIo::new();
        let handler = BridgeHandler::new(registry, worker, args.response_options());

        loop {
            let Some(line) = io.read_line()? else { break };
            if line.is_empty() {
                continue;
            }

            let req: BridgeRequest = match serde_json::from_str(&line) {
                Ok(r) => r,
                Err(e) => {
                    // best-effort: unknown id; still return something
                    let _ = io.protocol_error(e.to_string());
                    continue;
                }
            };

            let resp = handler.handle(req).await;
            io.write_json_line(&resp)?;
        }

        Ok(())
    })
}
