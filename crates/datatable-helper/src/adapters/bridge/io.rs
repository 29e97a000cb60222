use std::io::{BufRead, BufReader, BufWriter, Write};

use crate::error::{AppError, AppResult};

/// Line-delimited JSON over stdio.
pub struct NdjsonIo {
    stdin: BufReader<std::io::Stdin>,
    stdout: BufWriter<std::io::Stdout>,
}

impl NdjsonIo {
    pub fn new() -> Self {
        Self {
            stdin: BufReader::new(std::io::stdin()),
            stdout: BufWriter::new(std::io::stdout()),
        }
    }

    pub fn read_line(&mut self) -> AppResult<Option<String>> {
        let mut line = String::new();
        let n = self.stdin.read_line(&mut line)?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    pub fn write_json_line<T: serde::Serialize>(&mut self, v: &T) -> AppResult<()> {
        serde_json::to_writer(&mut self.stdout, v)?;
        self.stdout.write_all(b"\n")?;
        self.stdout.flush()?;
        Ok(())
    }

    pub fn protocol_error(&mut self, msg: String) -> AppResult<()> {
        let e = AppError::InvalidRequest(msg);
        let r = super::protocol::BridgeResponse::<()>::err(
            super::protocol::PROTOCOL_VERSION,
            String::new(),
            e.code(),
            e.to_string(),
        );
        self.write_json_line(&r)
    }
}
