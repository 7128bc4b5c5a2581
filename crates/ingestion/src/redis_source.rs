//! Redis list source
//!
//! Pops elements from a Redis list with `LPOP`. Each element may carry one
//! or more newline-delimited lines; an empty list reads as end-of-data.

use std::collections::VecDeque;
use std::time::Duration;

use contracts::{ContractError, LineSource, SourceConfig, SourceRead};
use tracing::{debug, info, warn};

/// Default connect / read / write timeout
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Blocking Redis `LPOP` line source
pub struct RedisLineSource {
    name: String,
    client: redis::Client,
    queue: String,
    timeout: Duration,
    connection: Option<redis::Connection>,
    pending: VecDeque<String>,
}

impl RedisLineSource {
    /// Create a source from the blueprint's source section
    ///
    /// Only validates the URL; the connection is opened lazily on first read
    /// and re-opened after a failure.
    pub fn new(config: &SourceConfig) -> Result<Self, ContractError> {
        let name = format!("redis:{}", config.queue);
        let client = redis::Client::open(config.redis_url())
            .map_err(|e| ContractError::source_connection(&name, e.to_string()))?;

        Ok(Self {
            name,
            client,
            queue: config.queue.clone(),
            timeout: DEFAULT_IO_TIMEOUT,
            connection: None,
            pending: VecDeque::new(),
        })
    }

    /// Create a source and open its connection
    ///
    /// Fails fast when Redis is unreachable at startup.
    pub fn open(config: &SourceConfig, timeout: Duration) -> crate::Result<Self> {
        let mut source = Self::new(config)?.with_timeout(timeout);
        source.connect()?;
        Ok(source)
    }

    /// Override the connect / read / write timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Open the connection now instead of on first read
    pub fn connect(&mut self) -> Result<(), ContractError> {
        self.connection()?;
        Ok(())
    }

    fn connection(&mut self) -> Result<&mut redis::Connection, ContractError> {
        if self.connection.is_none() {
            let conn = self
                .client
                .get_connection_with_timeout(self.timeout)
                .map_err(|e| ContractError::source_connection(&self.name, e.to_string()))?;
            conn.set_read_timeout(Some(self.timeout))
                .and_then(|_| conn.set_write_timeout(Some(self.timeout)))
                .map_err(|e| ContractError::source_connection(&self.name, e.to_string()))?;
            info!(source = %self.name, "connected to redis");
            self.connection = Some(conn);
        }

        self.connection
            .as_mut()
            .ok_or_else(|| ContractError::source_connection(&self.name, "no connection"))
    }

    fn pop(&mut self) -> Result<Option<String>, ContractError> {
        let queue = self.queue.clone();
        let conn = self.connection()?;
        let result = redis::cmd("LPOP").arg(&queue).query::<Option<String>>(conn);

        match result {
            Ok(value) => Ok(value),
            Err(e) => {
                // Drop the connection; the next session reconnects
                warn!(source = %self.name, error = %e, "LPOP failed, dropping connection");
                self.connection = None;
                Err(ContractError::source_read(&self.name, e.to_string()))
            }
        }
    }
}

impl LineSource for RedisLineSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_line(&mut self) -> SourceRead {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Ok(Some(line));
            }

            match self.pop()? {
                Some(element) => {
                    debug!(source = %self.name, len = element.len(), "popped element");
                    self.pending.extend(split_lines(&element));
                }
                None => return Ok(None),
            }
        }
    }
}

/// Split a popped element into lines
///
/// A trailing newline does not produce an empty line; `\r\n` is accepted.
fn split_lines(element: &str) -> impl Iterator<Item = String> + '_ {
    let body = element.strip_suffix('\n').unwrap_or(element);
    body.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
}
