//! Polling of asynchronous provider operations.

use gandi_core::{Operation, Result};
use gandi_rpc::RpcTransport;
use std::time::Duration;
use tracing::debug;

use crate::client::GandiClient;

/// Interval between two `operation.info` calls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Block until `operation` reaches its terminal step.
///
/// While the step is not `DONE`, re-fetch the operation, call `on_tick`, and
/// sleep for `interval`. There is no attempt limit and no timeout: provider
/// operations are expected to terminate, and the user interrupts the process
/// otherwise.
///
/// # Returns
///
/// The last fetched operation, whose step is `DONE`.
///
/// # Errors
///
/// The first failing `operation.info` call aborts the wait.
pub async fn await_completion<T, F>(
    client: &GandiClient<T>,
    mut operation: Operation,
    interval: Duration,
    mut on_tick: F,
) -> Result<Operation>
where
    T: RpcTransport,
    F: FnMut(),
{
    while !operation.is_done() {
        operation = client.operation_info(operation.id).await?;
        debug!("Operation {} is at step '{}'", operation.id, operation.step);
        on_tick();
        tokio::time::sleep(interval).await;
    }

    Ok(operation)
}
