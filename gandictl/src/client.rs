//! Typed client for the Gandi hosting API.

use gandi_core::{
    Datacenter, DiskSpec, GandiError, Image, ImageFilter, Operation, Result, Server, ServerSpec,
    VmSummary,
};
use gandi_rpc::{RpcTransport, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Client for the provider's XML-RPC API.
///
/// Every call sends the API key as its first parameter, followed by the
/// method-specific arguments in the order the provider defines. Nothing is
/// retried here; a transport failure or remote fault is returned as-is.
///
/// # Examples
///
/// ```no_run
/// use gandi_rpc::{CodecOptions, HttpTransport, DEFAULT_ENDPOINT};
/// use gandictl::client::GandiClient;
/// use std::time::Duration;
///
/// # async fn example() -> anyhow::Result<()> {
/// let transport = HttpTransport::new(
///     DEFAULT_ENDPOINT,
///     Duration::from_secs(30),
///     CodecOptions::nil_tolerant(),
/// )?;
/// let client = GandiClient::new(transport, "my-api-key");
///
/// for dc in client.datacenter_list().await? {
///     println!("{} {}", dc.id, dc.name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GandiClient<T: RpcTransport> {
    transport: T,
    api_key: String,
}

impl<T: RpcTransport> GandiClient<T> {
    /// Create a client sending `api_key` with every call
    pub fn new(transport: T, api_key: impl Into<String>) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
        }
    }

    /// Underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Invoke `method` and decode its result into `R`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The transport fails or the provider answers with a fault
    /// - The result does not have the shape `R` expects
    pub async fn call<R: DeserializeOwned>(&self, method: &str, args: Vec<Value>) -> Result<R> {
        let mut params = Vec::with_capacity(args.len() + 1);
        params.push(Value::String(self.api_key.clone()));
        params.extend(args);

        let value = self.transport.call(method, params).await?;
        let json = value.into_json()?;
        serde_json::from_value(json).map_err(|e| {
            GandiError::Serialization(format!("Unexpected result from {}: {}", method, e))
        })
    }

    /// List the datacenters servers can be created in.
    pub async fn datacenter_list(&self) -> Result<Vec<Datacenter>> {
        self.call("datacenter.list", vec![]).await
    }

    /// List images matching `filter`.
    pub async fn image_list(&self, filter: &ImageFilter) -> Result<Vec<Image>> {
        self.call("image.list", vec![to_value(filter)?]).await
    }

    /// Fetch a single image.
    pub async fn image_info(&self, image_id: i64) -> Result<Image> {
        self.call("image.info", vec![Value::Int(image_id)]).await
    }

    /// Create a server, its system disk cloned from `src_disk_id`, and its
    /// network interface in one call.
    ///
    /// # Returns
    ///
    /// One operation per created resource; the server's is typed `vm_create`.
    pub async fn vm_create_from(
        &self,
        server: &ServerSpec,
        disk: &DiskSpec,
        src_disk_id: i64,
    ) -> Result<Vec<Operation>> {
        debug!(
            "Creating server '{}' in datacenter {} from disk {}",
            server.hostname, server.datacenter_id, src_disk_id
        );
        self.call(
            "vm.create_from",
            vec![to_value(server)?, to_value(disk)?, Value::Int(src_disk_id)],
        )
        .await
    }

    /// Fetch the full record of a server, including disks and interfaces.
    pub async fn vm_info(&self, vm_id: i64) -> Result<Server> {
        self.call("vm.info", vec![Value::Int(vm_id)]).await
    }

    /// List servers in abbreviated form.
    pub async fn vm_list(&self) -> Result<Vec<VmSummary>> {
        self.call("vm.list", vec![]).await
    }

    /// Halt a server.
    pub async fn vm_stop(&self, vm_id: i64) -> Result<Operation> {
        self.call("vm.stop", vec![Value::Int(vm_id)]).await
    }

    /// Delete a halted server.
    pub async fn vm_delete(&self, vm_id: i64) -> Result<Operation> {
        self.call("vm.delete", vec![Value::Int(vm_id)]).await
    }

    /// Fetch the current status of an operation.
    pub async fn operation_info(&self, operation_id: i64) -> Result<Operation> {
        self.call("operation.info", vec![Value::Int(operation_id)]).await
    }
}

/// Serialize a request payload into an RPC value.
fn to_value<S: Serialize>(payload: &S) -> Result<Value> {
    Ok(Value::from_json(serde_json::to_value(payload)?))
}
