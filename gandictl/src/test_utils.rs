//! Test utilities for CLI testing
//!
//! Provides an in-memory transport, a mock XML-RPC provider, and recording
//! doubles for the prompt and bootstrap collaborators.

use anyhow::Result;
use async_trait::async_trait;
use axum::{extract::State, http::header, routing::post, Router};
use gandi_core::GandiError;
use gandi_rpc::codec::{decode_call, encode_fault, encode_response};
use gandi_rpc::{CodecOptions, RpcTransport, Value};
use serde_json::json;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use crate::bootstrap::{BootstrapRequest, Bootstrapper};
use crate::prompt::{NumberCheck, Prompter, TextCheck};

/// Shared, ordered record of what collaborators did during a test
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

// ============================================================================
// In-memory transport
// ============================================================================

/// Transport answering from a queue of canned results
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<gandi_core::Result<Value>>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_value(&self, value: Value) {
        self.responses.lock().unwrap().push_back(Ok(value));
    }

    pub fn queue_json(&self, value: serde_json::Value) {
        self.queue_value(Value::from_json(value));
    }

    pub fn queue_fault(&self, code: i64, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(GandiError::RemoteFault {
                code,
                message: message.to_string(),
            }));
    }

    /// Calls made so far, in order
    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    /// Method names of the calls made so far
    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|(method, _)| method).collect()
    }
}

#[async_trait]
impl RpcTransport for MockTransport {
    async fn call(&self, method: &str, params: Vec<Value>) -> gandi_core::Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params));

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(GandiError::Transport(format!(
                    "No response queued for {}",
                    method
                )))
            })
    }
}

// ============================================================================
// Mock provider
// ============================================================================

/// API key the mock provider accepts
pub const MOCK_API_KEY: &str = "test-api-key";

/// Fault code for an unknown object
const FAULT_NOT_FOUND: i64 = 510150;

/// Fault code for an invalid API key
const FAULT_AUTH: i64 = 510042;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    None,
    SetState(i64, &'static str),
    Remove(i64),
}

#[derive(Debug)]
struct MockOperation {
    record: serde_json::Value,
    pending: VecDeque<&'static str>,
    effect: Effect,
}

/// Mock provider state
#[derive(Debug)]
pub struct ProviderState {
    pub datacenters: Vec<serde_json::Value>,
    pub images: Vec<serde_json::Value>,
    pub vms: BTreeMap<i64, serde_json::Value>,
    operations: BTreeMap<i64, MockOperation>,
    next_id: i64,
    /// Method names received, in order
    pub calls: Vec<String>,
}

impl Default for ProviderState {
    fn default() -> Self {
        Self {
            datacenters: vec![
                json!({"id": 1, "name": "Equinix Paris", "country": "France"}),
                json!({"id": 2, "name": "Level3 Baltimore", "country": "United States of America"}),
            ],
            images: vec![
                json!({"id": 42, "label": "Ubuntu 10.04 64 bits", "os_arch": "x86-64",
                       "datacenter_id": 1, "disk_id": 4242}),
                json!({"id": 43, "label": "Debian 5 32 bits", "os_arch": "x86-32",
                       "datacenter_id": 1, "disk_id": 4343}),
                json!({"id": 44, "label": "CentOS 5 64 bits", "os_arch": "x86-64",
                       "datacenter_id": 2, "disk_id": 4444}),
            ],
            vms: BTreeMap::new(),
            operations: BTreeMap::new(),
            next_id: 100,
            calls: Vec::new(),
        }
    }
}

impl ProviderState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn start_operation(
        &mut self,
        mut record: serde_json::Value,
        effect: Effect,
    ) -> serde_json::Value {
        let id = self.allocate_id();
        record["id"] = json!(id);
        record["step"] = json!("WAIT");
        self.operations.insert(
            id,
            MockOperation {
                record: record.clone(),
                pending: VecDeque::from(["RUN", "DONE"]),
                effect,
            },
        );
        record
    }

    fn vm(&self, id: i64) -> std::result::Result<&serde_json::Value, (i64, String)> {
        self.vms
            .get(&id)
            .ok_or_else(|| (FAULT_NOT_FOUND, format!("Error: vm {} does not exist", id)))
    }
}

/// XML-RPC endpoint simulating the hosting API.
///
/// Created servers get a public interface whose IPv4 address and reverse
/// name are both `127.0.0.1`, so readiness probes can be pointed at a local
/// listener.
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    state: Arc<Mutex<ProviderState>>,
}

impl MockProvider {
    /// Create a new mock provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Start serving on an ephemeral port and return the endpoint URL
    pub async fn start(&self) -> Result<String> {
        let app = Router::new()
            .route("/xmlrpc/", post(rpc_handler))
            .with_state(self.state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Mock provider error: {}", e);
            }
        });

        // Give the server a moment to start and verify it's running
        for _ in 0..20 {
            if tokio::net::TcpStream::connect(("127.0.0.1", port))
                .await
                .is_ok()
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        Ok(format!("http://127.0.0.1:{}/xmlrpc/", port))
    }

    /// Method names received so far
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Seed a server record
    pub fn add_vm(&self, vm: serde_json::Value) {
        let id = vm["id"].as_i64().unwrap();
        self.state.lock().unwrap().vms.insert(id, vm);
    }

    /// Current record of a server, if it exists
    pub fn vm(&self, id: i64) -> Option<serde_json::Value> {
        self.state.lock().unwrap().vms.get(&id).cloned()
    }
}

async fn rpc_handler(
    State(state): State<Arc<Mutex<ProviderState>>>,
    body: String,
) -> ([(header::HeaderName, &'static str); 1], String) {
    let options = CodecOptions::nil_tolerant();
    let document = match decode_call(&body, options) {
        Ok((method, params)) => {
            let outcome = dispatch(&mut state.lock().unwrap(), &method, params);
            match outcome {
                Ok(result) => encode_response(&Value::from_json(result), options),
                Err((code, message)) => encode_fault(code, &message),
            }
        }
        Err(e) => encode_fault(-32700, &e.to_string()),
    };

    let text = document.unwrap_or_else(|e| format!("encoding failed: {}", e));
    ([(header::CONTENT_TYPE, "text/xml")], text)
}

fn int_param(params: &[Value], index: usize) -> std::result::Result<i64, (i64, String)> {
    params
        .get(index)
        .and_then(Value::as_i64)
        .ok_or_else(|| (-32602, format!("Expected an integer at position {}", index)))
}

fn struct_param(
    params: &[Value],
    index: usize,
) -> std::result::Result<serde_json::Value, (i64, String)> {
    params
        .get(index)
        .cloned()
        .ok_or_else(|| (-32602, format!("Missing parameter at position {}", index)))?
        .into_json()
        .map_err(|e| (-32602, e.to_string()))
}

fn dispatch(
    state: &mut ProviderState,
    method: &str,
    params: Vec<Value>,
) -> std::result::Result<serde_json::Value, (i64, String)> {
    state.calls.push(method.to_string());

    if params.first().and_then(Value::as_str) != Some(MOCK_API_KEY) {
        return Err((FAULT_AUTH, "Error on object : OBJECT_ACCOUNT (CAUSE_BADPARAMETER)".into()));
    }

    match method {
        "datacenter.list" => Ok(json!(state.datacenters)),
        "image.list" => {
            let filter = struct_param(&params, 1)?;
            let images: Vec<_> = state
                .images
                .iter()
                .filter(|image| {
                    filter["datacenter_id"].is_null()
                        || image["datacenter_id"] == filter["datacenter_id"]
                })
                .filter(|image| {
                    filter["os_arch"].is_null() || image["os_arch"] == filter["os_arch"]
                })
                .cloned()
                .collect();
            Ok(json!(images))
        }
        "image.info" => {
            let id = int_param(&params, 1)?;
            state
                .images
                .iter()
                .find(|image| image["id"] == json!(id))
                .cloned()
                .ok_or((FAULT_NOT_FOUND, format!("Error: image {} does not exist", id)))
        }
        "vm.create_from" => {
            let server = struct_param(&params, 1)?;
            let disk = struct_param(&params, 2)?;
            let src_disk_id = int_param(&params, 3)?;
            let image = state
                .images
                .iter()
                .find(|image| image["disk_id"] == json!(src_disk_id))
                .cloned()
                .ok_or((FAULT_NOT_FOUND, format!("Error: disk {} does not exist", src_disk_id)))?;

            let vm_id = state.allocate_id();
            let disk_id = state.allocate_id();
            let iface_id = state.allocate_id();
            state.vms.insert(
                vm_id,
                json!({
                    "id": vm_id,
                    "hostname": server["hostname"],
                    "cores": server["cores"],
                    "memory": server["memory"],
                    "date_created": "20111019T09:30:00",
                    "state": "being_created",
                    "datacenter_id": server["datacenter_id"],
                    "description": null,
                    "disks": [{
                        "id": disk_id,
                        "name": disk["name"],
                        "label": image["label"],
                        "size": 3072,
                        "is_boot_disk": true
                    }],
                    "ifaces": [{
                        "id": iface_id,
                        "type": "public",
                        "ips": [
                            {"id": 1, "ip": "127.0.0.1", "reverse": "127.0.0.1", "version": 4},
                            {"id": 2, "ip": "::1", "reverse": "localhost", "version": 6}
                        ]
                    }]
                }),
            );

            let disk_op = state.start_operation(
                json!({"type": "disk_create", "disk_id": disk_id}),
                Effect::None,
            );
            let iface_op = state.start_operation(
                json!({"type": "iface_create", "iface_id": iface_id}),
                Effect::None,
            );
            let vm_op = state.start_operation(
                json!({"type": "vm_create", "vm_id": vm_id}),
                Effect::SetState(vm_id, "running"),
            );
            Ok(json!([disk_op, iface_op, vm_op]))
        }
        "vm.info" => {
            let id = int_param(&params, 1)?;
            state.vm(id).cloned()
        }
        "vm.list" => Ok(json!(state
            .vms
            .values()
            .map(|vm| json!({"id": vm["id"], "hostname": vm["hostname"], "state": vm["state"]}))
            .collect::<Vec<_>>())),
        "vm.stop" => {
            let id = int_param(&params, 1)?;
            state.vm(id)?;
            Ok(state.start_operation(
                json!({"type": "vm_stop", "vm_id": id}),
                Effect::SetState(id, "halted"),
            ))
        }
        "vm.delete" => {
            let id = int_param(&params, 1)?;
            if state.vm(id)?["state"] != json!("halted") {
                return Err((510046, format!("Error: vm {} must be halted", id)));
            }
            Ok(state.start_operation(
                json!({"type": "vm_delete", "vm_id": id}),
                Effect::Remove(id),
            ))
        }
        "operation.info" => {
            let id = int_param(&params, 1)?;
            let operation = state
                .operations
                .get_mut(&id)
                .ok_or((FAULT_NOT_FOUND, format!("Error: operation {} does not exist", id)))?;

            let mut apply = Effect::None;
            if let Some(step) = operation.pending.pop_front() {
                operation.record["step"] = json!(step);
                if step == "DONE" {
                    apply = operation.effect;
                }
            }
            let record = operation.record.clone();

            match apply {
                Effect::None => {}
                Effect::SetState(vm_id, new_state) => {
                    if let Some(vm) = state.vms.get_mut(&vm_id) {
                        vm["state"] = json!(new_state);
                    }
                }
                Effect::Remove(vm_id) => {
                    state.vms.remove(&vm_id);
                }
            }
            Ok(record)
        }
        other => Err((-32601, format!("Unknown method {}", other))),
    }
}

// ============================================================================
// Collaborator doubles
// ============================================================================

/// Bootstrapper that records requests instead of running anything
#[derive(Debug, Default)]
pub struct RecordingBootstrapper {
    requests: Mutex<Vec<BootstrapRequest>>,
    events: Option<EventLog>,
}

impl RecordingBootstrapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: EventLog) -> Self {
        Self {
            events: Some(events),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<BootstrapRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Bootstrapper for RecordingBootstrapper {
    async fn bootstrap(&self, request: &BootstrapRequest) -> Result<()> {
        if let Some(events) = &self.events {
            events.push(format!("bootstrap:{}", request.host));
        }
        self.requests.lock().unwrap().push(request.clone());
        Ok(())
    }
}

/// Prompter answering from a script.
///
/// An empty scripted answer takes the prompt's default. Running out of
/// answers is an error, like an unattended run.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    confirmation: bool,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            confirmation: false,
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Answer confirmations with `answer`
    pub fn confirming(mut self, answer: bool) -> Self {
        self.confirmation = answer;
        self
    }

    /// Messages of the questions asked so far
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }

    fn next_answer(&self, message: &str) -> Result<String> {
        self.asked.lock().unwrap().push(message.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GandiError::MissingValue(message.to_string()).into())
    }
}

impl Prompter for ScriptedPrompter {
    fn text(
        &self,
        message: &str,
        default: Option<&str>,
        check: Option<TextCheck>,
    ) -> Result<String> {
        let answer = self.next_answer(message)?;
        let answer = match (answer.is_empty(), default) {
            (true, Some(default)) => default.to_string(),
            _ => answer,
        };
        if let Some(check) = check {
            check(&answer).map_err(|e| anyhow::anyhow!(e))?;
        }
        Ok(answer)
    }

    fn number(
        &self,
        message: &str,
        default: Option<i64>,
        check: Option<NumberCheck>,
    ) -> Result<i64> {
        let answer = self.next_answer(message)?;
        let value = match (answer.is_empty(), default) {
            (true, Some(default)) => default,
            _ => answer.parse()?,
        };
        if let Some(check) = check {
            check(value).map_err(|e| anyhow::anyhow!(e))?;
        }
        Ok(value)
    }

    fn secret(&self, message: &str, check: Option<TextCheck>) -> Result<String> {
        self.text(message, None, check)
    }

    fn confirm(&self, message: &str) -> Result<bool> {
        self.asked.lock().unwrap().push(message.to_string());
        Ok(self.confirmation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gandi_rpc::HttpTransport;

    #[tokio::test]
    async fn test_mock_provider_round_trip() {
        let provider = MockProvider::new();
        let url = provider.start().await.unwrap();

        let transport =
            HttpTransport::new(url, Duration::from_secs(5), CodecOptions::nil_tolerant()).unwrap();
        let result = transport
            .call("datacenter.list", vec![Value::from(MOCK_API_KEY)])
            .await
            .unwrap();

        let json = result.into_json().unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(provider.calls(), vec!["datacenter.list"]);
    }

    #[tokio::test]
    async fn test_mock_provider_rejects_bad_key() {
        let provider = MockProvider::new();
        let url = provider.start().await.unwrap();

        let transport =
            HttpTransport::new(url, Duration::from_secs(5), CodecOptions::nil_tolerant()).unwrap();
        let err = transport
            .call("datacenter.list", vec![Value::from("wrong")])
            .await
            .unwrap_err();

        assert!(matches!(err, GandiError::RemoteFault { code: FAULT_AUTH, .. }));
    }

    #[test]
    fn test_scripted_prompter_defaults() {
        let prompter = ScriptedPrompter::new(["", "3"]);
        assert_eq!(prompter.number("Cores: ", Some(1), None).unwrap(), 1);
        assert_eq!(prompter.number("Cores: ", Some(1), None).unwrap(), 3);
        assert!(prompter.text("Name: ", None, None).is_err());
        assert_eq!(prompter.asked().len(), 3);
    }
}
