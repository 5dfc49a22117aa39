// ABOUTME: Test support utilities.
// ABOUTME: Provides recording listeners, controllable transports, and content fixtures for integration tests.

use parking_lot::{Condvar, Mutex};
use rollplan::content::{ContentDistributor, ContentHash, DistributionError};
use rollplan::execution::{Transport, TransportError};
use rollplan::listener::DeploymentActionListener;
use rollplan::plan::DeploymentAction;
use rollplan::protocol::RemoteError;
use rollplan::types::{PlanId, ServerIdentity};
use std::collections::BTreeMap;
use std::io::{self, Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter =
            EnvFilter::from_default_env().add_directive("rollplan=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Distributor that hashes nothing and returns a fixed hash.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct FixedHashDistributor {
    pub calls: Mutex<Vec<(String, bool)>>,
}

impl ContentDistributor for FixedHashDistributor {
    fn distribute(
        &self,
        name: &str,
        _runtime_name: &str,
        _content: &mut dyn Read,
    ) -> Result<ContentHash, DistributionError> {
        self.calls.lock().push((name.to_string(), false));
        Ok(ContentHash::new(vec![0xAB; 20]))
    }

    fn distribute_replacement(
        &self,
        name: &str,
        _runtime_name: &str,
        _content: &mut dyn Read,
    ) -> Result<ContentHash, DistributionError> {
        self.calls.lock().push((name.to_string(), true));
        Ok(ContentHash::new(vec![0xCD; 20]))
    }
}

/// Listener that records every callback as a short string.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl RecordingListener {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn record(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }
}

impl DeploymentActionListener for RecordingListener {
    fn handle_cancelled_by_domain(&self, action: &DeploymentAction) {
        self.record(format!("cancelled_by_domain:{}", action.unit_name()));
    }

    fn handle_domain_rolled_back(&self, action: &DeploymentAction) {
        self.record(format!("domain_rolled_back:{}", action.unit_name()));
    }

    fn handle_domain_failed(&self, action: &DeploymentAction, error: &RemoteError) {
        self.record(format!("domain_failed:{}:{}", action.unit_name(), error.message));
    }

    fn handle_host_failed(
        &self,
        action: &DeploymentAction,
        host_failures: &BTreeMap<String, RemoteError>,
    ) {
        let hosts: Vec<&str> = host_failures.keys().map(String::as_str).collect();
        self.record(format!("host_failed:{}:{}", action.unit_name(), hosts.join(",")));
    }

    fn handle_servers_identified(&self, action: &DeploymentAction, servers: &[ServerIdentity]) {
        self.record(format!("servers_identified:{}:{}", action.unit_name(), servers.len()));
    }

    fn handle_server_cancelled(&self, _action: &DeploymentAction, server: &ServerIdentity) {
        self.record(format!("server_cancelled:{}", server.server()));
    }

    fn handle_server_rolled_back(&self, _action: &DeploymentAction, server: &ServerIdentity) {
        self.record(format!("server_rolled_back:{}", server.server()));
    }

    fn handle_server_timed_out(&self, _action: &DeploymentAction, server: &ServerIdentity) {
        self.record(format!("server_timed_out:{}", server.server()));
    }

    fn handle_server_failed(
        &self,
        _action: &DeploymentAction,
        server: &ServerIdentity,
        error: &RemoteError,
    ) {
        self.record(format!("server_failed:{}:{}", server.server(), error.message));
    }

    fn handle_server_succeeded(
        &self,
        _action: &DeploymentAction,
        server: &ServerIdentity,
        _value: Option<&serde_json::Value>,
    ) {
        self.record(format!("server_succeeded:{}", server.server()));
    }

    fn handle_rollback_cancellation(&self, action: &DeploymentAction) {
        self.record(format!("rollback_cancellation:{}", action.unit_name()));
    }

    fn handle_domain_rollback(&self, action: &DeploymentAction) {
        self.record(format!("domain_rollback:{}", action.unit_name()));
    }

    fn handle_domain_rollback_failed(&self, action: &DeploymentAction, _error: &RemoteError) {
        self.record(format!("domain_rollback_failed:{}", action.unit_name()));
    }

    fn handle_host_rollback_failed(
        &self,
        action: &DeploymentAction,
        _host_failures: &BTreeMap<String, RemoteError>,
    ) {
        self.record(format!("host_rollback_failed:{}", action.unit_name()));
    }

    fn handle_server_rollback(&self, _action: &DeploymentAction, server: &ServerIdentity) {
        self.record(format!("server_rollback:{}", server.server()));
    }

    fn handle_server_rollback_cancelled(&self, _action: &DeploymentAction, server: &ServerIdentity) {
        self.record(format!("server_rollback_cancelled:{}", server.server()));
    }

    fn handle_server_rollback_timed_out(&self, _action: &DeploymentAction, server: &ServerIdentity) {
        self.record(format!("server_rollback_timed_out:{}", server.server()));
    }

    fn handle_server_rollback_failed(
        &self,
        _action: &DeploymentAction,
        server: &ServerIdentity,
        _error: &RemoteError,
    ) {
        self.record(format!("server_rollback_failed:{}", server.server()));
    }
}

/// Open/closed flag shared between a gated transport and its readers.
#[allow(dead_code)]
#[derive(Debug, Default)]
struct Gate {
    open: Mutex<bool>,
    opened: Condvar,
}

#[allow(dead_code)]
impl Gate {
    fn open(&self) {
        *self.open.lock() = true;
        self.opened.notify_all();
    }

    fn wait(&self) {
        let mut open = self.open.lock();
        while !*open {
            self.opened.wait(&mut open);
        }
    }
}

/// Transport whose response reader blocks until the test releases it.
///
/// Cancelling through the transport releases the reader too.
#[allow(dead_code)]
pub struct GatedTransport {
    response: Vec<u8>,
    gate: Arc<Gate>,
    bytes_read: Arc<AtomicUsize>,
    submissions: AtomicUsize,
    cancellations: Mutex<Vec<PlanId>>,
    cancel_succeeds: bool,
}

#[allow(dead_code)]
impl GatedTransport {
    pub fn new(response: impl Into<Vec<u8>>) -> Self {
        Self {
            response: response.into(),
            gate: Arc::new(Gate::default()),
            bytes_read: Arc::new(AtomicUsize::new(0)),
            submissions: AtomicUsize::new(0),
            cancellations: Mutex::new(Vec::new()),
            cancel_succeeds: true,
        }
    }

    /// A transport whose `cancel` reports that the exchange could not be stopped.
    pub fn uncancellable(response: impl Into<Vec<u8>>) -> Self {
        Self {
            cancel_succeeds: false,
            ..Self::new(response)
        }
    }

    pub fn release(&self) {
        self.gate.open();
    }

    pub fn bytes_read(&self) -> usize {
        self.bytes_read.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    pub fn cancellations(&self) -> Vec<PlanId> {
        self.cancellations.lock().clone()
    }
}

impl Transport for GatedTransport {
    fn submit(
        &self,
        _plan_id: PlanId,
        _request: bytes::Bytes,
    ) -> Result<Box<dyn Read + Send>, TransportError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(GatedReader {
            inner: Cursor::new(self.response.clone()),
            gate: Arc::clone(&self.gate),
            bytes_read: Arc::clone(&self.bytes_read),
        }))
    }

    fn cancel(&self, plan_id: PlanId) -> bool {
        self.cancellations.lock().push(plan_id);
        self.gate.open();
        self.cancel_succeeds
    }
}

#[allow(dead_code)]
struct GatedReader {
    inner: Cursor<Vec<u8>>,
    gate: Arc<Gate>,
    bytes_read: Arc<AtomicUsize>,
}

impl Read for GatedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.gate.wait();
        let read = self.inner.read(buf)?;
        self.bytes_read.fetch_add(read, Ordering::SeqCst);
        Ok(read)
    }
}

/// Content stream that counts how many times it has been dropped.
#[allow(dead_code)]
pub struct DropCounter {
    inner: Cursor<Vec<u8>>,
    drops: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl DropCounter {
    pub fn new(content: &[u8]) -> (Self, Arc<AtomicUsize>) {
        let drops = Arc::new(AtomicUsize::new(0));
        (
            Self {
                inner: Cursor::new(content.to_vec()),
                drops: Arc::clone(&drops),
            },
            drops,
        )
    }
}

impl Read for DropCounter {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}
