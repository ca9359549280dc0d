//! Scripted control plane for driving the orchestrators without AWS.
//!
//! Describe calls replay queued responses; once a queue is down to its last
//! entry that entry is repeated. Every call is recorded in order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use converge::archive::ArchiveBuilder;
use converge::clock::{Clock, ManualClock};
use converge::error::{ConvergeError, Result};
use converge::remote::{
    ArtifactLocation, ArtifactStore, DnsUpsert, EnvironmentStatus, InstanceSettings,
    InstanceStatus, RemoteControlClient, RemoteEvent, ResourceTag, RestoreRequest, Snapshot,
};

/// One recorded control-plane call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub operation: &'static str,
    pub target: String,
}

#[derive(Debug, Default)]
struct ScriptState {
    environment_statuses: VecDeque<EnvironmentStatus>,
    instance_statuses: HashMap<String, VecDeque<InstanceStatus>>,
    event_log: Vec<RemoteEvent>,
    snapshots: Vec<Snapshot>,
    tags: HashMap<String, Vec<ResourceTag>>,
    dns_changes: Vec<DnsUpsert>,
    restore_requests: Vec<RestoreRequest>,
    modifications: Vec<InstanceSettings>,
    missing_instances: HashSet<String>,
    fail_on: Option<(&'static str, usize)>,
    calls: Vec<Call>,
}

/// Recording [`RemoteControlClient`] whose responses are scripted per test.
///
/// The event log is filtered by the shared clock, so an event timestamped in
/// the future only becomes visible once virtual time reaches it.
pub struct ScriptedRemote {
    clock: Arc<ManualClock>,
    state: Mutex<ScriptState>,
}

fn next<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

impl ScriptedRemote {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            clock,
            state: Mutex::new(ScriptState::default()),
        }
    }

    pub fn with_environment_statuses(self, statuses: &[(&str, Option<&str>)]) -> Self {
        self.state.lock().environment_statuses = statuses
            .iter()
            .map(|(status, health)| EnvironmentStatus {
                status: status.to_string(),
                health: health.map(str::to_string),
            })
            .collect();
        self
    }

    pub fn with_instance_statuses(self, instance: &str, statuses: Vec<InstanceStatus>) -> Self {
        self.state
            .lock()
            .instance_statuses
            .insert(instance.to_string(), statuses.into_iter().collect());
        self
    }

    pub fn with_events(self, events: Vec<RemoteEvent>) -> Self {
        self.state.lock().event_log = events;
        self
    }

    pub fn with_snapshots(self, snapshots: Vec<Snapshot>) -> Self {
        self.state.lock().snapshots = snapshots;
        self
    }

    pub fn with_tags(self, arn: &str, tags: Vec<ResourceTag>) -> Self {
        self.state.lock().tags.insert(arn.to_string(), tags);
        self
    }

    /// Deleting `name` reports that the instance does not exist.
    pub fn with_missing_instance(self, name: &str) -> Self {
        self.state.lock().missing_instances.insert(name.to_string());
        self
    }

    /// Fails the `nth` (1-based) call of `operation` with a transport error.
    pub fn failing_on(self, operation: &'static str, nth: usize) -> Self {
        self.state.lock().fail_on = Some((operation, nth));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn operations(&self) -> Vec<&'static str> {
        self.state
            .lock()
            .calls
            .iter()
            .map(|call| call.operation)
            .collect()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    pub fn tags_on(&self, arn: &str) -> Vec<ResourceTag> {
        self.state.lock().tags.get(arn).cloned().unwrap_or_default()
    }

    pub fn dns_changes(&self) -> Vec<DnsUpsert> {
        self.state.lock().dns_changes.clone()
    }

    pub fn restore_requests(&self) -> Vec<RestoreRequest> {
        self.state.lock().restore_requests.clone()
    }

    pub fn modifications(&self) -> Vec<InstanceSettings> {
        self.state.lock().modifications.clone()
    }

    fn record(&self, operation: &'static str, target: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(Call {
            operation,
            target: target.to_string(),
        });
        if let Some((failing, nth)) = state.fail_on {
            let seen = state
                .calls
                .iter()
                .filter(|call| call.operation == failing)
                .count();
            if failing == operation && seen == nth {
                return Err(ConvergeError::transport(operation, "scripted failure"));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteControlClient for ScriptedRemote {
    async fn create_version(
        &self,
        application: &str,
        _label: &str,
        _source: &ArtifactLocation,
    ) -> Result<()> {
        self.record("create-application-version", application)
    }

    async fn update_environment(&self, environment: &str, _label: &str) -> Result<()> {
        self.record("update-environment", environment)
    }

    async fn describe_environment(
        &self,
        _application: &str,
        environment: &str,
    ) -> Result<EnvironmentStatus> {
        self.record("describe-environments", environment)?;
        next(&mut self.state.lock().environment_statuses).ok_or_else(|| {
            ConvergeError::invalid_response(
                "describe-environments",
                "Environments[0]",
                "not scripted",
            )
        })
    }

    async fn describe_events(
        &self,
        _application: &str,
        environment: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<RemoteEvent>> {
        self.record("describe-events", environment)?;
        let now = self.clock.now();
        Ok(self
            .state
            .lock()
            .event_log
            .iter()
            .filter(|event| event.occurred_at >= since && event.occurred_at <= now)
            .cloned()
            .collect())
    }

    async fn restore_instance(&self, request: &RestoreRequest) -> Result<()> {
        self.record("restore-db-instance-from-db-snapshot", &request.instance_name)?;
        self.state.lock().restore_requests.push(request.clone());
        Ok(())
    }

    async fn describe_instance(&self, name: &str) -> Result<InstanceStatus> {
        self.record("describe-db-instances", name)?;
        let mut state = self.state.lock();
        match state.instance_statuses.get_mut(name).and_then(next) {
            Some(status) => Ok(status),
            None => Ok(available(name)),
        }
    }

    async fn describe_snapshots(&self, source_instance: &str) -> Result<Vec<Snapshot>> {
        self.record("describe-db-snapshots", source_instance)?;
        Ok(self.state.lock().snapshots.clone())
    }

    async fn list_tags(&self, resource_arn: &str) -> Result<Vec<ResourceTag>> {
        self.record("list-tags-for-resource", resource_arn)?;
        Ok(self.tags_on(resource_arn))
    }

    async fn add_tags(&self, resource_arn: &str, tags: &[ResourceTag]) -> Result<()> {
        self.record("add-tags-to-resource", resource_arn)?;
        let mut state = self.state.lock();
        let existing = state.tags.entry(resource_arn.to_string()).or_default();
        for tag in tags {
            existing.retain(|current| current.key != tag.key);
            existing.push(tag.clone());
        }
        Ok(())
    }

    async fn modify_instance(&self, name: &str, settings: &InstanceSettings) -> Result<()> {
        self.record("modify-db-instance", name)?;
        self.state.lock().modifications.push(settings.clone());
        Ok(())
    }

    async fn reboot_instance(&self, name: &str) -> Result<()> {
        self.record("reboot-db-instance", name)
    }

    async fn delete_instance(&self, name: &str) -> Result<()> {
        self.record("delete-db-instance", name)?;
        if self.state.lock().missing_instances.contains(name) {
            return Err(ConvergeError::not_found("delete-db-instance", name));
        }
        Ok(())
    }

    async fn upsert_dns_record(&self, change: &DnsUpsert) -> Result<()> {
        self.record("change-resource-record-sets", &change.record)?;
        self.state.lock().dns_changes.push(change.clone());
        Ok(())
    }
}

/// `available` status with an endpoint and ARN derived from the name.
pub fn available(name: &str) -> InstanceStatus {
    InstanceStatus {
        status: "available".to_string(),
        endpoint: Some(format!("{name}.abc123.us-east-1.rds.amazonaws.com")),
        arn: Some(format!("arn:aws:rds:us-east-1:123456789012:db:{name}")),
    }
}

pub fn instance_status(status: &str) -> InstanceStatus {
    InstanceStatus {
        status: status.to_string(),
        endpoint: None,
        arn: None,
    }
}

/// Records uploads without touching any storage.
#[derive(Debug, Default)]
pub struct RecordingStore {
    uploads: Mutex<Vec<(PathBuf, ArtifactLocation)>>,
}

impl RecordingStore {
    pub fn uploads(&self) -> Vec<(PathBuf, ArtifactLocation)> {
        self.uploads.lock().clone()
    }
}

#[async_trait]
impl ArtifactStore for RecordingStore {
    async fn upload(&self, local_path: &Path, destination: &ArtifactLocation) -> Result<()> {
        self.uploads
            .lock()
            .push((local_path.to_path_buf(), destination.clone()));
        Ok(())
    }
}

/// Reports the destination as built without running git.
#[derive(Debug, Default)]
pub struct StubArchiver {
    builds: Mutex<Vec<(String, Vec<String>)>>,
}

impl StubArchiver {
    pub fn builds(&self) -> Vec<(String, Vec<String>)> {
        self.builds.lock().clone()
    }
}

#[async_trait]
impl ArchiveBuilder for StubArchiver {
    async fn build(
        &self,
        commit: &str,
        extra_paths: &[String],
        destination: &Path,
    ) -> Result<PathBuf> {
        self.builds
            .lock()
            .push((commit.to_string(), extra_paths.to_vec()));
        Ok(destination.to_path_buf())
    }
}
