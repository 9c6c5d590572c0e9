//! Record kinds and their desired configuration
//!
//! Two kinds share one lifecycle: [`HostConfig`] is reconciled continuously,
//! [`HostOperationJob`] runs once per explicit trigger. Both are plain
//! serde values; the reconciler reads them, computes, and writes them back.

use crate::duration::Timeout;
use crate::error::{Error, Result};
use content::ContentRef;
use fingerprint::Fingerprint;
use lifecycle::{Mode, Status};
use playbook::RemotePlaybookRef;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Longest value a node-name label may carry
pub const MAX_LABEL_VALUE_LEN: usize = 63;

// ============================================================================
// Markers
// ============================================================================

/// Finalizer, annotation and label keys of one record kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Markers {
    pub finalizer: &'static str,
    pub rerun_annotation: &'static str,
    pub config_hash_annotation: &'static str,
    pub node_name_label: &'static str,
}

impl Markers {
    pub const HOST_CONFIG: Self = Self {
        finalizer: "hostconfig.kubesmart.smtx.io",
        rerun_annotation: "hostconfig.kubesmart.smtx.io/re-run",
        config_hash_annotation: "hostconfig.kubesmart.smtx.io/config-hash",
        node_name_label: "hostconfig.kubesmart.smtx.io/node-name",
    };

    pub const HOST_OPERATION_JOB: Self = Self {
        finalizer: "hostoperationjob.kubesmart.smtx.io",
        rerun_annotation: "hostoperationjob.kubesmart.smtx.io/re-run",
        config_hash_annotation: "hostoperationjob.kubesmart.smtx.io/config-hash",
        node_name_label: "hostoperationjob.kubesmart.smtx.io/node-name",
    };
}

/// Label value identifying a node
///
/// Names too long for a label are replaced by a digest of the name.
pub fn node_name_label_value(node_name: &str) -> String {
    if node_name.len() <= MAX_LABEL_VALUE_LEN {
        return node_name.to_string();
    }
    let digest = Fingerprint::of_bytes(node_name.as_bytes());
    digest.as_str()[..MAX_LABEL_VALUE_LEN].to_string()
}

// ============================================================================
// Desired configuration
// ============================================================================

/// Automation content: where the playbook comes from and its inputs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_playbook: Option<RemotePlaybookRef>,

    #[serde(default, alias = "localPlaybook", skip_serializing_if = "Option::is_none")]
    pub local_playbook_text: Option<ContentRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<ContentRef>,
}

impl AutomationSpec {
    /// Canonical form: empty references dropped, checksums normalized
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            remote_playbook: self.remote_playbook.as_ref().map(RemotePlaybookRef::normalized),
            local_playbook_text: self
                .local_playbook_text
                .clone()
                .map(ContentRef::normalized)
                .and_then(ContentRef::into_non_empty),
            values: self
                .values
                .clone()
                .map(ContentRef::normalized)
                .and_then(ContentRef::into_non_empty),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.remote_playbook.is_none()
            && self.local_playbook_text.as_ref().is_none_or(ContentRef::is_empty)
            && self.values.as_ref().is_none_or(ContentRef::is_empty)
    }
}

/// The unit over which drift is fingerprinted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ansible: Option<AutomationSpec>,

    #[serde(default)]
    pub timeout: Timeout,
}

impl DesiredConfig {
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            ansible: self
                .ansible
                .as_ref()
                .map(AutomationSpec::normalized)
                .filter(|a| !a.is_empty()),
            timeout: self.timeout,
        }
    }

    /// Fingerprint of the normalized configuration
    pub fn fingerprint(&self) -> Result<Fingerprint> {
        Fingerprint::compute(&self.normalized()).map_err(Error::Fingerprint)
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Identity and bookkeeping of a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,

    #[serde(default)]
    pub namespace: String,

    #[serde(default)]
    pub annotations: BTreeMap<String, String>,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub finalizers: Vec<String>,

    #[serde(default)]
    pub deletion_requested: bool,
}

impl ObjectMeta {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    pub fn has_finalizer(&self, finalizer: &str) -> bool {
        self.finalizers.iter().any(|f| f == finalizer)
    }

    /// Add a finalizer; returns whether it was missing
    pub fn add_finalizer(&mut self, finalizer: &str) -> bool {
        if self.has_finalizer(finalizer) {
            return false;
        }
        self.finalizers.push(finalizer.to_string());
        true
    }

    /// Remove a finalizer; returns whether it was present
    pub fn remove_finalizer(&mut self, finalizer: &str) -> bool {
        let before = self.finalizers.len();
        self.finalizers.retain(|f| f != finalizer);
        self.finalizers.len() != before
    }
}

// ============================================================================
// Record kinds
// ============================================================================

/// A persisted, reconcilable record
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Store directory name of this kind
    const KIND: &'static str;
    /// How the kind reacts to drift once settled
    const MODE: Mode;
    const MARKERS: Markers;

    fn metadata(&self) -> &ObjectMeta;
    fn metadata_mut(&mut self) -> &mut ObjectMeta;
    fn node_name(&self) -> &str;
    fn desired(&self) -> &DesiredConfig;
    fn status(&self) -> &Status;
    fn status_mut(&mut self) -> &mut Status;

    /// `namespace/name`
    fn key(&self) -> String {
        let meta = self.metadata();
        format!("{}/{}", meta.namespace, meta.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfigSpec {
    pub node_name: String,
    #[serde(default)]
    pub config: DesiredConfig,
}

/// Continuously reconciled host configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    pub metadata: ObjectMeta,
    pub spec: HostConfigSpec,
    #[serde(default)]
    pub status: Status,
}

impl HostConfig {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        node_name: impl Into<String>,
        config: DesiredConfig,
    ) -> Self {
        let node_name = node_name.into();
        let mut metadata = ObjectMeta::new(namespace, name);
        metadata.labels.insert(
            Self::MARKERS.node_name_label.to_string(),
            node_name_label_value(&node_name),
        );
        Self {
            metadata,
            spec: HostConfigSpec { node_name, config },
            status: Status::default(),
        }
    }
}

impl Record for HostConfig {
    const KIND: &'static str = "hostconfigs";
    const MODE: Mode = Mode::Continuous;
    const MARKERS: Markers = Markers::HOST_CONFIG;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
    fn node_name(&self) -> &str {
        &self.spec.node_name
    }
    fn desired(&self) -> &DesiredConfig {
        &self.spec.config
    }
    fn status(&self) -> &Status {
        &self.status
    }
    fn status_mut(&mut self) -> &mut Status {
        &mut self.status
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostOperationJobSpec {
    pub node_name: String,
    #[serde(default)]
    pub operation: DesiredConfig,
}

/// One-shot host operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostOperationJob {
    pub metadata: ObjectMeta,
    pub spec: HostOperationJobSpec,
    #[serde(default)]
    pub status: Status,
}

impl HostOperationJob {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        node_name: impl Into<String>,
        operation: DesiredConfig,
    ) -> Self {
        let node_name = node_name.into();
        let mut metadata = ObjectMeta::new(namespace, name);
        metadata.labels.insert(
            Self::MARKERS.node_name_label.to_string(),
            node_name_label_value(&node_name),
        );
        Self {
            metadata,
            spec: HostOperationJobSpec {
                node_name,
                operation,
            },
            status: Status::default(),
        }
    }
}

impl Record for HostOperationJob {
    const KIND: &'static str = "hostoperationjobs";
    const MODE: Mode = Mode::OneShot;
    const MARKERS: Markers = Markers::HOST_OPERATION_JOB;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
    fn node_name(&self) -> &str {
        &self.spec.node_name
    }
    fn desired(&self) -> &DesiredConfig {
        &self.spec.operation
    }
    fn status(&self) -> &Status {
        &self.status
    }
    fn status_mut(&mut self) -> &mut Status {
        &mut self.status
    }
}
