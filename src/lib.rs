//! # hostops
//!
//! Idempotent application of declarative host configuration.
//!
//! A [`HostConfig`] or [`HostOperationJob`] record declares what a node
//! should run: a playbook (inline or packaged remotely), its values, and a
//! deadline. The [`Reconciler`] runs it at most once per distinct
//! configuration, tracking progress through the record's phase and a
//! fingerprint of the configuration it last ran.
//!
//! ## Workspace crates
//!
//! - [`content`]: resolves inline-or-secret content references
//! - [`fingerprint`]: deterministic configuration fingerprints
//! - [`playbook`]: checksum-gated archive fetching and caching
//! - [`lifecycle`]: phases, transitions and the reconcile decision
//!
//! ## Example
//!
//! ```no_run
//! use hostops::{FileStore, HostConfig, Reconciler, Settings};
//! use hostops::runner::ScriptedRunner;
//! use content::DirSecretStore;
//! use playbook::fetch::http::HttpFetcher;
//! use std::sync::Arc;
//!
//! let settings = Settings::load_default()?;
//! let reconciler = Reconciler::new(
//!     FileStore::new("/var/lib/hostops/records"),
//!     Arc::new(DirSecretStore::new("/var/lib/hostops/secrets")),
//!     Arc::new(HttpFetcher::new()),
//!     Arc::new(ScriptedRunner::new()),
//!     settings,
//! );
//!
//! for (key, result) in reconciler.reconcile_all::<HostConfig>()? {
//!     println!("{key}: {result:?}");
//! }
//! # Ok::<(), hostops::Error>(())
//! ```

pub mod api;
pub mod duration;
pub mod error;
pub mod paths;
pub mod reconcile;
pub mod runner;
pub mod settings;
pub mod store;

pub use api::{
    AutomationSpec, DesiredConfig, HostConfig, HostConfigSpec, HostOperationJob,
    HostOperationJobSpec, Markers, ObjectMeta, Record, node_name_label_value,
};
pub use duration::Timeout;
pub use error::{Error, Result};
pub use reconcile::{Outcome, Reconciler};
pub use runner::{Invocation, PlaybookRunner};
pub use settings::{PreparationFailurePolicy, Settings};
pub use store::{FileStore, RecordStore};
