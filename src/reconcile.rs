//! Reconciliation passes
//!
//! One pass over one record:
//!
//! 1. Deletion requested: run the cleanup hook, drop the finalizer, delete.
//! 2. First sight: add the finalizer and the node-name label.
//! 3. Fingerprint the desired configuration and [`decide`] what to do.
//! 4. `Reset` returns the record to `Initializing`; `Execute` runs one
//!    deadline-bounded attempt (resolve content, fetch the playbook, run it)
//!    and records `Succeeded` or `Failed` together with the fingerprint.
//!
//! Every state change is saved before the pass moves on, so an interrupted
//! pass is picked up where it stopped.

use crate::api::{AutomationSpec, Record, node_name_label_value};
use crate::duration::Timeout;
use crate::error::{Error, Result};
use crate::runner::{Invocation, PlaybookRunner};
use crate::settings::{PreparationFailurePolicy, Settings};
use crate::store::RecordStore;
use content::{Resolver, SecretStore};
use fingerprint::Fingerprint;
use lifecycle::{
    Action, AttemptOutcome, CancelToken, Clock, Phase, Signals, SystemClock, decide,
    run_with_deadline,
};
use playbook::PlaybookCache;
use playbook::fetch::Fetcher;
use rayon::prelude::*;
use std::sync::Arc;

/// Result of one reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Stable with no re-run request; nothing changed
    Idle,
    /// Returned to `Initializing`; the next pass executes
    Reset,
    /// An attempt ran and ended in this phase
    Completed(Phase),
    /// Cleanup done, record deleted
    Finalized,
    /// No such record
    Missing,
}

/// Drives records of any [`Record`] kind through their lifecycle
pub struct Reconciler<S> {
    store: S,
    resolver: Resolver,
    cache: PlaybookCache,
    fetcher: Arc<dyn Fetcher>,
    runner: Arc<dyn PlaybookRunner>,
    clock: Arc<dyn Clock>,
    settings: Settings,
}

impl<S: RecordStore> Reconciler<S> {
    pub fn new(
        store: S,
        secrets: Arc<dyn SecretStore>,
        fetcher: Arc<dyn Fetcher>,
        runner: Arc<dyn PlaybookRunner>,
        settings: Settings,
    ) -> Self {
        Self {
            store,
            resolver: Resolver::new(secrets, settings.values_key.clone()),
            cache: PlaybookCache::new(settings.cache_path()),
            fetcher,
            runner,
            clock: Arc::new(SystemClock),
            settings,
        }
    }

    /// Use `clock` for recorded timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run one pass over the stored record `namespace/name`
    pub fn reconcile<R: Record>(&self, namespace: &str, name: &str) -> Result<Outcome> {
        match self.store.load::<R>(namespace, name)? {
            Some(mut record) => self.reconcile_record(&mut record),
            None => {
                log::debug!("{} {}/{} not found, nothing to do", R::KIND, namespace, name);
                Ok(Outcome::Missing)
            }
        }
    }

    /// Run one pass over every stored record of a kind, in parallel
    ///
    /// Each record is handled by exactly one worker. Per-record failures are
    /// reported alongside the record key and do not stop the batch.
    pub fn reconcile_all<R: Record>(&self) -> Result<Vec<(String, Result<Outcome>)>> {
        let records = self.store.list::<R>()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.jobs)
            .build()
            .map_err(|e| Error::WorkerPool {
                message: e.to_string(),
            })?;

        let results = pool.install(|| {
            records
                .into_par_iter()
                .map(|mut record| {
                    let key = record.key();
                    let result = self.reconcile_record(&mut record);
                    if let Err(e) = &result {
                        log::warn!("{} {}: {}", R::KIND, key, e);
                    }
                    (key, result)
                })
                .collect()
        });
        Ok(results)
    }

    /// Run one pass over an in-memory record, saving every change
    pub fn reconcile_record<R: Record>(&self, record: &mut R) -> Result<Outcome> {
        if record.metadata().deletion_requested {
            return self.finalize(record);
        }

        let adopted = self.adopt(record);

        let markers = R::MARKERS;
        let current = record.desired().fingerprint()?;
        let meta = record.metadata();
        let signals = Signals {
            stable: fingerprint::is_stable(
                meta.annotation(markers.config_hash_annotation),
                &current,
            ),
            rerun: meta.annotations.contains_key(markers.rerun_annotation),
        };

        match decide(record.status().phase, R::MODE, signals) {
            Action::Idle => {
                if adopted {
                    self.store.save(record)?;
                }
                Ok(Outcome::Idle)
            }
            Action::Reset => {
                let from = record.status().phase;
                record.status_mut().reset()?;
                record
                    .metadata_mut()
                    .annotations
                    .remove(markers.rerun_annotation);
                log::info!(
                    "{} {}: {} -> {} ({})",
                    R::KIND,
                    record.key(),
                    from,
                    Phase::Initializing,
                    if signals.rerun { "re-run requested" } else { "configuration drifted" }
                );
                self.store.save(record)?;
                Ok(Outcome::Reset)
            }
            Action::Execute => self.execute(record, &current),
        }
    }

    /// Add the finalizer and node label; returns whether anything changed
    fn adopt<R: Record>(&self, record: &mut R) -> bool {
        let markers = R::MARKERS;
        let label = node_name_label_value(record.node_name());
        let meta = record.metadata_mut();

        let mut changed = meta.add_finalizer(markers.finalizer);
        if meta.labels.get(markers.node_name_label) != Some(&label) {
            meta.labels.insert(markers.node_name_label.to_string(), label);
            changed = true;
        }
        changed
    }

    fn finalize<R: Record>(&self, record: &mut R) -> Result<Outcome> {
        let markers = R::MARKERS;
        let key = record.key();

        if record.metadata().has_finalizer(markers.finalizer) {
            self.runner
                .cleanup(R::KIND, &key, record.node_name())
                .map_err(|e| Error::Cleanup {
                    record: key.clone(),
                    message: format!("{e:#}"),
                })?;
            record.metadata_mut().remove_finalizer(markers.finalizer);
            self.store.save(record)?;
            log::info!("{} {}: cleanup done, finalizer removed", R::KIND, key);
        }

        let meta = record.metadata();
        self.store.delete::<R>(&meta.namespace, &meta.name)?;
        Ok(Outcome::Finalized)
    }

    fn execute<R: Record>(&self, record: &mut R, fingerprint: &Fingerprint) -> Result<Outcome> {
        let markers = R::MARKERS;
        let key = record.key();

        let from = record.status().phase;
        record.status_mut().begin()?;
        // Starting an attempt consumes any pending re-run request.
        record
            .metadata_mut()
            .annotations
            .remove(markers.rerun_annotation);
        self.store.save(record)?;
        log::info!("{} {}: {} -> {}", R::KIND, key, from, Phase::Processing);

        let timeout = record.desired().timeout.or(self.settings.default_timeout);
        let attempt = Attempt {
            resolver: self.resolver.clone(),
            cache: self.cache.clone(),
            fetcher: Arc::clone(&self.fetcher),
            runner: Arc::clone(&self.runner),
            kind: R::KIND,
            record: key.clone(),
            namespace: record.metadata().namespace.clone(),
            node_name: record.node_name().to_string(),
            automation: record
                .desired()
                .ansible
                .as_ref()
                .map(AutomationSpec::normalized)
                .unwrap_or_default(),
            timeout,
        };

        let result = match run_with_deadline(timeout.as_duration(), move |cancel| {
            attempt.run(&cancel)
        }) {
            Ok(AttemptOutcome::Completed(result)) => result,
            Ok(AttemptOutcome::TimedOut { elapsed }) => {
                log::debug!("{} {}: gave up after {:?}", R::KIND, key, elapsed);
                Err(Error::ExecutionTimeout { timeout })
            }
            Ok(AttemptOutcome::Panicked) => Err(Error::execution("execution panicked")),
            Err(e) => Err(Error::execution(format!("failed to start attempt: {e}"))),
        };

        let now = self.clock.now();
        match result {
            Ok(()) => {
                record.status_mut().succeed(now)?;
                self.record_fingerprint(record, fingerprint);
                self.store.save(record)?;
                log::info!(
                    "{} {}: {} -> {} (config {})",
                    R::KIND,
                    key,
                    Phase::Processing,
                    Phase::Succeeded,
                    fingerprint.short()
                );
                Ok(Outcome::Completed(Phase::Succeeded))
            }
            Err(e)
                if e.is_preparation()
                    && self.settings.preparation_failure == PreparationFailurePolicy::Requeue =>
            {
                record.status_mut().abandon()?;
                self.store.save(record)?;
                log::warn!(
                    "{} {}: {} -> {} ({}), requeued",
                    R::KIND,
                    key,
                    Phase::Processing,
                    Phase::Initializing,
                    e
                );
                if let Some(advice) = e.advice() {
                    log::warn!("{} {}: {}", R::KIND, key, advice);
                }
                Err(e)
            }
            Err(e) => {
                record.status_mut().fail(e.reason(), e.to_string(), now)?;
                self.record_fingerprint(record, fingerprint);
                self.store.save(record)?;
                log::info!(
                    "{} {}: {} -> {} ({}: {})",
                    R::KIND,
                    key,
                    Phase::Processing,
                    Phase::Failed,
                    e.reason(),
                    e
                );
                Ok(Outcome::Completed(Phase::Failed))
            }
        }
    }

    fn record_fingerprint<R: Record>(&self, record: &mut R, fingerprint: &Fingerprint) {
        record.metadata_mut().annotations.insert(
            R::MARKERS.config_hash_annotation.to_string(),
            fingerprint.to_string(),
        );
    }
}

impl<S> std::fmt::Debug for Reconciler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("cache", &self.cache)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Everything an attempt needs, owned so it can move to the worker thread
struct Attempt {
    resolver: Resolver,
    cache: PlaybookCache,
    fetcher: Arc<dyn Fetcher>,
    runner: Arc<dyn PlaybookRunner>,
    kind: &'static str,
    record: String,
    namespace: String,
    node_name: String,
    automation: AutomationSpec,
    timeout: Timeout,
}

impl Attempt {
    fn run(self, cancel: &CancelToken) -> Result<()> {
        let invocation = self.prepare()?;
        let result = if cancel.is_cancelled() {
            Err(Error::ExecutionTimeout {
                timeout: self.timeout,
            })
        } else {
            self.runner
                .run(&invocation, cancel)
                .map_err(|e| Error::execution(format!("{e:#}")))
        };
        if let Some(cached) = &invocation.remote_playbook
            && let Err(e) = self.cache.release(cached)
        {
            log::warn!("{} {}: failed to release archive copy: {}", self.kind, self.record, e);
        }
        result
    }

    fn prepare(&self) -> Result<Invocation> {
        let automation = &self.automation;
        let values = self
            .resolver
            .resolve_opt(automation.values.as_ref(), &self.namespace)?;
        let local_playbook = self
            .resolver
            .resolve_opt(automation.local_playbook_text.as_ref(), &self.namespace)?;
        let remote_playbook = match &automation.remote_playbook {
            Some(reference) => Some(self.cache.ensure(reference, self.fetcher.as_ref())?),
            None => None,
        };

        Ok(Invocation {
            kind: self.kind,
            record: self.record.clone(),
            node_name: self.node_name.clone(),
            values,
            local_playbook,
            remote_playbook,
            timeout: self.timeout.as_duration(),
        })
    }
}
