/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::{Arc, Mutex};

use ahash::AHashMap;
use thiserror::Error;

use exmet_types::metrics::{MetricKind, MetricName};

use crate::mgmt::AttributeGauge;

mod instrument;
pub use instrument::{Counter, Meter, Timer, TimerSnapshot};

mod json;
pub use json::registry_to_json;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("metric {name} is already registered as {existing}, not {requested}")]
    ConflictingKind {
        name: MetricName,
        existing: MetricKind,
        requested: MetricKind,
    },
}

#[derive(Clone)]
pub enum MetricEntry {
    Counter(Arc<Counter>),
    Meter(Arc<Meter>),
    Timer(Arc<Timer>),
    Gauge(Arc<AttributeGauge>),
}

impl MetricEntry {
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricEntry::Counter(_) => MetricKind::Counter,
            MetricEntry::Meter(_) => MetricKind::Meter,
            MetricEntry::Timer(_) => MetricKind::Timer,
            MetricEntry::Gauge(_) => MetricKind::Gauge,
        }
    }
}

/// The process-wide metric store. One instance is created at startup,
/// shared by reference among the notifier, the gauge providers and the
/// exporter, and cleared at shutdown.
///
/// A name is bound to exactly one metric kind for its lifetime.
pub struct MetricRegistry {
    inner: Mutex<AHashMap<MetricName, MetricEntry>>,
}

impl Default for MetricRegistry {
    fn default() -> Self {
        MetricRegistry::new()
    }
}

impl MetricRegistry {
    pub fn new() -> Self {
        MetricRegistry {
            inner: Mutex::new(AHashMap::new()),
        }
    }

    fn get_or_create<F>(
        &self,
        name: &MetricName,
        kind: MetricKind,
        create: F,
    ) -> Result<MetricEntry, RegistryError>
    where
        F: FnOnce() -> MetricEntry,
    {
        let mut map = self.inner.lock().unwrap();
        if let Some(entry) = map.get(name) {
            if entry.kind() == kind {
                return Ok(entry.clone());
            }
            return Err(RegistryError::ConflictingKind {
                name: name.clone(),
                existing: entry.kind(),
                requested: kind,
            });
        }
        let entry = create();
        map.insert(name.clone(), entry.clone());
        Ok(entry)
    }

    /// Get or lazily create the counter bound to `name`.
    pub fn counter(&self, name: &MetricName) -> Result<Arc<Counter>, RegistryError> {
        let entry = self.get_or_create(name, MetricKind::Counter, || {
            MetricEntry::Counter(Arc::new(Counter::new()))
        })?;
        match entry {
            MetricEntry::Counter(c) => Ok(c),
            _ => unreachable!(),
        }
    }

    /// Get or lazily create the meter bound to `name`.
    pub fn meter(&self, name: &MetricName) -> Result<Arc<Meter>, RegistryError> {
        let entry = self.get_or_create(name, MetricKind::Meter, || {
            MetricEntry::Meter(Arc::new(Meter::new()))
        })?;
        match entry {
            MetricEntry::Meter(m) => Ok(m),
            _ => unreachable!(),
        }
    }

    /// Get or lazily create the timer bound to `name`.
    pub fn timer(&self, name: &MetricName) -> Result<Arc<Timer>, RegistryError> {
        let entry = self.get_or_create(name, MetricKind::Timer, || {
            MetricEntry::Timer(Arc::new(Timer::new()))
        })?;
        match entry {
            MetricEntry::Timer(t) => Ok(t),
            _ => unreachable!(),
        }
    }

    /// Register a gauge under `name`. Re-registering a gauge under the same
    /// name keeps the first instance; a different kind is a conflict.
    pub fn register_gauge(
        &self,
        name: MetricName,
        gauge: AttributeGauge,
    ) -> Result<(), RegistryError> {
        self.get_or_create(&name, MetricKind::Gauge, move || {
            MetricEntry::Gauge(Arc::new(gauge))
        })?;
        Ok(())
    }

    /// A point-in-time view of all entries, ordered by name. Only entry
    /// references are copied; writers are not blocked beyond that.
    pub fn snapshot(&self) -> Vec<(MetricName, MetricEntry)> {
        let map = self.inner.lock().unwrap();
        let mut entries: Vec<(MetricName, MetricEntry)> = map
            .iter()
            .map(|(name, entry)| (name.clone(), entry.clone()))
            .collect();
        drop(map);
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    /// Drop all entries. Only for process shutdown.
    pub fn clear(&self) {
        self.inner.lock().unwrap().clear();
    }
}
