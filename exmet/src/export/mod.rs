/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use ahash::AHashMap;
use log::warn;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use exmet_statsd_client::StatsdClient;
use exmet_types::metrics::{MetricName, MetricValue};

use crate::mgmt::AttributeGauge;
use crate::registry::{MetricEntry, MetricRegistry};

mod filter;
pub use filter::ExportFilter;

const DEFAULT_EMIT_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Clone, Debug)]
pub struct ExporterConfig {
    pub emit_interval: Duration,
    pub query_timeout: Duration,
    pub filter: Option<ExportFilter>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        ExporterConfig {
            emit_interval: DEFAULT_EMIT_INTERVAL,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            filter: None,
        }
    }
}

/// Pushes the registry to the collector on a fixed cadence, as a single
/// periodic task decoupled from event delivery. A failed cycle is logged
/// and the next one proceeds unaffected.
pub struct StatsdExporter {
    registry: Arc<MetricRegistry>,
    client: StatsdClient,
    config: ExporterConfig,

    last_counts: AHashMap<MetricName, u64>,
}

impl StatsdExporter {
    pub fn new(registry: Arc<MetricRegistry>, client: StatsdClient, config: ExporterConfig) -> Self {
        StatsdExporter {
            registry,
            client,
            config,
            last_counts: AHashMap::new(),
        }
    }

    pub fn spawn(self) -> ExporterHandle {
        let (quit_sender, quit_receiver) = watch::channel(false);
        let task = tokio::spawn(self.into_running(quit_receiver));
        ExporterHandle { quit_sender, task }
    }

    async fn into_running(mut self, mut quit: watch::Receiver<bool>) {
        let mut emit_interval = tokio::time::interval(self.config.emit_interval);
        // the first tick fires immediately, skip it
        emit_interval.tick().await;

        loop {
            tokio::select! {
                biased;

                r = quit.changed() => {
                    if r.is_err() || *quit.borrow() {
                        break;
                    }
                }
                _ = emit_interval.tick() => {
                    self.emit_cycle().await;
                }
            }
        }
    }

    pub(crate) async fn emit_cycle(&mut self) {
        for (name, entry) in self.registry.snapshot() {
            if let Some(filter) = &self.config.filter {
                if !filter.matches(&name, entry.kind()) {
                    continue;
                }
            }
            match entry {
                MetricEntry::Counter(c) => self.emit_count(&name, c.value()),
                MetricEntry::Meter(m) => {
                    let rate = m.mean_rate();
                    self.emit_count(&name, m.count());
                    self.client.gauge_float(&format!("{name}.rate"), rate);
                }
                MetricEntry::Timer(t) => {
                    let stats = t.stats();
                    let name_str = name.to_string();
                    self.emit_count_as(&name, &format!("{name_str}.count"), stats.count);
                    self.client.gauge(&format!("{name_str}.min"), stats.min);
                    self.client.gauge(&format!("{name_str}.max"), stats.max);
                    self.client.gauge_float(&format!("{name_str}.mean"), stats.mean);
                    self.client.gauge(&format!("{name_str}.p50"), stats.p50);
                    self.client.gauge(&format!("{name_str}.p95"), stats.p95);
                    self.client.gauge(&format!("{name_str}.p99"), stats.p99);
                }
                MetricEntry::Gauge(g) => self.emit_gauge(&name, g).await,
            }
        }
        self.client.flush_sink();
    }

    /// StatsD counters are per-interval, so emit the delta since the
    /// previous cycle.
    fn emit_count(&mut self, name: &MetricName, total: u64) {
        let wire_name = name.to_string();
        self.emit_count_as(name, &wire_name, total);
    }

    fn emit_count_as(&mut self, name: &MetricName, wire_name: &str, total: u64) {
        let last = self.last_counts.insert(name.clone(), total).unwrap_or(0);
        self.client.count(wire_name, total.saturating_sub(last));
    }

    /// Gauge reads query the management interface, which may block or
    /// hang; bound each read so one unreachable resource cannot stall the
    /// whole cycle.
    async fn emit_gauge(&mut self, name: &MetricName, gauge: Arc<AttributeGauge>) {
        let read = tokio::task::spawn_blocking(move || gauge.read());
        match tokio::time::timeout(self.config.query_timeout, read).await {
            Ok(Ok(Some(value))) => {
                let wire_name = name.to_string();
                match value {
                    MetricValue::Double(f) => self.client.gauge_float(&wire_name, f),
                    MetricValue::Signed(i) => self.client.gauge(&wire_name, i),
                    MetricValue::Unsigned(u) => self.client.gauge(&wire_name, u),
                }
            }
            Ok(Ok(None)) => {} // unreadable, no sample this cycle
            Ok(Err(e)) => warn!("gauge read task for {name} failed: {e}"),
            Err(_) => warn!("timed out reading gauge {name}"),
        }
    }
}

pub struct ExporterHandle {
    quit_sender: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ExporterHandle {
    /// Ask the export task to stop. No further cycles will run.
    pub fn stop(&self) {
        let _ = self.quit_sender.send(true);
    }

    pub async fn stopped(self) {
        self.stop();
        let _ = self.task.await;
    }
}
