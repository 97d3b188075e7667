/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::{Arc, Mutex};

use anyhow::Context;
use log::info;

use crate::config::MetricsConfig;
use crate::export::{ExporterHandle, StatsdExporter};
use crate::mgmt::ManagementInterface;
use crate::notify::ExchangeMetricsNotifier;
use crate::registry::MetricRegistry;
use crate::server::{ServerMetricsPublisher, register_runtime_metric_set};

/// Owns the whole pipeline for one process: the registry, the event
/// notifier, the server gauge publisher and the export task.
///
/// Lifecycle: construct at startup, call [`on_server_ready`] once the
/// embedded server has bound its port, call [`shutdown`] at process exit.
/// Port-dependent gauge sets and the collector push never start before
/// the port is known.
///
/// [`on_server_ready`]: MetricsRuntime::on_server_ready
/// [`shutdown`]: MetricsRuntime::shutdown
pub struct MetricsRuntime {
    config: MetricsConfig,
    registry: Arc<MetricRegistry>,
    notifier: Arc<ExchangeMetricsNotifier>,
    publisher: ServerMetricsPublisher,
    exporter: Mutex<Option<ExporterHandle>>,
}

impl MetricsRuntime {
    pub fn new(config: MetricsConfig, mgmt: Arc<dyn ManagementInterface>) -> Self {
        let registry = Arc::new(MetricRegistry::new());
        register_runtime_metric_set(&registry, &mgmt);

        let notifier = Arc::new(ExchangeMetricsNotifier::new(
            registry.clone(),
            config.policy.clone(),
        ));
        let publisher = ServerMetricsPublisher::new(registry.clone(), mgmt);

        MetricsRuntime {
            config,
            registry,
            notifier,
            publisher,
            exporter: Mutex::new(None),
        }
    }

    #[inline]
    pub fn registry(&self) -> &Arc<MetricRegistry> {
        &self.registry
    }

    /// The event listener to hand to the routing engine.
    #[inline]
    pub fn notifier(&self) -> &Arc<ExchangeMetricsNotifier> {
        &self.notifier
    }

    /// To be called from the server-ready notification, with the actually
    /// bound listening port. Registers the server gauge sets and starts
    /// the export task. Must run inside a tokio runtime.
    pub fn on_server_ready(&self, port: u16) -> anyhow::Result<()> {
        self.publisher.server_ready(port)?;
        info!("server gauge sets registered for port {port}");

        let client = self
            .config
            .collector
            .build()
            .context("failed to build statsd client")?;
        let exporter =
            StatsdExporter::new(self.registry.clone(), client, self.config.exporter_config());
        let handle = exporter.spawn();
        *self.exporter.lock().unwrap() = Some(handle);
        info!(
            "statsd exporter started, interval {:?}",
            self.config.emit_interval
        );
        Ok(())
    }

    /// Stop the export task and drop all registry entries.
    pub fn shutdown(&self) {
        if let Some(handle) = self.exporter.lock().unwrap().take() {
            handle.stop();
        }
        self.registry.clear();
        info!("metrics runtime stopped");
    }
}
