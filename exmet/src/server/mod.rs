/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{error, warn};
use thiserror::Error;

use exmet_types::metrics::MetricName;

use crate::mgmt::{AttributeGauge, ManagementInterface, ResourceName};
use crate::registry::MetricRegistry;

const THREAD_POOL_PREFIX: &str = "thread-pool";
const THREAD_POOL_ATTRIBUTES: &[&str] =
    &["currentThreadCount", "currentThreadsBusy", "connectionCount"];

const REQUEST_PROCESSOR_PREFIX: &str = "request-processor";
const REQUEST_PROCESSOR_ATTRIBUTES: &[&str] = &["maxTime", "requestCount", "errorCount"];

const RUNTIME_PREFIX: &str = "runtime";
const RUNTIME_MEMORY_RESOURCE: &str = "runtime:type=Memory";
const RUNTIME_THREADS_RESOURCE: &str = "runtime:type=Threads";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServerMetricsError {
    #[error("server listening port is not bound yet")]
    PortNotBound,
    #[error("server gauge sets already registered")]
    AlreadyRegistered,
}

fn thread_pool_resource(port: u16) -> String {
    format!("server:type=ThreadPool,name=http-{port}")
}

fn request_processor_resource(port: u16) -> String {
    format!("server:type=GlobalRequestProcessor,name=http-{port}")
}

fn register_attribute_gauges(
    registry: &MetricRegistry,
    mgmt: &Arc<dyn ManagementInterface>,
    prefix: &str,
    resource_str: &str,
    attributes: &[&str],
) {
    // a malformed resource name loses this set only, never the others
    let resource = match ResourceName::from_str(resource_str) {
        Ok(resource) => resource,
        Err(e) => {
            error!("invalid management resource name '{resource_str}': {e}");
            return;
        }
    };

    for attribute in attributes {
        let name = match MetricName::build([prefix, attribute]) {
            Ok(name) => name,
            Err(e) => {
                error!("invalid gauge metric name '{prefix}.{attribute}': {e}");
                continue;
            }
        };
        let gauge = AttributeGauge::new(resource.clone(), *attribute, mgmt.clone());
        if let Err(e) = registry.register_gauge(name, gauge) {
            warn!("failed to register gauge: {e}");
        }
    }
}

/// Registers the runtime gauge set. These resources do not depend on any
/// listening port, so this happens eagerly at startup.
pub fn register_runtime_metric_set(registry: &MetricRegistry, mgmt: &Arc<dyn ManagementInterface>) {
    register_attribute_gauges(
        registry,
        mgmt,
        RUNTIME_PREFIX,
        RUNTIME_MEMORY_RESOURCE,
        &["used", "committed"],
    );
    register_attribute_gauges(
        registry,
        mgmt,
        RUNTIME_PREFIX,
        RUNTIME_THREADS_RESOURCE,
        &["threadCount"],
    );
}

/// Registers the embedded-server gauge sets once the listening port is
/// actually bound. Port selection happens at server start, not process
/// start, so registration must wait for the server-ready notification.
pub struct ServerMetricsPublisher {
    registry: Arc<MetricRegistry>,
    mgmt: Arc<dyn ManagementInterface>,
    registered: AtomicBool,
}

impl ServerMetricsPublisher {
    pub fn new(registry: Arc<MetricRegistry>, mgmt: Arc<dyn ManagementInterface>) -> Self {
        ServerMetricsPublisher {
            registry,
            mgmt,
            registered: AtomicBool::new(false),
        }
    }

    /// Register the thread-pool and request-processor gauge sets for the
    /// server listening on `port`. Port 0 means the caller never learned
    /// the real port and is rejected.
    pub fn server_ready(&self, port: u16) -> Result<(), ServerMetricsError> {
        if port == 0 {
            return Err(ServerMetricsError::PortNotBound);
        }
        if self.registered.swap(true, Ordering::AcqRel) {
            return Err(ServerMetricsError::AlreadyRegistered);
        }

        register_attribute_gauges(
            &self.registry,
            &self.mgmt,
            THREAD_POOL_PREFIX,
            &thread_pool_resource(port),
            THREAD_POOL_ATTRIBUTES,
        );
        register_attribute_gauges(
            &self.registry,
            &self.mgmt,
            REQUEST_PROCESSOR_PREFIX,
            &request_processor_resource(port),
            REQUEST_PROCESSOR_ATTRIBUTES,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exmet_types::metrics::{MetricKind, MetricValue};

    struct FakeServer;

    impl ManagementInterface for FakeServer {
        fn query(&self, resource: &ResourceName, attribute: &str) -> anyhow::Result<MetricValue> {
            if resource.property("type") == Some("ThreadPool") && attribute == "currentThreadsBusy"
            {
                Ok(MetricValue::Unsigned(4))
            } else {
                Ok(MetricValue::Unsigned(0))
            }
        }
    }

    fn publisher() -> (Arc<MetricRegistry>, ServerMetricsPublisher) {
        let registry = Arc::new(MetricRegistry::new());
        let publisher = ServerMetricsPublisher::new(registry.clone(), Arc::new(FakeServer));
        (registry, publisher)
    }

    #[test]
    fn reject_unbound_port() {
        let (registry, publisher) = publisher();
        assert_eq!(
            publisher.server_ready(0),
            Err(ServerMetricsError::PortNotBound)
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn register_once() {
        let (registry, publisher) = publisher();
        publisher.server_ready(8081).unwrap();
        assert_eq!(
            publisher.server_ready(8081),
            Err(ServerMetricsError::AlreadyRegistered)
        );
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn gauge_names_and_values() {
        let (registry, publisher) = publisher();
        publisher.server_ready(8081).unwrap();

        let snap = registry.snapshot();
        let names: Vec<String> = snap.iter().map(|(n, _)| n.to_string()).collect();
        for expected in [
            "thread-pool.currentThreadCount",
            "thread-pool.currentThreadsBusy",
            "thread-pool.connectionCount",
            "request-processor.maxTime",
            "request-processor.requestCount",
            "request-processor.errorCount",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }

        let busy = snap
            .iter()
            .find(|(n, _)| n.to_string() == "thread-pool.currentThreadsBusy")
            .unwrap();
        let crate::registry::MetricEntry::Gauge(gauge) = &busy.1 else {
            panic!("expected a gauge");
        };
        assert_eq!(busy.1.kind(), MetricKind::Gauge);
        assert_eq!(gauge.read(), Some(MetricValue::Unsigned(4)));
        assert_eq!(
            gauge.resource().to_string(),
            "server:type=ThreadPool,name=http-8081"
        );
    }

    #[test]
    fn runtime_set_is_port_free() {
        let registry = MetricRegistry::new();
        let mgmt: Arc<dyn ManagementInterface> = Arc::new(FakeServer);
        register_runtime_metric_set(&registry, &mgmt);
        assert_eq!(registry.len(), 3);
        let names: Vec<String> = registry
            .snapshot()
            .iter()
            .map(|(n, _)| n.to_string())
            .collect();
        assert_eq!(
            names,
            ["runtime.committed", "runtime.threadCount", "runtime.used"]
        );
    }
}
