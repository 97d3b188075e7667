/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Observe exchange lifecycle events from a routing engine and runtime
//! attributes of an embedded server, keep them as named metrics in a
//! central registry, and periodically push the registry to a StatsD
//! collector.

pub mod config;
pub mod event;
pub mod export;
pub mod mgmt;
pub mod notify;
pub mod registry;
pub mod server;

mod runtime;
pub use runtime::MetricsRuntime;

pub use exmet_types::metrics::{MetricKind, MetricName, MetricValue, NodeName};
