/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod sink;
use sink::StatsdMetricsSink;

mod client;
pub use client::StatsdClient;

mod config;
pub use config::{StatsdBackend, StatsdClientConfig};
