/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use exmet_types::metrics::{MetricKind, MetricName};

/// Selects which registry entries one exporter publishes. Deny prefixes
/// win over allow prefixes; an empty allow list allows everything.
#[derive(Clone, Debug, Default)]
pub struct ExportFilter {
    allow: Vec<MetricName>,
    deny: Vec<MetricName>,
    deny_kinds: Vec<MetricKind>,
}

impl ExportFilter {
    pub fn with_allow(mut self, prefix: MetricName) -> Self {
        self.allow.push(prefix);
        self
    }

    pub fn with_deny(mut self, prefix: MetricName) -> Self {
        self.deny.push(prefix);
        self
    }

    pub fn with_deny_kind(mut self, kind: MetricKind) -> Self {
        self.deny_kinds.push(kind);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.deny.is_empty() && self.deny_kinds.is_empty()
    }

    pub fn matches(&self, name: &MetricName, kind: MetricKind) -> bool {
        if self.deny_kinds.contains(&kind) {
            return false;
        }
        if self.deny.iter().any(|p| name.starts_with(p)) {
            return false;
        }
        if self.allow.is_empty() {
            return true;
        }
        self.allow.iter().any(|p| name.starts_with(p))
    }
}
