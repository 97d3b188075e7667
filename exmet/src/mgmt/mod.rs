/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use log::debug;

use exmet_types::metrics::MetricValue;

mod name;
pub use name::{ResourceName, ResourceNameError};

/// The introspection seam to the process that hosts the routing engine and
/// the embedded server. Implementations resolve a resource name and
/// attribute to the current numeric value of that attribute.
pub trait ManagementInterface: Send + Sync {
    fn query(&self, resource: &ResourceName, attribute: &str) -> anyhow::Result<MetricValue>;
}

/// A gauge backed by one management-interface attribute. Every read is a
/// fresh query; nothing is cached in between.
pub struct AttributeGauge {
    resource: ResourceName,
    attribute: String,
    mgmt: Arc<dyn ManagementInterface>,
}

impl AttributeGauge {
    pub fn new<S: Into<String>>(
        resource: ResourceName,
        attribute: S,
        mgmt: Arc<dyn ManagementInterface>,
    ) -> Self {
        AttributeGauge {
            resource,
            attribute: attribute.into(),
            mgmt,
        }
    }

    #[inline]
    pub fn resource(&self) -> &ResourceName {
        &self.resource
    }

    #[inline]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Read the current value. A failed query means no sample this cycle,
    /// never an error for the caller.
    pub fn read(&self) -> Option<MetricValue> {
        match self.mgmt.query(&self.resource, &self.attribute) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(
                    "failed to read attribute {} of {}: {e:?}",
                    self.attribute, self.resource
                );
                None
            }
        }
    }
}
