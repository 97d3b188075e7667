/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourceNameError {
    #[error("missing ':' domain separator")]
    MissingDomain,
    #[error("empty domain")]
    EmptyDomain,
    #[error("empty property list")]
    EmptyProperties,
    #[error("invalid property '{0}'")]
    InvalidProperty(String),
}

/// The structured identifier of a management resource, in the form
/// `domain:key=value[,key=value]*`. Validated eagerly at parse time so a
/// malformed identifier never reaches the query path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceName {
    domain: String,
    properties: Vec<(String, String)>,
}

impl ResourceName {
    #[inline]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl FromStr for ResourceName {
    type Err = ResourceNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((domain, props)) = s.split_once(':') else {
            return Err(ResourceNameError::MissingDomain);
        };
        if domain.is_empty() {
            return Err(ResourceNameError::EmptyDomain);
        }
        if props.is_empty() {
            return Err(ResourceNameError::EmptyProperties);
        }

        let mut properties = Vec::new();
        for prop in props.split(',') {
            let Some((k, v)) = prop.split_once('=') else {
                return Err(ResourceNameError::InvalidProperty(prop.to_string()));
            };
            if k.is_empty() || v.is_empty() {
                return Err(ResourceNameError::InvalidProperty(prop.to_string()));
            }
            properties.push((k.to_string(), v.to_string()));
        }

        Ok(ResourceName {
            domain: domain.to_string(),
            properties,
        })
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.domain)?;
        for (i, (k, v)) in self.properties.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}
