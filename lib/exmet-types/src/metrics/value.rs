/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use memchr::memchr;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Double(f64),
    Signed(i64),
    Unsigned(u64),
}

impl MetricValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Double(f) => *f,
            MetricValue::Signed(i) => *i as f64,
            MetricValue::Unsigned(u) => *u as f64,
        }
    }
}

impl FromStr for MetricValue {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(anyhow!("empty string"));
        }

        if s.as_bytes()[0] == b'-' {
            match memchr(b'.', s.as_bytes()) {
                Some(_) => {
                    let f = f64::from_str(s).map_err(|e| anyhow!("invalid f64 string: {e}"))?;
                    Ok(MetricValue::Double(f))
                }
                None => {
                    let i = i64::from_str(s).map_err(|e| anyhow!("invalid i64 string: {e}"))?;
                    Ok(MetricValue::Signed(i))
                }
            }
        } else {
            match memchr(b'.', s.as_bytes()) {
                Some(_) => {
                    let f = f64::from_str(s).map_err(|e| anyhow!("invalid f64 string: {e}"))?;
                    Ok(MetricValue::Double(f))
                }
                None => {
                    let u = u64::from_str(s).map_err(|e| anyhow!("invalid u64 string: {e}"))?;
                    Ok(MetricValue::Unsigned(u))
                }
            }
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Unsigned(u) => f.write_str(itoa::Buffer::new().format(*u)),
            MetricValue::Signed(i) => f.write_str(itoa::Buffer::new().format(*i)),
            MetricValue::Double(v) => f.write_str(ryu::Buffer::new().format(*v)),
        }
    }
}
