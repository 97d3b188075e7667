/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::VecDeque;
use std::fmt::{self, Write};
use std::str::FromStr;

use super::{ParseError, chars_allowed_in_opentsdb};

/// A single validated metric name segment.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeName(String);

impl NodeName {
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get a NodeName from a str value
    ///
    /// # Safety
    ///
    /// Call this only if you need not use the value in metrics
    pub unsafe fn from_str_unchecked(name: &str) -> Self {
        NodeName(name.to_string())
    }
}

impl FromStr for NodeName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseError::Empty);
        }
        chars_allowed_in_opentsdb(s)?;
        Ok(NodeName(s.to_string()))
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// A dotted metric name, an ordered sequence of validated segments.
///
/// Building the same segments always yields the same name, so names derived
/// from an event token and a route id are stable across the process lifetime.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricName {
    nodes: VecDeque<NodeName>,
}

impl MetricName {
    /// Build a name from individual segments. Rejects an empty segment
    /// list and any invalid segment.
    pub fn build<I, S>(segments: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut nodes = VecDeque::new();
        for segment in segments {
            nodes.push_back(NodeName::from_str(segment.as_ref())?);
        }
        if nodes.is_empty() {
            return Err(ParseError::Empty);
        }
        Ok(MetricName { nodes })
    }

    /// Parse a dotted name string such as `thread-pool.connectionCount`.
    pub fn parse(s: &str) -> Result<Self, ParseError> {
        MetricName::build(s.split('.'))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeName> {
        self.nodes.iter()
    }

    /// The number of bytes of the dotted rendering.
    pub fn encoded_len(&self) -> usize {
        let chars: usize = self.nodes.iter().map(|n| n.len()).sum();
        chars + self.nodes.len() - 1
    }

    pub fn starts_with(&self, prefix: &MetricName) -> bool {
        if prefix.nodes.len() > self.nodes.len() {
            return false;
        }
        prefix.nodes.iter().zip(self.nodes.iter()).all(|(p, n)| p == n)
    }
}

impl FromStr for MetricName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricName::parse(s)
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.nodes.iter();
        let Some(n) = iter.next() else {
            return Ok(());
        };
        f.write_str(n.as_str())?;
        for n in iter {
            f.write_char('.')?;
            f.write_str(n.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_simple() {
        let name = MetricName::build(["ExchangeCompletedEvent", "orderRoute"]).unwrap();
        assert_eq!(name.to_string(), "ExchangeCompletedEvent.orderRoute");
        assert_eq!(name.encoded_len(), name.to_string().len());
    }

    #[test]
    fn build_idempotent() {
        let a = MetricName::build(["thread-pool", "connectionCount"]).unwrap();
        let b = MetricName::build(["thread-pool", "connectionCount"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn build_empty() {
        assert_eq!(
            MetricName::build(Vec::<&str>::new()).unwrap_err(),
            ParseError::Empty
        );
        assert_eq!(MetricName::build([""]).unwrap_err(), ParseError::Empty);
    }

    #[test]
    fn build_invalid_segment() {
        assert!(MetricName::build(["a b"]).is_err());
        assert!(MetricName::build(["ok", "no:colon"]).is_err());
        assert!(MetricName::build(["with.dot"]).is_err());
    }

    #[test]
    fn parse_dotted() {
        let name = MetricName::parse("request-processor.maxTime").unwrap();
        assert_eq!(name.nodes().count(), 2);
        assert_eq!(name.to_string(), "request-processor.maxTime");
        assert!(MetricName::parse("trailing.").is_err());
        assert!(MetricName::parse("").is_err());
    }

    #[test]
    fn starts_with_prefix() {
        let name = MetricName::parse("thread-pool.currentThreadsBusy").unwrap();
        let prefix = MetricName::parse("thread-pool").unwrap();
        let other = MetricName::parse("request-processor").unwrap();
        assert!(name.starts_with(&prefix));
        assert!(name.starts_with(&name));
        assert!(!name.starts_with(&other));
        assert!(!prefix.starts_with(&name));
    }
}
