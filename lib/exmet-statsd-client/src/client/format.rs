/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use itoa::Integer;
use ryu::Float;
use smallvec::SmallVec;

use super::StatsdClient;

enum MetricType {
    Count,
    Gauge,
    Timing,
}

impl MetricType {
    fn as_str(&self) -> &'static str {
        match self {
            MetricType::Count => "c",
            MetricType::Gauge => "g",
            MetricType::Timing => "ms",
        }
    }
}

impl StatsdClient {
    pub fn count<T: Integer>(&mut self, name: &str, value: T) {
        let mut buffer = itoa::Buffer::new();
        let value = buffer.format(value);
        self.emit_metric(MetricType::Count, name, value.as_bytes());
    }

    pub fn gauge<T: Integer>(&mut self, name: &str, value: T) {
        let mut buffer = itoa::Buffer::new();
        let value = buffer.format(value);
        self.emit_metric(MetricType::Gauge, name, value.as_bytes());
    }

    pub fn gauge_float<T: Float>(&mut self, name: &str, value: T) {
        let mut buffer = ryu::Buffer::new();
        let value = buffer.format(value);
        self.emit_metric(MetricType::Gauge, name, value.as_bytes());
    }

    pub fn timing_ms<T: Integer>(&mut self, name: &str, value: T) {
        let mut buffer = itoa::Buffer::new();
        let value = buffer.format(value);
        self.emit_metric(MetricType::Timing, name, value.as_bytes());
    }

    fn emit_metric(&mut self, metric_type: MetricType, name: &str, value: &[u8]) {
        let value: SmallVec<[u8; 16]> = SmallVec::from_slice(value);
        let prefix_len = self
            .prefix
            .as_ref()
            .map(|p| p.encoded_len() + 1)
            .unwrap_or(0);
        let msg_len = prefix_len + name.len() + 1 + value.len() + 1 + metric_type.as_str().len();

        let prefix = self.prefix.as_ref();
        let sink = &mut self.sink;
        let r = sink.emit(msg_len, |buf| {
            if let Some(prefix) = prefix {
                for node in prefix.nodes() {
                    buf.extend_from_slice(node.as_str().as_bytes());
                    buf.push(b'.');
                }
            }
            buf.extend_from_slice(name.as_bytes());
            buf.push(b':');
            buf.extend_from_slice(value.as_slice());
            buf.push(b'|');
            buf.extend_from_slice(metric_type.as_str().as_bytes());
        });
        if let Err(e) = r {
            self.handle_emit_error(e);
        }
    }
}
