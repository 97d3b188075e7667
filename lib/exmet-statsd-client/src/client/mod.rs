/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::time::Instant;

use log::warn;

use exmet_types::metrics::MetricName;

use crate::StatsdMetricsSink;

mod format;

pub struct StatsdClient {
    prefix: Option<MetricName>,
    sink: StatsdMetricsSink,

    create_instant: Instant,
    last_error_report: u64,
}

impl StatsdClient {
    pub(crate) fn new(prefix: Option<MetricName>, sink: StatsdMetricsSink) -> Self {
        StatsdClient {
            prefix,
            sink,
            create_instant: Instant::now(),
            last_error_report: 0,
        }
    }

    pub fn flush_sink(&mut self) {
        if let Err(e) = self.sink.flush() {
            self.handle_emit_error(e);
        }
    }

    fn handle_emit_error(&mut self, e: io::Error) {
        let time_slice = self.create_instant.elapsed().as_secs().rotate_right(6); // every 64s
        if self.last_error_report != time_slice {
            warn!("sending metrics error: {e:?}");
            self.last_error_report = time_slice;
        }
    }
}
