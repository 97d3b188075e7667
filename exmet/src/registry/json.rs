/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use serde_json::{Map, Value, json};

use super::{MetricEntry, MetricRegistry};

/// Render the current registry content for the monitoring read endpoint.
///
/// Gauges are listed by kind only: their values are read on demand by the
/// export cycle, and reading them here would turn a cheap snapshot into a
/// round of management-interface queries.
pub fn registry_to_json(registry: &MetricRegistry) -> Value {
    let mut map = Map::new();
    for (name, entry) in registry.snapshot() {
        let value = match entry {
            MetricEntry::Counter(c) => json!({
                "type": "counter",
                "count": c.value(),
            }),
            MetricEntry::Meter(m) => json!({
                "type": "meter",
                "count": m.count(),
                "mean_rate": m.mean_rate(),
            }),
            MetricEntry::Timer(t) => {
                let stats = t.stats();
                json!({
                    "type": "timer",
                    "count": stats.count,
                    "min": stats.min,
                    "max": stats.max,
                    "mean": stats.mean,
                    "p50": stats.p50,
                    "p95": stats.p95,
                    "p99": stats.p99,
                })
            }
            MetricEntry::Gauge(_) => json!({
                "type": "gauge",
            }),
        };
        map.insert(name.to_string(), value);
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exmet_types::metrics::MetricName;

    #[test]
    fn render_counter_and_timer() {
        let registry = MetricRegistry::new();
        let counter = registry
            .counter(&MetricName::parse("responseCode.2xx").unwrap())
            .unwrap();
        counter.add(7);
        let timer = registry
            .timer(&MetricName::parse("ExchangeCompletedEvent.orderRoute").unwrap())
            .unwrap();
        timer.update_millis(120);

        let value = registry_to_json(&registry);
        assert_eq!(value["responseCode.2xx"]["type"], "counter");
        assert_eq!(value["responseCode.2xx"]["count"], 7);
        assert_eq!(value["ExchangeCompletedEvent.orderRoute"]["type"], "timer");
        assert_eq!(value["ExchangeCompletedEvent.orderRoute"]["count"], 1);
    }
}
