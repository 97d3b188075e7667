/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

use exmet_statsd_client::StatsdClientConfig;
use exmet_types::metrics::{MetricKind, MetricName};

use crate::export::{ExportFilter, ExporterConfig};
use crate::notify::NotifierPolicy;

const DEFAULT_EMIT_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_RESPONSE_FILTER_URL: &str = "/api/v1";

/// The full configuration surface, validated eagerly at parse time and
/// never mutated afterwards.
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Where and how to push samples.
    pub collector: StatsdClientConfig,
    pub emit_interval: Duration,
    /// Bound for one management-interface query inside an export cycle.
    pub query_timeout: Duration,
    pub filter: Option<ExportFilter>,
    pub policy: NotifierPolicy,
    /// URL pattern the response-code metrics filter is mounted on. The
    /// filter itself lives in the web layer and only consumes registry
    /// counters.
    pub response_filter_url: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            collector: StatsdClientConfig::default(),
            emit_interval: DEFAULT_EMIT_INTERVAL,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            filter: None,
            policy: NotifierPolicy::default(),
            response_filter_url: DEFAULT_RESPONSE_FILTER_URL.to_string(),
        }
    }
}

impl MetricsConfig {
    pub fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        if let Yaml::Hash(map) = v {
            let mut config = MetricsConfig::default();
            foreach_kv(map, |k, v| config.set_by_yaml_kv(k, v))?;
            Ok(config)
        } else {
            Err(anyhow!("yaml value type for 'metrics config' should be 'map'"))
        }
    }

    fn set_by_yaml_kv(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match k {
            "collector" | "statsd" => {
                self.collector = StatsdClientConfig::parse_yaml(v)
                    .context(format!("invalid statsd client config value for key {k}"))?;
            }
            "prefix" => {
                let Yaml::String(s) = v else {
                    return Err(anyhow!("yaml value type for key {k} should be 'string'"));
                };
                let prefix = MetricName::parse(s)
                    .map_err(|e| anyhow!("invalid metric name value for key {k}: {e}"))?;
                self.collector.set_prefix(prefix);
            }
            "emit_interval" | "polling_interval" => {
                let interval =
                    as_duration(v).context(format!("invalid duration value for key {k}"))?;
                if interval.is_zero() {
                    return Err(anyhow!("value for key {k} should not be zero"));
                }
                self.emit_interval = interval;
            }
            "query_timeout" => {
                self.query_timeout =
                    as_duration(v).context(format!("invalid duration value for key {k}"))?;
            }
            "filter" => {
                let filter =
                    as_export_filter(v).context(format!("invalid filter value for key {k}"))?;
                self.filter = Some(filter);
            }
            "events" => {
                self.policy = as_notifier_policy(v)
                    .context(format!("invalid notifier policy value for key {k}"))?;
            }
            "response_filter_url" => {
                let Yaml::String(s) = v else {
                    return Err(anyhow!("yaml value type for key {k} should be 'string'"));
                };
                self.response_filter_url = s.to_string();
            }
            _ => return Err(anyhow!("invalid key {k}")),
        }
        Ok(())
    }

    pub fn exporter_config(&self) -> ExporterConfig {
        ExporterConfig {
            emit_interval: self.emit_interval,
            query_timeout: self.query_timeout,
            filter: self.filter.clone(),
        }
    }
}

fn foreach_kv<F>(map: &yaml_rust::yaml::Hash, mut f: F) -> anyhow::Result<()>
where
    F: FnMut(&str, &Yaml) -> anyhow::Result<()>,
{
    for (k, v) in map.iter() {
        let Some(key) = k.as_str() else {
            return Err(anyhow!("the map key should be a string value"));
        };
        f(key, v)?;
    }
    Ok(())
}

fn as_duration(v: &Yaml) -> anyhow::Result<Duration> {
    match v {
        Yaml::Integer(i) => {
            let secs = u64::try_from(*i).map_err(|_| anyhow!("negative duration {i}"))?;
            Ok(Duration::from_secs(secs))
        }
        Yaml::String(s) => {
            if let Some(millis) = s.strip_suffix("ms") {
                let millis: u64 = millis.parse().map_err(|e| anyhow!("invalid millis: {e}"))?;
                Ok(Duration::from_millis(millis))
            } else if let Some(secs) = s.strip_suffix('s') {
                let secs: u64 = secs.parse().map_err(|e| anyhow!("invalid seconds: {e}"))?;
                Ok(Duration::from_secs(secs))
            } else if let Some(minutes) = s.strip_suffix('m') {
                let minutes: u64 = minutes.parse().map_err(|e| anyhow!("invalid minutes: {e}"))?;
                Ok(Duration::from_secs(minutes * 60))
            } else {
                let secs: u64 = s.parse().map_err(|e| anyhow!("invalid seconds: {e}"))?;
                Ok(Duration::from_secs(secs))
            }
        }
        _ => Err(anyhow!("yaml value type for 'duration' should be 'integer' or 'string'")),
    }
}

fn as_metric_name_list(v: &Yaml) -> anyhow::Result<Vec<MetricName>> {
    let as_name = |v: &Yaml| -> anyhow::Result<MetricName> {
        let Yaml::String(s) = v else {
            return Err(anyhow!("yaml value type for 'metric name' should be 'string'"));
        };
        MetricName::parse(s).map_err(|e| anyhow!("invalid metric name '{s}': {e}"))
    };
    match v {
        Yaml::Array(seq) => seq.iter().map(as_name).collect(),
        Yaml::String(_) => Ok(vec![as_name(v)?]),
        _ => Err(anyhow!("yaml value type should be 'string' or 'array'")),
    }
}

fn as_metric_kind(v: &Yaml) -> anyhow::Result<MetricKind> {
    let Yaml::String(s) = v else {
        return Err(anyhow!("yaml value type for 'metric kind' should be 'string'"));
    };
    match s.as_str() {
        "counter" => Ok(MetricKind::Counter),
        "meter" => Ok(MetricKind::Meter),
        "timer" => Ok(MetricKind::Timer),
        "gauge" => Ok(MetricKind::Gauge),
        _ => Err(anyhow!("invalid metric kind '{s}'")),
    }
}

fn as_export_filter(v: &Yaml) -> anyhow::Result<ExportFilter> {
    let Yaml::Hash(map) = v else {
        return Err(anyhow!("yaml value type for 'export filter' should be 'map'"));
    };
    let mut filter = ExportFilter::default();
    foreach_kv(map, |k, v| match k {
        "allow" => {
            for name in as_metric_name_list(v).context(format!("invalid value for key {k}"))? {
                filter = std::mem::take(&mut filter).with_allow(name);
            }
            Ok(())
        }
        "deny" => {
            for name in as_metric_name_list(v).context(format!("invalid value for key {k}"))? {
                filter = std::mem::take(&mut filter).with_deny(name);
            }
            Ok(())
        }
        "deny_kinds" => {
            let Yaml::Array(seq) = v else {
                return Err(anyhow!("yaml value type for key {k} should be 'array'"));
            };
            for kind in seq {
                let kind = as_metric_kind(kind).context(format!("invalid value for key {k}"))?;
                filter = std::mem::take(&mut filter).with_deny_kind(kind);
            }
            Ok(())
        }
        _ => Err(anyhow!("invalid key {k}")),
    })?;
    Ok(filter)
}

fn as_notifier_policy(v: &Yaml) -> anyhow::Result<NotifierPolicy> {
    let Yaml::Hash(map) = v else {
        return Err(anyhow!("yaml value type for 'notifier policy' should be 'map'"));
    };
    let mut policy = NotifierPolicy::default();
    foreach_kv(map, |k, v| {
        let Yaml::Boolean(b) = v else {
            return Err(anyhow!("yaml value type for key {k} should be 'boolean'"));
        };
        match k {
            "ignore_context_events" => policy.ignore_context_events = *b,
            "ignore_exchange_events" => policy.ignore_exchange_events = *b,
            "ignore_exchange_created" => policy.ignore_exchange_created = *b,
            "ignore_exchange_redelivery" => policy.ignore_exchange_redelivery = *b,
            "ignore_exchange_sending" => policy.ignore_exchange_sending = *b,
            "ignore_exchange_sent" => policy.ignore_exchange_sent = *b,
            "ignore_route_events" => policy.ignore_route_events = *b,
            "ignore_service_events" => policy.ignore_service_events = *b,
            _ => return Err(anyhow!("invalid key {k}")),
        }
        Ok(())
    })?;
    Ok(policy)
}
