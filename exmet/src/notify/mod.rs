/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;

use chrono::Utc;
use log::debug;

use exmet_types::metrics::MetricName;

use crate::event::{EngineEvent, ExchangeEvent};
use crate::registry::MetricRegistry;

/// Which notification kinds the notifier observes. Applied once at start;
/// the flags never change at runtime.
///
/// The defaults observe exchange completions and failures only.
#[derive(Clone, Debug)]
pub struct NotifierPolicy {
    pub ignore_context_events: bool,
    pub ignore_exchange_events: bool,
    pub ignore_exchange_created: bool,
    pub ignore_exchange_redelivery: bool,
    pub ignore_exchange_sending: bool,
    pub ignore_exchange_sent: bool,
    pub ignore_route_events: bool,
    pub ignore_service_events: bool,
}

impl Default for NotifierPolicy {
    fn default() -> Self {
        NotifierPolicy {
            ignore_context_events: true,
            ignore_exchange_events: false,
            ignore_exchange_created: true,
            ignore_exchange_redelivery: true,
            ignore_exchange_sending: true,
            ignore_exchange_sent: true,
            ignore_route_events: true,
            ignore_service_events: true,
        }
    }
}

impl NotifierPolicy {
    fn allows(&self, event: &EngineEvent) -> bool {
        match event {
            EngineEvent::Exchange(e) => {
                if self.ignore_exchange_events {
                    return false;
                }
                use crate::event::ExchangeEventKind::*;
                match e.kind {
                    Created => !self.ignore_exchange_created,
                    Redelivery => !self.ignore_exchange_redelivery,
                    Sending => !self.ignore_exchange_sending,
                    Sent => !self.ignore_exchange_sent,
                    Completed | Failed => true,
                }
            }
            EngineEvent::Route => !self.ignore_route_events,
            EngineEvent::Service => !self.ignore_service_events,
            EngineEvent::Context => !self.ignore_context_events,
        }
    }
}

/// Receives routing-engine notifications and turns them into metric
/// updates. Safe to call from any number of threads concurrently; every
/// update is a per-metric atomic operation.
///
/// Events without a route id are discarded so unattributed exchanges never
/// pollute the registry.
pub struct ExchangeMetricsNotifier {
    registry: Arc<MetricRegistry>,
    policy: NotifierPolicy,
}

impl ExchangeMetricsNotifier {
    pub fn new(registry: Arc<MetricRegistry>, policy: NotifierPolicy) -> Self {
        ExchangeMetricsNotifier { registry, policy }
    }

    pub fn on_event(&self, event: &EngineEvent) {
        if !self.policy.allows(event) {
            return;
        }

        let EngineEvent::Exchange(exchange) = event else {
            debug!("not covered: {} ({event:?})", event.token());
            return;
        };

        let Some(route_id) = exchange.from_route_id.as_deref() else {
            return;
        };
        if route_id.is_empty() {
            return;
        }

        let name = match MetricName::build([exchange.kind.token(), route_id]) {
            Ok(name) => name,
            Err(e) => {
                debug!("unusable route id '{route_id}' for metric name: {e}");
                return;
            }
        };

        if exchange.kind.is_completion_like() {
            self.on_exchange_completed(exchange, &name);
        } else {
            match self.registry.meter(&name) {
                Ok(meter) => meter.mark(),
                Err(e) => debug!("failed to mark meter {name}: {e}"),
            }
        }
    }

    fn on_exchange_completed(&self, exchange: &ExchangeEvent, name: &MetricName) {
        let Some(created) = exchange.created else {
            debug!("{name} has no creation timestamp, no duration recorded");
            return;
        };
        let millis = Utc::now()
            .signed_duration_since(created)
            .num_milliseconds()
            .max(0) as u64;

        match self.registry.timer(name) {
            Ok(timer) => timer.update_millis(millis),
            Err(e) => debug!("failed to update timer {name}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ExchangeEventKind;
    use chrono::Duration;

    fn notifier() -> (Arc<MetricRegistry>, ExchangeMetricsNotifier) {
        let registry = Arc::new(MetricRegistry::new());
        let notifier = ExchangeMetricsNotifier::new(registry.clone(), NotifierPolicy::default());
        (registry, notifier)
    }

    fn exchange(
        kind: ExchangeEventKind,
        route: Option<&str>,
        elapsed_ms: Option<i64>,
    ) -> EngineEvent {
        EngineEvent::Exchange(ExchangeEvent {
            kind,
            from_route_id: route.map(|s| s.to_string()),
            created: elapsed_ms.map(|ms| Utc::now() - Duration::milliseconds(ms)),
        })
    }

    #[test]
    fn completed_updates_timer() {
        let (registry, notifier) = notifier();
        notifier.on_event(&exchange(
            ExchangeEventKind::Completed,
            Some("orderRoute"),
            Some(120),
        ));

        let name = MetricName::parse("ExchangeCompletedEvent.orderRoute").unwrap();
        let timer = registry.timer(&name).unwrap();
        assert_eq!(timer.count(), 1);
        let stats = timer.stats();
        assert!(stats.max >= 100, "recorded {} ms", stats.max);
        assert!(stats.max < 5000, "recorded {} ms", stats.max);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn failed_updates_timer() {
        let (registry, notifier) = notifier();
        notifier.on_event(&exchange(
            ExchangeEventKind::Failed,
            Some("orderRoute"),
            Some(50),
        ));

        let name = MetricName::parse("ExchangeFailedEvent.orderRoute").unwrap();
        assert_eq!(registry.timer(&name).unwrap().count(), 1);
    }

    #[test]
    fn empty_route_discards() {
        let (registry, notifier) = notifier();
        notifier.on_event(&exchange(ExchangeEventKind::Failed, Some(""), Some(50)));
        notifier.on_event(&exchange(ExchangeEventKind::Completed, None, Some(50)));
        assert!(registry.is_empty());
    }

    #[test]
    fn ignored_kinds_record_nothing() {
        let (registry, notifier) = notifier();
        for kind in [
            ExchangeEventKind::Created,
            ExchangeEventKind::Redelivery,
            ExchangeEventKind::Sending,
            ExchangeEventKind::Sent,
        ] {
            notifier.on_event(&exchange(kind, Some("orderRoute"), Some(50)));
        }
        notifier.on_event(&EngineEvent::Route);
        notifier.on_event(&EngineEvent::Service);
        notifier.on_event(&EngineEvent::Context);
        assert!(registry.is_empty());
    }

    #[test]
    fn missing_creation_timestamp_records_no_sample() {
        let (registry, notifier) = notifier();
        notifier.on_event(&exchange(
            ExchangeEventKind::Completed,
            Some("orderRoute"),
            None,
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn observed_sent_marks_meter() {
        // a policy that lets sent events through records them as rate only
        let registry = Arc::new(MetricRegistry::new());
        let policy = NotifierPolicy {
            ignore_exchange_sent: false,
            ..Default::default()
        };
        let notifier = ExchangeMetricsNotifier::new(registry.clone(), policy);
        let event = exchange(ExchangeEventKind::Sent, Some("orderRoute"), Some(10));
        notifier.on_event(&event);
        notifier.on_event(&event);

        let name = MetricName::parse("ExchangeSentEvent.orderRoute").unwrap();
        assert_eq!(registry.meter(&name).unwrap().count(), 2);
    }

    #[test]
    fn observed_redelivery_counts_as_duration() {
        // redelivery keeps completion semantics when a policy observes it,
        // measured against the original creation timestamp
        let registry = Arc::new(MetricRegistry::new());
        let policy = NotifierPolicy {
            ignore_exchange_redelivery: false,
            ..Default::default()
        };
        let notifier = ExchangeMetricsNotifier::new(registry.clone(), policy);
        notifier.on_event(&exchange(
            ExchangeEventKind::Redelivery,
            Some("orderRoute"),
            Some(80),
        ));

        let name = MetricName::parse("ExchangeRedeliveryEvent.orderRoute").unwrap();
        assert_eq!(registry.timer(&name).unwrap().count(), 1);
    }

    #[test]
    fn same_route_same_metric_instance() {
        let (registry, notifier) = notifier();
        let event = exchange(ExchangeEventKind::Completed, Some("orderRoute"), Some(10));
        notifier.on_event(&event);
        notifier.on_event(&event);

        let name = MetricName::parse("ExchangeCompletedEvent.orderRoute").unwrap();
        assert_eq!(registry.timer(&name).unwrap().count(), 2);
        assert_eq!(registry.len(), 1);
    }
}
