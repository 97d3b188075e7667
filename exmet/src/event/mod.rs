/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use chrono::{DateTime, Utc};

/// The exchange-scoped lifecycle notifications emitted by the routing
/// engine. Each variant maps to a fixed naming token, so metric names stay
/// stable no matter how the engine represents its notifications internally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExchangeEventKind {
    Created,
    Completed,
    Failed,
    Redelivery,
    Sending,
    Sent,
}

impl ExchangeEventKind {
    pub fn token(&self) -> &'static str {
        match self {
            ExchangeEventKind::Created => "ExchangeCreatedEvent",
            ExchangeEventKind::Completed => "ExchangeCompletedEvent",
            ExchangeEventKind::Failed => "ExchangeFailedEvent",
            ExchangeEventKind::Redelivery => "ExchangeRedeliveryEvent",
            ExchangeEventKind::Sending => "ExchangeSendingEvent",
            ExchangeEventKind::Sent => "ExchangeSentEvent",
        }
    }

    /// Completion-like events carry the full lifetime of the exchange and
    /// are recorded as durations. Redelivery is measured against the
    /// original creation timestamp even though the exchange is still in
    /// flight.
    pub fn is_completion_like(&self) -> bool {
        matches!(
            self,
            ExchangeEventKind::Completed
                | ExchangeEventKind::Failed
                | ExchangeEventKind::Redelivery
        )
    }
}

#[derive(Clone, Debug)]
pub struct ExchangeEvent {
    pub kind: ExchangeEventKind,
    /// The id of the route this exchange originated from, if the engine
    /// attributed it to one.
    pub from_route_id: Option<String>,
    /// The creation timestamp property the engine sets at exchange birth.
    pub created: Option<DateTime<Utc>>,
}

impl ExchangeEvent {
    pub fn new(kind: ExchangeEventKind) -> Self {
        ExchangeEvent {
            kind,
            from_route_id: None,
            created: None,
        }
    }
}

/// All notification kinds delivered by the routing engine. Only exchange
/// notifications are ever observed; the rest exist so the enablement policy
/// can name them explicitly.
#[derive(Clone, Debug)]
pub enum EngineEvent {
    Exchange(ExchangeEvent),
    Route,
    Service,
    Context,
}

impl EngineEvent {
    pub fn token(&self) -> &'static str {
        match self {
            EngineEvent::Exchange(e) => e.kind.token(),
            EngineEvent::Route => "RouteEvent",
            EngineEvent::Service => "ServiceEvent",
            EngineEvent::Context => "ContextEvent",
        }
    }
}
