/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use anyhow::{Context, anyhow};

use exmet_types::metrics::MetricName;

use crate::{StatsdClient, sink::StatsdMetricsSink};

#[cfg(feature = "yaml")]
mod yaml;

pub const DEFAULT_STATSD_PORT: u16 = 8125;
const DEFAULT_CACHE_SIZE: usize = 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatsdBackend {
    Udp(SocketAddr, Option<IpAddr>),
    Tcp(SocketAddr),
}

impl Default for StatsdBackend {
    fn default() -> Self {
        StatsdBackend::Udp(
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_STATSD_PORT),
            None,
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StatsdClientConfig {
    pub backend: StatsdBackend,
    pub prefix: Option<MetricName>,
    pub cache_size: usize,
}

impl Default for StatsdClientConfig {
    fn default() -> Self {
        StatsdClientConfig::new(StatsdBackend::default())
    }
}

impl StatsdClientConfig {
    pub fn new(backend: StatsdBackend) -> Self {
        StatsdClientConfig {
            backend,
            prefix: None,
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }

    pub fn set_backend(&mut self, backend: StatsdBackend) {
        self.backend = backend;
    }

    pub fn set_prefix(&mut self, prefix: MetricName) {
        self.prefix = Some(prefix);
    }

    pub fn build(&self) -> anyhow::Result<StatsdClient> {
        if self.cache_size == 0 {
            return Err(anyhow!("cache size should not be zero"));
        }
        let sink = match &self.backend {
            StatsdBackend::Udp(addr, bind) => {
                let bind_ip = bind.unwrap_or_else(|| match addr {
                    SocketAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    SocketAddr::V6(_) => IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED),
                });
                let socket = UdpSocket::bind(SocketAddr::new(bind_ip, 0))
                    .context(format!("failed to bind local udp socket to {bind_ip}"))?;
                StatsdMetricsSink::udp_with_capacity(*addr, socket, self.cache_size)
            }
            StatsdBackend::Tcp(addr) => {
                // the stream connects lazily on first send
                StatsdMetricsSink::tcp_with_capacity(*addr, self.cache_size)
            }
        };
        Ok(StatsdClient::new(self.prefix.clone(), sink))
    }
}
