/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

use exmet_types::metrics::MetricName;

use super::{StatsdBackend, StatsdClientConfig};

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

/// A socket address value, with `$VAR` indirecting through the environment.
fn as_env_sockaddr(v: &Yaml) -> anyhow::Result<SocketAddr> {
    let Yaml::String(s) = v else {
        return Err(anyhow!("yaml value type for 'SocketAddr' should be 'string'"));
    };
    let s = match s.strip_prefix('$') {
        Some(var) => std::env::var(var).map_err(|e| anyhow!("failed to read env var {var}: {e}"))?,
        None => s.to_string(),
    };
    SocketAddr::from_str(&s).map_err(|e| anyhow!("invalid SocketAddr value '{s}': {e}"))
}

fn as_ipaddr(v: &Yaml) -> anyhow::Result<IpAddr> {
    let Yaml::String(s) = v else {
        return Err(anyhow!("yaml value type for 'IpAddr' should be 'string'"));
    };
    IpAddr::from_str(s).map_err(|e| anyhow!("invalid IpAddr value '{s}': {e}"))
}

fn as_usize(v: &Yaml) -> anyhow::Result<usize> {
    match v {
        Yaml::Integer(i) => {
            usize::try_from(*i).map_err(|_| anyhow!("out of range integer value {i}"))
        }
        Yaml::String(s) => usize::from_str(s).map_err(|e| anyhow!("invalid usize string: {e}")),
        _ => Err(anyhow!("yaml value type for 'usize' should be 'integer'")),
    }
}

impl StatsdBackend {
    pub fn parse_udp_yaml(v: &Yaml) -> anyhow::Result<Self> {
        match v {
            Yaml::Hash(map) => {
                let mut addr: Option<SocketAddr> = None;
                let mut bind: Option<IpAddr> = None;

                foreach_kv(map, |k, v| match k {
                    "address" | "addr" => {
                        addr = Some(as_env_sockaddr(v).context(format!(
                            "invalid statsd udp peer socket address value for key {k}"
                        ))?);
                        Ok(())
                    }
                    "bind_ip" | "bind" => {
                        bind = Some(as_ipaddr(v).context(format!("invalid value for key {k}"))?);
                        Ok(())
                    }
                    _ => Err(anyhow!("invalid key {k}")),
                })?;

                if let Some(addr) = addr.take() {
                    Ok(StatsdBackend::Udp(addr, bind))
                } else {
                    Err(anyhow!("no target address has been set"))
                }
            }
            Yaml::String(_) => {
                let addr = as_env_sockaddr(v)?;
                Ok(StatsdBackend::Udp(addr, None))
            }
            _ => Err(anyhow!("invalid yaml value for udp statsd backend")),
        }
    }

    pub fn parse_tcp_yaml(v: &Yaml) -> anyhow::Result<Self> {
        match v {
            Yaml::Hash(map) => {
                let mut addr: Option<SocketAddr> = None;

                foreach_kv(map, |k, v| match k {
                    "address" | "addr" => {
                        addr = Some(as_env_sockaddr(v).context(format!(
                            "invalid statsd tcp peer socket address value for key {k}"
                        ))?);
                        Ok(())
                    }
                    _ => Err(anyhow!("invalid key {k}")),
                })?;

                if let Some(addr) = addr.take() {
                    Ok(StatsdBackend::Tcp(addr))
                } else {
                    Err(anyhow!("no target address has been set"))
                }
            }
            Yaml::String(_) => {
                let addr = as_env_sockaddr(v)?;
                Ok(StatsdBackend::Tcp(addr))
            }
            _ => Err(anyhow!("invalid yaml value for tcp statsd backend")),
        }
    }
}

impl StatsdClientConfig {
    pub fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        if let Yaml::Hash(map) = v {
            let mut config = StatsdClientConfig::default();
            foreach_kv(map, |k, v| config.set_by_yaml_kv(k, v))?;
            Ok(config)
        } else {
            Err(anyhow!(
                "yaml value type for 'statsd client config' should be 'map'"
            ))
        }
    }

    fn set_by_yaml_kv(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match k {
            "target_udp" | "backend_udp" => {
                let target = StatsdBackend::parse_udp_yaml(v)
                    .context(format!("invalid value for key {k}"))?;
                self.set_backend(target);
            }
            "target_tcp" | "backend_tcp" => {
                let target = StatsdBackend::parse_tcp_yaml(v)
                    .context(format!("invalid value for key {k}"))?;
                self.set_backend(target);
            }
            "target" | "backend" => {
                return if let Yaml::Hash(map) = v {
                    foreach_kv(map, |k, v| match k {
                        "udp" => {
                            let target = StatsdBackend::parse_udp_yaml(v)
                                .context(format!("invalid value for key {k}"))?;
                            self.set_backend(target);
                            Ok(())
                        }
                        "tcp" => {
                            let target = StatsdBackend::parse_tcp_yaml(v)
                                .context(format!("invalid value for key {k}"))?;
                            self.set_backend(target);
                            Ok(())
                        }
                        _ => Err(anyhow!("invalid key {k}")),
                    })
                    .context(format!("invalid value for key {k}"))
                } else {
                    Err(anyhow!("yaml value type for key {k} should be 'map'"))
                };
            }
            "prefix" => {
                let Yaml::String(s) = v else {
                    return Err(anyhow!("yaml value type for key {k} should be 'string'"));
                };
                let prefix = MetricName::parse(s)
                    .map_err(|e| anyhow!("invalid metric name value for key {k}: {e}"))?;
                self.set_prefix(prefix);
            }
            "cache_size" => {
                self.cache_size =
                    as_usize(v).context(format!("invalid usize value for key {k}"))?;
            }
            _ => return Err(anyhow!("invalid key {k}")),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use yaml_rust::YamlLoader;

    fn yaml_doc(s: &str) -> Yaml {
        YamlLoader::load_from_str(s).unwrap().pop().unwrap()
    }

    #[test]
    fn parse_udp_yaml_err() {
        let yaml = yaml_doc(r#"invalid_key: "value""#);
        assert!(StatsdBackend::parse_udp_yaml(&yaml).is_err());

        let yaml = yaml_doc(r#"address: "invalid-addr""#);
        assert!(StatsdBackend::parse_udp_yaml(&yaml).is_err());

        let yaml = yaml_doc(r#"bind_ip: "127.0.0.1""#);
        assert!(StatsdBackend::parse_udp_yaml(&yaml).is_err());

        let yaml = Yaml::Integer(123);
        assert!(StatsdBackend::parse_udp_yaml(&yaml).is_err());
    }

    #[test]
    fn parse_yaml_ok() {
        let yaml = yaml_doc(
            r#"
                target_udp: "127.0.0.1:8125"
                prefix: "myapp"
                cache_size: 512
            "#,
        );
        let config = StatsdClientConfig::parse_yaml(&yaml).unwrap();
        assert_eq!(
            config.backend,
            StatsdBackend::Udp(SocketAddr::from_str("127.0.0.1:8125").unwrap(), None)
        );
        assert_eq!(config.prefix, Some(MetricName::parse("myapp").unwrap()));
        assert_eq!(config.cache_size, 512);

        let yaml = yaml_doc(
            r#"
                backend_udp:
                  address: "192.168.1.1:9125"
                  bind_ip: "127.0.0.1"
                prefix: "test.prefix"
            "#,
        );
        let config = StatsdClientConfig::parse_yaml(&yaml).unwrap();
        assert_eq!(
            config.backend,
            StatsdBackend::Udp(
                SocketAddr::from_str("192.168.1.1:9125").unwrap(),
                Some(IpAddr::V4(Ipv4Addr::from_str("127.0.0.1").unwrap()))
            )
        );
        assert_eq!(
            config.prefix,
            Some(MetricName::parse("test.prefix").unwrap())
        );

        let yaml = yaml_doc(
            r#"
                target:
                  tcp:
                    addr: "10.0.0.1:8126"
            "#,
        );
        let config = StatsdClientConfig::parse_yaml(&yaml).unwrap();
        assert_eq!(
            config.backend,
            StatsdBackend::Tcp(SocketAddr::from_str("10.0.0.1:8126").unwrap())
        );
        assert_eq!(config.prefix, None);
    }

    #[test]
    fn parse_yaml_env_addr() {
        unsafe { std::env::set_var("TEST_STATSD_ADDR", "127.0.0.1:9125") };
        let yaml = yaml_doc(r#"target_udp: "$TEST_STATSD_ADDR""#);
        let config = StatsdClientConfig::parse_yaml(&yaml).unwrap();
        assert_eq!(
            config.backend,
            StatsdBackend::Udp(SocketAddr::from_str("127.0.0.1:9125").unwrap(), None)
        );
    }

    #[test]
    fn parse_yaml_err() {
        let yaml = yaml_doc(r#"invalid_key: "value""#);
        assert!(StatsdClientConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc(r#"target_udp: "invalid-address""#);
        assert!(StatsdClientConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc(r#"prefix: 123"#);
        assert!(StatsdClientConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc(r#"prefix: "not a name""#);
        assert!(StatsdClientConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc(r#"cache_size: -1"#);
        assert!(StatsdClientConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc(r#"target: "not_a_map""#);
        assert!(StatsdClientConfig::parse_yaml(&yaml).is_err());

        let yaml = Yaml::Null;
        assert!(StatsdClientConfig::parse_yaml(&yaml).is_err());
    }
}
