/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::{SocketAddr, UdpSocket};
#[cfg(test)]
use std::rc::Rc;
#[cfg(test)]
use std::sync::Mutex;

#[cfg(test)]
mod buf;
#[cfg(test)]
use buf::BufMetricsSink;

mod udp;
use udp::UdpMetricsSink;

mod tcp;
use tcp::TcpMetricsSink;

enum MetricsSinkIo {
    #[cfg(test)]
    Buf(BufMetricsSink),
    Udp(UdpMetricsSink),
    Tcp(TcpMetricsSink),
}

impl MetricsSinkIo {
    fn send_msg(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            #[cfg(test)]
            MetricsSinkIo::Buf(b) => b.send_msg(buf),
            MetricsSinkIo::Udp(s) => s.send_msg(buf),
            MetricsSinkIo::Tcp(s) => s.send_msg(buf),
        }
    }
}

pub(crate) struct StatsdMetricsSink {
    cache_size: usize,
    buf: Vec<u8>,
    io: MetricsSinkIo,
}

impl StatsdMetricsSink {
    #[cfg(test)]
    pub(crate) fn buf_with_capacity(buf: Rc<Mutex<Vec<u8>>>, cache_size: usize) -> Self {
        StatsdMetricsSink {
            cache_size,
            buf: Vec::with_capacity(cache_size),
            io: MetricsSinkIo::Buf(BufMetricsSink::new(buf)),
        }
    }

    pub(crate) fn udp_with_capacity(
        addr: SocketAddr,
        socket: UdpSocket,
        cache_size: usize,
    ) -> Self {
        StatsdMetricsSink {
            cache_size,
            buf: Vec::with_capacity(cache_size),
            io: MetricsSinkIo::Udp(UdpMetricsSink::new(addr, socket)),
        }
    }

    pub(crate) fn tcp_with_capacity(addr: SocketAddr, cache_size: usize) -> Self {
        StatsdMetricsSink {
            cache_size,
            buf: Vec::with_capacity(cache_size),
            io: MetricsSinkIo::Tcp(TcpMetricsSink::new(addr)),
        }
    }

    pub(super) fn emit<F>(&mut self, msg_len: usize, format: F) -> io::Result<()>
    where
        F: Fn(&mut Vec<u8>),
    {
        if self.buf.is_empty() {
            format(&mut self.buf);
        } else if self.buf.len() + 1 + msg_len > self.cache_size {
            self.flush_buf()?;
            format(&mut self.buf);
        } else {
            self.buf.push(b'\n');
            format(&mut self.buf);
        }
        Ok(())
    }

    pub(super) fn flush(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        self.flush_buf()
    }

    fn flush_buf(&mut self) -> io::Result<()> {
        self.io.send_msg(&self.buf)?;
        self.buf.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;

    #[test]
    fn tcp_newline_framing() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let reader = std::thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut data = Vec::new();
            conn.read_to_end(&mut data).unwrap();
            data
        });

        let mut sink = StatsdMetricsSink::tcp_with_capacity(addr, 64);
        sink.emit(10, |buf| buf.extend_from_slice(b"test.a:1|c")).unwrap();
        sink.emit(10, |buf| buf.extend_from_slice(b"test.b:2|c")).unwrap();
        sink.flush().unwrap();
        drop(sink);

        let data = reader.join().unwrap();
        assert_eq!(data.as_slice(), b"test.a:1|c\ntest.b:2|c\n");
    }

    #[test]
    fn tcp_unreachable_returns_error() {
        // port 9 (discard) has no listener
        let addr = "127.0.0.1:9".parse().unwrap();
        let mut sink = StatsdMetricsSink::tcp_with_capacity(addr, 64);
        sink.emit(10, |buf| buf.extend_from_slice(b"test.a:1|c")).unwrap();
        assert!(sink.flush().is_err());
        // the next flush retries the connection instead of giving up
        assert!(sink.flush().is_err());
    }
}
