/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

pub(super) struct TcpMetricsSink {
    addr: SocketAddr,
    stream: Option<TcpStream>,
}

impl TcpMetricsSink {
    pub(super) fn new(addr: SocketAddr) -> Self {
        TcpMetricsSink { addr, stream: None }
    }

    pub(super) fn send_msg(&mut self, msg: &[u8]) -> io::Result<usize> {
        let mut stream = match self.stream.take() {
            Some(s) => s,
            None => {
                let s = TcpStream::connect_timeout(&self.addr, CONNECT_TIMEOUT)?;
                s.set_nodelay(true)?;
                s
            }
        };

        // the stream framing is newline terminated lines; a failed write
        // drops the connection and the next send reconnects
        stream.write_all(msg)?;
        stream.write_all(b"\n")?;
        self.stream = Some(stream);
        Ok(msg.len() + 1)
    }
}
