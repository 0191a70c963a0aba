//! Plain-TCP bridge streaming reading batches to a connected client.
//!
//! One client is served at a time, in line with the single downstream
//! collector the simulation feeds. Each new batch goes out as one JSON
//! line; a client that stops reading is dropped and the bridge returns to
//! accepting.

use crate::metrics::BRIDGE_CONNECTED;
use lathe_core::{Reading, ReadingExchange};
use serde::Serialize;
use std::io::{self, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct BridgeConfig {
    pub bind_addr: String,
    pub publish_interval: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:7878".to_string(),
            publish_interval: Duration::from_millis(250),
        }
    }
}

/// Envelope framing one batch on the wire.
#[derive(Debug, Serialize)]
struct BatchMsg<'a> {
    #[serde(rename = "type")]
    msg_type: &'static str,
    sequence: u64,
    readings: &'a [Reading],
}

pub struct Bridge {
    listener: TcpListener,
    config: BridgeConfig,
}

impl Bridge {
    /// Bind the listening socket up front so the caller learns the bound
    /// port (the configured address may use port 0) before serving starts.
    pub fn bind(config: BridgeConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(&config.bind_addr)?;
        listener.set_nonblocking(true)?;
        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until the stop flag is raised.
    pub fn run(&self, exchange: Arc<ReadingExchange>, stop: &AtomicBool) {
        info!(addr = %self.config.bind_addr, "bridge listening");
        while !stop.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    info!(client_addr = %peer, "bridge client connected");
                    BRIDGE_CONNECTED.set(1.0);
                    if let Err(err) = self.serve_client(stream, &exchange, stop) {
                        debug!(client_addr = %peer, error = %err, "bridge client dropped");
                    }
                    BRIDGE_CONNECTED.set(0.0);
                    info!(client_addr = %peer, "bridge client disconnected");
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(50));
                }
                Err(err) => {
                    warn!(error = %err, "bridge accept failed");
                    thread::sleep(Duration::from_millis(50));
                }
            }
        }
    }

    /// Stream every batch the client has not yet seen, newest-wins: a
    /// client that connects late starts from the current batch, not the
    /// beginning of the run.
    fn serve_client(
        &self,
        mut stream: TcpStream,
        exchange: &ReadingExchange,
        stop: &AtomicBool,
    ) -> io::Result<()> {
        stream.set_nodelay(true)?;
        let mut last_sequence = 0u64;
        while !stop.load(Ordering::Relaxed) {
            if let Some(batch) = exchange.latest() {
                if batch.sequence > last_sequence {
                    last_sequence = batch.sequence;
                    let msg = BatchMsg {
                        msg_type: "readings",
                        sequence: batch.sequence,
                        readings: &batch.readings,
                    };
                    let line = serde_json::to_vec(&msg)?;
                    stream.write_all(&line)?;
                    stream.write_all(b"\n")?;
                    stream.flush()?;
                }
            }
            thread::sleep(self.config.publish_interval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lathe_core::Reading;
    use std::io::BufRead;
    use std::io::BufReader;

    #[test]
    fn streams_published_batches_as_json_lines() {
        let exchange = Arc::new(ReadingExchange::new());
        exchange.publish(vec![Reading::new("lathe", 1).with("rpm", 500.0)]);

        let bridge = Bridge::bind(BridgeConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            publish_interval: Duration::from_millis(10),
        })
        .unwrap();
        let addr = bridge.local_addr().unwrap();

        let stop = Arc::new(AtomicBool::new(false));
        let stop_bridge = Arc::clone(&stop);
        let exchange_bridge = Arc::clone(&exchange);
        let handle = thread::spawn(move || bridge.run(exchange_bridge, &stop_bridge));

        let stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let mut reader = BufReader::new(stream);

        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let msg: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(msg["type"], "readings");
        assert_eq!(msg["sequence"], 1);
        assert_eq!(msg["readings"][0]["asset"], "lathe");

        // A second publish reaches the same client.
        exchange.publish(vec![Reading::new("latheCurrent", 2).with("current", 150.0)]);
        line.clear();
        reader.read_line(&mut line).unwrap();
        let msg: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(msg["sequence"], 2);
        assert_eq!(msg["readings"][0]["asset"], "latheCurrent");

        stop.store(true, Ordering::Relaxed);
        handle.join().unwrap();
    }
}
