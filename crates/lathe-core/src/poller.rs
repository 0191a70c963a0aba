use crate::device::Device;
use crate::exchange::{ReadingBatch, ReadingExchange};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub poll_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PollerStats {
    pub polls: u64,
    pub poll_errors: u64,
    pub readings_emitted: u64,
    /// Polls that missed their deadline by more than a full interval.
    pub overruns: u64,
    pub max_lag_us: u64,
}

/// Receives every batch the poller produces, in order.
pub trait ReadingSink: Send {
    fn consume(&mut self, batch: &ReadingBatch);
}

/// Fixed-cadence polling loop around a device.
///
/// Each batch is published to the exchange for observers and handed to the
/// registered sinks. Pacing uses an absolute deadline so jitter in one poll
/// does not drift the schedule.
pub struct Poller<D: Device> {
    device: Arc<D>,
    config: PollerConfig,
    exchange: Arc<ReadingExchange>,
    sinks: Vec<Box<dyn ReadingSink>>,
    stats: PollerStats,
}

impl<D: Device> Poller<D> {
    pub fn new(device: Arc<D>, config: PollerConfig, exchange: Arc<ReadingExchange>) -> Self {
        Self {
            device,
            config,
            exchange,
            sinks: Vec::new(),
            stats: PollerStats::default(),
        }
    }

    pub fn add_sink(&mut self, sink: Box<dyn ReadingSink>) {
        self.sinks.push(sink);
    }

    /// Run until the stop flag is raised, then shut the device down.
    pub fn run(&mut self, stop: &AtomicBool) {
        let mut next_poll = Instant::now();
        while !stop.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now < next_poll {
                thread::sleep(next_poll - now);
            } else {
                let lag = now.duration_since(next_poll);
                if lag > self.config.poll_interval {
                    self.stats.overruns += 1;
                }
                self.stats.max_lag_us = self.stats.max_lag_us.max(lag.as_micros() as u64);
            }

            match self.device.poll() {
                Ok(readings) => {
                    self.stats.polls += 1;
                    self.stats.readings_emitted += readings.len() as u64;
                    let batch = self.exchange.publish(readings);
                    for sink in &mut self.sinks {
                        sink.consume(&batch);
                    }
                }
                Err(err) => {
                    self.stats.poll_errors += 1;
                    log::warn!("device poll failed: {err}");
                }
            }

            next_poll += self.config.poll_interval;
        }
        self.device.shutdown();
    }

    pub fn stats(&self) -> &PollerStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceError;
    use crate::reading::Reading;
    use std::sync::atomic::AtomicU64;
    use std::sync::Mutex;

    struct StubDevice {
        polls: AtomicU64,
        shutdowns: AtomicU64,
    }

    impl StubDevice {
        fn new() -> Self {
            Self {
                polls: AtomicU64::new(0),
                shutdowns: AtomicU64::new(0),
            }
        }
    }

    impl Device for StubDevice {
        fn poll(&self) -> Result<Vec<Reading>, DeviceError> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Reading::new("stub", n).with("value", n as f64)])
        }

        fn shutdown(&self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct CollectingSink {
        sequences: Arc<Mutex<Vec<u64>>>,
    }

    impl ReadingSink for CollectingSink {
        fn consume(&mut self, batch: &ReadingBatch) {
            self.sequences.lock().unwrap().push(batch.sequence);
        }
    }

    #[test]
    fn polls_until_stopped_and_shuts_down() {
        let device = Arc::new(StubDevice::new());
        let exchange = Arc::new(ReadingExchange::new());
        let sequences = Arc::new(Mutex::new(Vec::new()));

        let mut poller = Poller::new(
            Arc::clone(&device),
            PollerConfig {
                poll_interval: Duration::from_millis(20),
            },
            Arc::clone(&exchange),
        );
        poller.add_sink(Box::new(CollectingSink {
            sequences: Arc::clone(&sequences),
        }));

        let stop = Arc::new(AtomicBool::new(false));
        let stop_poller = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            poller.run(&stop_poller);
            poller.stats().clone()
        });

        thread::sleep(Duration::from_millis(150));
        stop.store(true, Ordering::Relaxed);
        let stats = handle.join().unwrap();

        assert!(stats.polls >= 3);
        assert_eq!(stats.poll_errors, 0);
        assert_eq!(stats.readings_emitted, stats.polls);
        assert_eq!(device.shutdowns.load(Ordering::SeqCst), 1);

        // Every batch reached the sink, in order, and the exchange holds
        // the newest one.
        let seen = sequences.lock().unwrap();
        let expected: Vec<u64> = (1..=stats.polls).collect();
        assert_eq!(*seen, expected);
        assert_eq!(exchange.latest().unwrap().sequence, stats.polls);
    }

    struct FailingDevice;

    impl Device for FailingDevice {
        fn poll(&self) -> Result<Vec<Reading>, DeviceError> {
            Err(DeviceError::NotStarted)
        }

        fn shutdown(&self) {}
    }

    #[test]
    fn poll_errors_are_counted_not_fatal() {
        let exchange = Arc::new(ReadingExchange::new());
        let mut poller = Poller::new(
            Arc::new(FailingDevice),
            PollerConfig {
                poll_interval: Duration::from_millis(10),
            },
            Arc::clone(&exchange),
        );
        let stop = Arc::new(AtomicBool::new(false));
        let stop_poller = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            poller.run(&stop_poller);
            poller.stats().clone()
        });
        thread::sleep(Duration::from_millis(60));
        stop.store(true, Ordering::Relaxed);
        let stats = handle.join().unwrap();

        assert_eq!(stats.polls, 0);
        assert!(stats.poll_errors >= 2);
        assert!(exchange.latest().is_none());
    }
}
