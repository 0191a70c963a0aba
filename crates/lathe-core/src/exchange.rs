use crate::reading::Reading;
use std::sync::{Arc, Mutex};

/// A sequence-numbered batch of readings from one poll.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingBatch {
    pub sequence: u64,
    pub readings: Vec<Reading>,
}

struct State {
    next_sequence: u64,
    batch: Option<Arc<ReadingBatch>>,
}

/// Latest-batch slot between the poller and observer threads.
///
/// Observers (bridge, metrics updater) take the most recent batch and use
/// the sequence number to skip work when nothing new has arrived. An
/// observer that falls behind sees only the newest batch; the complete
/// stream flows through the poller's sinks instead.
pub struct ReadingExchange {
    state: Mutex<State>,
}

impl ReadingExchange {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_sequence: 1,
                batch: None,
            }),
        }
    }

    /// Publish the next batch, assigning it a sequence number.
    pub fn publish(&self, readings: Vec<Reading>) -> Arc<ReadingBatch> {
        let mut state = self.state.lock().unwrap();
        let batch = Arc::new(ReadingBatch {
            sequence: state.next_sequence,
            readings,
        });
        state.next_sequence += 1;
        state.batch = Some(Arc::clone(&batch));
        batch
    }

    /// Most recently published batch, if any.
    pub fn latest(&self) -> Option<Arc<ReadingBatch>> {
        self.state.lock().unwrap().batch.clone()
    }
}

impl Default for ReadingExchange {
    fn default() -> Self {
        Self::new()
    }
}
