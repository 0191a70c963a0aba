use lathe_core::{ReadingBatch, ReadingSink};
use std::io::{BufWriter, Write};

/// Writes every reading of every batch as one JSON line.
///
/// This is the lossless output path; the runtime mounts it on stdout so the
/// full telemetry stream can be piped into a collector. Write failures are
/// logged and the affected batch skipped, the simulation never stops for a
/// broken pipe.
pub struct JsonLineSink<W: Write + Send> {
    writer: BufWriter<W>,
}

impl<W: Write + Send> JsonLineSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }
}

impl<W: Write + Send> ReadingSink for JsonLineSink<W> {
    fn consume(&mut self, batch: &ReadingBatch) {
        for reading in &batch.readings {
            let result = serde_json::to_writer(&mut self.writer, reading)
                .map_err(std::io::Error::from)
                .and_then(|()| self.writer.write_all(b"\n"));
            if let Err(err) = result {
                tracing::warn!(error = %err, "failed to write reading");
                return;
            }
        }
        if let Err(err) = self.writer.flush() {
            tracing::warn!(error = %err, "failed to flush readings");
        }
    }
}
