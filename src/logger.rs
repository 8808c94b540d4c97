//! Buffered logging of measurements to a tab separated file.
//!
//! Rows are collected in memory and only appended to the file once the
//! flush interval has passed, so a meter polled every few hundred
//! milliseconds does not rewrite a flash card continuously.

use chrono::Local;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::measurement::Measurement;
use crate::proto::conv::pretty_ts;
use crate::proto::Result;

pub const HEADER: [&str; 4] = ["timestamp", "function", "value", "unit"];

pub struct CsvLogger {
    path: PathBuf,
    flush_interval: Duration,
    last_write: Instant,
    buffer: VecDeque<[String; 4]>,
}

impl CsvLogger {
    /// Create (or truncate) the file and write the header line.
    pub fn create(path: impl AsRef<Path>, flush_interval: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut writer = Self::writer(File::create(&path)?);
        writer.write_record(HEADER)?;
        writer.flush()?;

        Ok(Self {
            path,
            flush_interval,
            last_write: Instant::now(),
            buffer: VecDeque::new(),
        })
    }

    fn writer<W: io::Write>(wtr: W) -> csv::Writer<W> {
        csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(wtr)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of rows waiting for the next write.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn log(&mut self, mea: &Measurement) -> Result<()> {
        self.buffer.push_back([
            pretty_ts(&Local::now()),
            mea.function_name().to_string(),
            mea.value.to_string(),
            mea.unit.clone(),
        ]);

        if self.last_write.elapsed() >= self.flush_interval {
            self.flush()?;
        }
        Ok(())
    }

    /// Append all buffered rows, regardless of the interval.
    pub fn flush(&mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            let file = OpenOptions::new().append(true).open(&self.path)?;
            let written = self.write_pending(&mut Self::writer(file))?;
            debug!("Wrote {} rows to {}", written, self.path.display());
        }
        self.last_write = Instant::now();
        Ok(())
    }

    /// Write buffered rows one at a time.
    ///
    /// A row leaves the buffer only after it reached the writer, so a
    /// failed write keeps exactly the rows that are not in the file yet.
    fn write_pending<W: io::Write>(&mut self, writer: &mut csv::Writer<W>) -> Result<usize> {
        let mut written = 0;
        while let Some(row) = self.buffer.front() {
            writer.write_record(row)?;
            writer.flush()?;
            self.buffer.pop_front();
            written += 1;
        }
        Ok(written)
    }
}

impl Drop for CsvLogger {
    fn drop(&mut self) {
        if let Err(err) = self.flush() {
            warn!(
                "Lost {} rows for {}: {}",
                self.buffer.len(),
                self.path.display(),
                err
            );
        }
    }
}
