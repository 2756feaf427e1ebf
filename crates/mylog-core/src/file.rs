//! Asynchronous, rotating file logger.
//!
//! Logging calls never touch the disk: they push the record onto a bounded
//! queue with `try_send` and return. If the queue is full the record is
//! dropped and counted. A single background task on a dedicated runtime
//! thread owns both files (`<name>` and `<name>.err`) and does all writing
//! and rotation, so neither needs a lock.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::runtime::Runtime;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::{LoggerConfig, SinkConfig};
use crate::error::{MylogError, Result};
use crate::level::Level;
use crate::logger::Log;
use crate::record::LogRecord;
use crate::rotation::RotatingFile;

/// Messages for the writer task.
enum Command {
    Record(LogRecord),
    /// Reply once everything queued before this command is written.
    Flush(oneshot::Sender<()>),
}

/// The non-blocking file logger.
///
/// `close()` (or dropping the logger) resumes a paused writer, closes the
/// queue and waits up to the configured drain timeout for queued records to
/// be written. Whatever is still queued after that is discarded.
///
/// `close()`, `flush()` and `Drop` block the current thread until the writer
/// answers. They are safe to call from inside another tokio runtime, but they
/// do park that runtime's worker for the duration.
pub struct FileLogger {
    level: Level,
    main_path: PathBuf,
    err_path: PathBuf,
    sender: Option<mpsc::Sender<Command>>,
    paused: watch::Sender<bool>,
    dropped: AtomicU64,
    worker: Option<JoinHandle<()>>,
    /// Keeps the writer thread alive; `None` once closed.
    runtime: Option<Runtime>,
    drain_timeout: Duration,
}

impl FileLogger {
    /// Opens (creating if needed) `<dir>/<name>` and `<dir>/<name>.err` and
    /// starts the writer task. Fails if either file cannot be opened.
    pub fn new(config: &LoggerConfig) -> Result<Self> {
        config.validate()?;
        let SinkConfig::File { dir, name, max_size } = &config.sink else {
            return Err(MylogError::InvalidConfig(
                "FileLogger needs a file sink config".to_string(),
            ));
        };

        std::fs::create_dir_all(dir)?;
        let main_path = dir.join(name);
        let err_path = dir.join(format!("{name}.err"));
        let main = RotatingFile::open(&main_path, *max_size)?;
        let errors = RotatingFile::open(&err_path, *max_size)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("mylog-writer")
            .enable_all()
            .build()
            .map_err(|e| MylogError::Runtime(e.to_string()))?;

        let (sender, receiver) = mpsc::channel::<Command>(config.queue_capacity);
        let (paused, paused_rx) = watch::channel(config.start_paused);
        let worker = runtime.spawn(writer_task(receiver, paused_rx, main, errors));

        info!(
            file = %main_path.display(),
            max_size,
            queue = config.queue_capacity,
            level = %config.level,
            "FileLogger initialized"
        );

        Ok(Self {
            level: config.level,
            main_path,
            err_path,
            sender: Some(sender),
            paused,
            dropped: AtomicU64::new(0),
            worker: Some(worker),
            runtime: Some(runtime),
            drain_timeout: config.drain_timeout(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.main_path
    }

    pub fn error_path(&self) -> &Path {
        &self.err_path
    }

    /// Records dropped because the queue was full (or the logger closed).
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stops the writer from taking records off the queue. Logging calls keep
    /// queueing and start dropping once the queue is full.
    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    /// Blocks until every record queued before this call has been written.
    /// Never returns while the writer is paused.
    pub fn flush(&self) -> Result<()> {
        let (Some(sender), Some(runtime)) = (self.sender.as_ref(), self.runtime.as_ref()) else {
            return Err(MylogError::ChannelClosed);
        };
        let (tx, rx) = oneshot::channel();
        block_on_writer(runtime, async {
            sender
                .send(Command::Flush(tx))
                .await
                .map_err(|_| MylogError::ChannelClosed)?;
            rx.await.map_err(|_| MylogError::ChannelClosed)
        })
        .unwrap_or(Err(MylogError::ChannelClosed))
    }

    /// Drains the queue (bounded by the drain timeout) and closes both files.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(runtime) = self.runtime.take() else {
            return;
        };
        self.paused.send_replace(false);
        // Dropping the only sender lets the writer see the end of the queue.
        drop(self.sender.take());

        if let Some(worker) = self.worker.take() {
            let timeout = self.drain_timeout;
            // The timer must belong to the writer runtime, so build it in there.
            let drained =
                block_on_writer(&runtime, async move { tokio::time::timeout(timeout, worker).await });
            match drained {
                Some(Ok(Ok(()))) => debug!(file = %self.main_path.display(), "FileLogger closed"),
                Some(Ok(Err(e))) => error!("Log writer task failed: {}", e),
                None => error!("Log drain thread panicked"),
                Some(Err(_)) => warn!(
                    file = %self.main_path.display(),
                    "Timed out after {:?} draining log queue; discarding the rest",
                    timeout
                ),
            }
        }
        runtime.shutdown_background();
    }
}

/// Drives `fut` on the writer runtime from a scoped OS thread. The calling
/// thread may itself be inside a tokio runtime, where `block_on` panics.
/// Returns `None` if the helper thread panicked.
fn block_on_writer<F>(runtime: &Runtime, fut: F) -> Option<F::Output>
where
    F: Future + Send,
    F::Output: Send,
{
    std::thread::scope(|s| s.spawn(|| runtime.block_on(fut)).join().ok())
}

impl Log for FileLogger {
    fn threshold(&self) -> Level {
        self.level
    }

    fn write_record(&self, record: LogRecord) {
        let Some(sender) = self.sender.as_ref() else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        };
        match sender.try_send(Command::Record(record)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

impl Drop for FileLogger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ─── Background writer ───────────────────────────────────────────────────────

async fn writer_task(
    mut receiver: mpsc::Receiver<Command>,
    mut paused: watch::Receiver<bool>,
    mut main: RotatingFile,
    mut errors: RotatingFile,
) {
    loop {
        let cmd = if *paused.borrow_and_update() {
            match paused.changed().await {
                Ok(()) => continue,
                // Logger is gone; nobody can resume us, so finish the queue.
                Err(_) => receiver.recv().await,
            }
        } else {
            tokio::select! {
                biased;

                Ok(()) = paused.changed() => continue,
                cmd = receiver.recv() => cmd,
            }
        };

        match cmd {
            Some(Command::Record(record)) => write_record(&mut main, &mut errors, &record),
            Some(Command::Flush(reply)) => {
                flush_files(&mut main, &mut errors);
                let _ = reply.send(());
            }
            None => break,
        }
    }
    flush_files(&mut main, &mut errors);
}

/// Main file always; `.err` file only for ERROR and above. Each file rotates
/// on its own. A failed rotation or write drops the line for that file.
fn write_record(main: &mut RotatingFile, errors: &mut RotatingFile, record: &LogRecord) {
    let line = record.render();
    if let Err(e) = main.write_line(&line) {
        error!(file = %main.path().display(), "Dropped log record: {}", e);
    }
    if record.level().is_error() {
        if let Err(e) = errors.write_line(&line) {
            error!(file = %errors.path().display(), "Dropped log record: {}", e);
        }
    }
}

fn flush_files(main: &mut RotatingFile, errors: &mut RotatingFile) {
    for file in [main, errors] {
        if let Err(e) = file.flush() {
            error!(file = %file.path().display(), "Failed to flush log file: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Caller;
    use tempfile::TempDir;

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn creates_both_files_on_construction() {
        let tmp = TempDir::new().unwrap();
        let config = LoggerConfig::file(Level::Debug, tmp.path().join("logs"), "app.log", 1024);
        let logger = FileLogger::new(&config).unwrap();
        assert!(logger.path().exists());
        assert!(logger.error_path().exists());
        assert!(logger.error_path().ends_with("app.log.err"));
        logger.close();
    }

    #[test]
    fn rejects_console_config() {
        let err = FileLogger::new(&LoggerConfig::console(Level::Info)).err().unwrap();
        assert!(matches!(err, MylogError::InvalidConfig(_)));
    }

    #[test]
    fn flush_waits_for_queued_records() {
        let tmp = TempDir::new().unwrap();
        let config = LoggerConfig::file(Level::Debug, tmp.path(), "app.log", 1 << 20);
        let logger = FileLogger::new(&config).unwrap();

        for i in 0..20 {
            logger.log(Level::Info, Caller::default(), format_args!("line {i}"));
        }
        logger.flush().unwrap();

        assert_eq!(read_lines(logger.path()).len(), 20);
        logger.close();
    }

    #[test]
    fn records_below_threshold_are_not_queued() {
        let tmp = TempDir::new().unwrap();
        let config = LoggerConfig::file(Level::Warn, tmp.path(), "app.log", 1 << 20);
        let logger = FileLogger::new(&config).unwrap();

        logger.debug(format_args!("skip"));
        logger.info(format_args!("skip"));
        logger.warn(format_args!("keep"));
        logger.flush().unwrap();

        let lines = read_lines(logger.path());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("[WARN]"));
        assert!(lines[0].ends_with("keep"));
        logger.close();
    }

    #[test]
    fn paused_writer_leaves_records_queued() {
        let tmp = TempDir::new().unwrap();
        let config =
            LoggerConfig::file(Level::Debug, tmp.path(), "app.log", 1 << 20).paused(true);
        let logger = FileLogger::new(&config).unwrap();

        logger.info(format_args!("waiting"));
        std::thread::sleep(Duration::from_millis(50));
        assert!(read_lines(logger.path()).is_empty());

        logger.resume();
        logger.flush().unwrap();
        assert_eq!(read_lines(logger.path()).len(), 1);
        logger.close();
    }

    #[test]
    fn flush_after_close_path_reports_closed() {
        let tmp = TempDir::new().unwrap();
        let config = LoggerConfig::file(Level::Debug, tmp.path(), "app.log", 1 << 20);
        let mut logger = FileLogger::new(&config).unwrap();
        logger.shutdown();

        assert!(matches!(logger.flush(), Err(MylogError::ChannelClosed)));
        logger.info(format_args!("too late"));
        assert_eq!(logger.dropped(), 1);
    }
}
