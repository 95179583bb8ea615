//! # Concurrent Console
//!
//! Serialized, line-addressable terminal output for concurrent tasks.
//!
//! ## Overview
//!
//! A [`Console`] accepts mutation requests from any number of tasks
//! and applies them one at a time, in submission order, through a
//! single dispatcher task. Three kinds of mutation exist:
//!
//! - appending rows at the bottom ([`ConsoleHandle::append_row`],
//!   [`ConsoleHandle::append_rows`]),
//! - rewriting an earlier row in place ([`ConsoleHandle::edit_row`]),
//! - pinning a summary footer that is re-emitted after every append
//!   ([`ConsoleHandle::set_summary`]).
//!
//! Every operation enqueues immediately and returns a [`Pending`]
//! future. Awaiting it yields the operation's result; dropping it
//! never cancels the job, so fire-and-forget callers simply discard
//! the future.
//!
//! ## Ordering
//!
//! The order rows appear on the terminal is exactly the order in which
//! jobs were handed to the dispatcher, no matter how many tasks
//! submit concurrently. Row ids are issued by the dispatcher alone:
//! strictly increasing from 0, never reused, contiguous within a
//! single [`ConsoleHandle::append_rows`] batch.
//!
//! ## Preconditions
//!
//! The cursor arithmetic behind [`ConsoleHandle::edit_row`] assumes
//! every row occupies exactly one terminal line. Rows wider than the
//! terminal wrap and break that assumption; the console does not
//! detect or compensate for wrapping.
//!
//! ## Example
//!
//! ```no_run
//! # async fn demo() -> Result<(), lineup::ConsoleError> {
//! use lineup::Console;
//!
//! let console = Console::stdout();
//! console.set_summary("0/2 done");
//! let row = console.append_row("fetching...").await?;
//! console.edit_row(row, "fetching... ok");
//! console.close().await?;
//! # Ok(())
//! # }
//! ```

mod ansi;
mod dispatcher;

use std::future::Future;
use std::io::{self, Write};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use dispatcher::{Job, Worker};

/// Errors reported by console operations.
///
/// A write failure degrades a single job's visual output and is
/// reported to that job's submitter only; the dispatcher keeps
/// running and keeps accepting jobs.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// The underlying terminal write failed.
    #[error("terminal write failed: {0}")]
    Io(#[from] io::Error),
    /// The edited row id was never issued by this console.
    #[error("row {row} out of range: console holds {rows} rows")]
    RowOutOfRange { row: usize, rows: usize },
    /// The console has been closed; the job was not executed.
    #[error("console closed")]
    Closed,
}

/// Stable identifier of an appended row: its zero-based ordinal.
///
/// Issued only by the dispatcher, strictly increasing over the
/// console's lifetime, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Row(usize);

impl Row {
    /// The row's zero-based position.
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for Row {
    /// Address a row by a recorded index. The dispatcher still guards
    /// against indexes it never issued.
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl std::fmt::Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The eventual result of an enqueued console job.
///
/// The job is already in the queue when a `Pending` is handed out;
/// dropping the future does not cancel it. Awaiting resolves once the
/// dispatcher has executed the job (or with [`ConsoleError::Closed`]
/// if the console shut down first).
pub struct Pending<T> {
    rx: oneshot::Receiver<Result<T, ConsoleError>>,
}

impl<T> Future for Pending<T> {
    type Output = Result<T, ConsoleError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(res)) => Poll::Ready(res),
            Poll::Ready(Err(_)) => Poll::Ready(Err(ConsoleError::Closed)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Cheap, clonable submission side of a [`Console`].
///
/// Hand clones to producer tasks; the owning `Console` keeps the
/// dispatcher alive and is the only place [`Console::close`] exists.
#[derive(Clone)]
pub struct ConsoleHandle {
    jobs: mpsc::UnboundedSender<Job>,
}

impl ConsoleHandle {
    /// Append one row at the bottom of the console.
    ///
    /// The text is trimmed and written on its own line; the summary,
    /// if one is pinned, is re-emitted below it. Resolves to the new
    /// row's id.
    pub fn append_row(&self, text: impl Into<String>) -> Pending<Row> {
        let text = text.into();
        self.submit(|reply| Job::Append { text, reply })
    }

    /// Append several rows as one atomic unit.
    ///
    /// No other job interleaves between the individual rows, and the
    /// summary is re-emitted exactly once, after the whole batch.
    /// Resolves to the new ids, contiguous and in input order. An
    /// empty batch is a no-op resolving to an empty vec.
    pub fn append_rows<I, S>(&self, texts: I) -> Pending<Vec<Row>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let texts = texts.into_iter().map(Into::into).collect();
        self.submit(|reply| Job::AppendBatch { texts, reply })
    }

    /// Rewrite the row `row` in place, leaving every other row and the
    /// summary untouched.
    ///
    /// Resolves to [`ConsoleError::RowOutOfRange`] if `row` was never
    /// issued. Assumes rows have not wrapped (see the module docs).
    pub fn edit_row(&self, row: Row, text: impl Into<String>) -> Pending<()> {
        let text = text.into();
        self.submit(|reply| Job::Edit { row, text, reply })
    }

    /// Pin `text` as the summary footer, replacing any previous one.
    ///
    /// The summary is written without a trailing newline and re-drawn
    /// after every subsequent append, so it always stays the last
    /// line. An empty text un-pins the footer.
    pub fn set_summary(&self, text: impl Into<String>) -> Pending<()> {
        let text = text.into();
        self.submit(|reply| Job::SetSummary { text, reply })
    }

    /// Enqueue a job, or resolve with `Closed` when the dispatcher is
    /// gone.
    fn submit<T>(&self, make: impl FnOnce(dispatcher::Reply<T>) -> Job) -> Pending<T> {
        let (tx, rx) = oneshot::channel();
        // A failed send drops the job together with its reply sender,
        // which resolves the Pending to Closed.
        let _ = self.jobs.send(make(tx));
        Pending { rx }
    }
}

/// An asynchronous console over an exclusively owned output stream.
///
/// Constructed once per interactive session. The stream, the row
/// counter and the summary text all live inside the dispatcher task;
/// [`Console::close`] drains the queue and hands the stream back.
pub struct Console<W> {
    handle: ConsoleHandle,
    worker: JoinHandle<W>,
}

impl Console<io::Stdout> {
    /// A console over standard output.
    ///
    /// Must be called from within a tokio runtime.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send + 'static> Console<W> {
    /// Spawn the dispatcher over `out` and return the owning console.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(out: W) -> Self {
        let (jobs, queue) = mpsc::unbounded_channel();
        let worker = tokio::spawn(Worker::new(out).run(queue));
        Self {
            handle: ConsoleHandle { jobs },
            worker,
        }
    }

    /// A clonable handle for producer tasks.
    pub fn handle(&self) -> ConsoleHandle {
        self.handle.clone()
    }

    /// Drain every job enqueued so far, stop the dispatcher, flush,
    /// and return the output stream.
    ///
    /// Jobs submitted through outstanding handles after this point
    /// resolve to [`ConsoleError::Closed`].
    pub async fn close(self) -> Result<W, ConsoleError> {
        // FIFO queue: everything enqueued before the shutdown marker
        // is serviced first.
        let _ = self.handle.jobs.send(Job::Shutdown);
        self.worker.await.map_err(|_| ConsoleError::Closed)
    }

    /// Append one row; see [`ConsoleHandle::append_row`].
    pub fn append_row(&self, text: impl Into<String>) -> Pending<Row> {
        self.handle.append_row(text)
    }

    /// Append an atomic batch; see [`ConsoleHandle::append_rows`].
    pub fn append_rows<I, S>(&self, texts: I) -> Pending<Vec<Row>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.handle.append_rows(texts)
    }

    /// Rewrite a row in place; see [`ConsoleHandle::edit_row`].
    pub fn edit_row(&self, row: Row, text: impl Into<String>) -> Pending<()> {
        self.handle.edit_row(row, text)
    }

    /// Pin the summary footer; see [`ConsoleHandle::set_summary`].
    pub fn set_summary(&self, text: impl Into<String>) -> Pending<()> {
        self.handle.set_summary(text)
    }
}
