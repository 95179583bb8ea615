//! # Mutation Dispatcher
//!
//! The single serialized worker behind a [`Console`](super::Console).
//! All terminal state — the output stream, the row counter, and the
//! pinned footer — is owned by the [`Worker`] and mutated only inside
//! its task, so the job queue itself is the synchronization mechanism:
//! no lock ever guards the stream.
//!
//! Jobs are executed strictly in the order they were enqueued. A write
//! failure degrades that one job's visual output (logged at `warn`,
//! reported to the submitter) and never stops the worker.

use std::io::{self, Write};

use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use super::{ansi, ConsoleError, Row};

/// Completion channel carried by each job.
pub(super) type Reply<T> = oneshot::Sender<Result<T, ConsoleError>>;

/// One serialized unit of terminal-mutation work.
///
/// Ownership of a job moves to the worker on enqueue; the submitter
/// keeps only the receiving half of the reply channel.
pub(super) enum Job {
    /// Append one row at the bottom of the console.
    Append { text: String, reply: Reply<Row> },
    /// Append several rows as one atomic unit — nothing interleaves
    /// between the individual writes and the footer repaints once.
    AppendBatch {
        texts: Vec<String>,
        reply: Reply<Vec<Row>>,
    },
    /// Rewrite an existing row in place.
    Edit {
        row: Row,
        text: String,
        reply: Reply<()>,
    },
    /// Replace the pinned footer line.
    SetSummary { text: String, reply: Reply<()> },
    /// Stop the worker after every previously enqueued job has run.
    Shutdown,
}

/// The footer's two modes. An empty summary text is `Absent`: no
/// footer line is rendered and appends skip the repaint entirely.
enum Footer {
    Absent,
    Pinned(String),
}

impl Footer {
    /// Re-emit the pinned line after an append. The append has already
    /// moved the cursor to a fresh line, so no clear is needed — only
    /// a carriage return, since a bare line feed does not reset the
    /// column. The text carries no trailing newline, parking the
    /// cursor at its end.
    fn repaint(&self, out: &mut impl Write) -> io::Result<()> {
        match self {
            Footer::Absent => Ok(()),
            Footer::Pinned(text) => write!(out, "\r{text}"),
        }
    }
}

/// Owns the output stream and all mutable console state.
pub(super) struct Worker<W> {
    out: W,
    rows: usize,
    footer: Footer,
}

impl<W: Write + Send> Worker<W> {
    pub(super) fn new(out: W) -> Self {
        Self {
            out,
            rows: 0,
            footer: Footer::Absent,
        }
    }

    /// Service jobs until shutdown, then hand the stream back.
    pub(super) async fn run(mut self, mut jobs: mpsc::UnboundedReceiver<Job>) -> W {
        while let Some(job) = jobs.recv().await {
            if matches!(job, Job::Shutdown) {
                break;
            }
            self.execute(job);
        }
        if let Err(err) = self.out.flush() {
            warn!(error = %err, "flush on console shutdown failed");
        }
        self.out
    }

    fn execute(&mut self, job: Job) {
        match job {
            Job::Append { text, reply } => {
                let res = self.append(vec![text]).map(|ids| ids[0]);
                let _ = reply.send(res);
            }
            Job::AppendBatch { texts, reply } => {
                let _ = reply.send(self.append(texts));
            }
            Job::Edit { row, text, reply } => {
                let _ = reply.send(self.edit(row, &text));
            }
            Job::SetSummary { text, reply } => {
                let _ = reply.send(self.set_summary(text));
            }
            Job::Shutdown => unreachable!("shutdown is handled by the run loop"),
        }
        // The footer line carries no newline, so nothing reaches the
        // terminal until we flush.
        if let Err(err) = self.out.flush() {
            warn!(error = %err, "console flush failed");
        }
    }

    /// Write rows consecutively, repaint the footer once at the end.
    ///
    /// Ids are allocated unconditionally, even when a write fails, so
    /// the cursor arithmetic of later edits stays aligned with the ids
    /// that were issued. The first I/O error is reported after the
    /// whole batch has been attempted.
    fn append(&mut self, texts: Vec<String>) -> Result<Vec<Row>, ConsoleError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::with_capacity(texts.len());
        let mut failure: Option<io::Error> = None;
        for text in &texts {
            let id = Row(self.rows);
            self.rows += 1;
            ids.push(id);
            if let Err(err) = self.write_row(text) {
                warn!(row = id.index(), error = %err, "row append lost to a write failure");
                failure.get_or_insert(err);
            }
        }
        if let Err(err) = self.footer.repaint(&mut self.out) {
            warn!(error = %err, "summary repaint lost to a write failure");
            failure.get_or_insert(err);
        }
        match failure {
            Some(err) => Err(err.into()),
            None => Ok(ids),
        }
    }

    fn write_row(&mut self, text: &str) -> io::Result<()> {
        ansi::clear_line(&mut self.out)?;
        writeln!(self.out, "{}", text.trim())
    }

    /// Rewrite row `row` in place.
    ///
    /// `offset` counts the lines between the cursor and the target,
    /// the target included; moving up, clearing, writing the
    /// replacement without a newline and moving back down leaves every
    /// other row untouched and the cursor on its original line.
    fn edit(&mut self, row: Row, text: &str) -> Result<(), ConsoleError> {
        if row.index() >= self.rows {
            return Err(ConsoleError::RowOutOfRange {
                row: row.index(),
                rows: self.rows,
            });
        }
        let offset = self.rows - row.index();
        ansi::cursor_up(&mut self.out, offset)?;
        ansi::clear_line(&mut self.out)?;
        write!(self.out, "{}", text.trim())?;
        ansi::cursor_down(&mut self.out, offset)?;
        Ok(())
    }

    /// Replace the footer line. The text is written verbatim with no
    /// trailing newline; an empty text clears the footer.
    fn set_summary(&mut self, text: String) -> Result<(), ConsoleError> {
        ansi::clear_line(&mut self.out)?;
        write!(self.out, "{text}")?;
        self.footer = if text.is_empty() {
            Footer::Absent
        } else {
            Footer::Pinned(text)
        };
        Ok(())
    }
}
