//! Console integration tests
//!
//! Every test drives a `Console` over a `Vec<u8>` sink, closes it to
//! recover the captured bytes, and asserts on the raw escape stream
//! and/or on the visible lines after replaying the stream through a
//! vt100 virtual terminal.

use std::io::{self, Write};

use lineup::{Console, ConsoleError, Row};

/// Sink that refuses any write carrying the `boom` marker, leaving
/// every other write untouched. Content-based so the failure lands
/// deterministically on the chosen row regardless of how the
/// formatting machinery splits its writes.
struct FailingWriter {
    inner: Vec<u8>,
}

impl FailingWriter {
    fn new() -> Self {
        Self { inner: Vec::new() }
    }
}

impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.windows(4).any(|window| window == b"boom") {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "write refused"));
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Replay captured console output and return the visible lines.
fn replay(bytes: &[u8]) -> Vec<String> {
    let mut parser = vt100::Parser::new(30, 80, 0);
    parser.process(bytes);
    parser
        .screen()
        .contents()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Count non-overlapping occurrences of `needle` in `haystack`.
fn occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .windows(needle.len())
        .filter(|window| *window == needle)
        .count()
}

#[tokio::test]
async fn test_append_returns_contiguous_ids_in_output_order() {
    let console = Console::new(Vec::new());

    let mut producers = Vec::new();
    for n in 0..12 {
        let handle = console.handle();
        producers.push(tokio::spawn(async move {
            let text = format!("line from producer {n}");
            let row = handle.append_row(text.clone()).await?;
            Ok::<_, ConsoleError>((row, text))
        }));
    }

    let mut rows = Vec::new();
    for producer in producers {
        rows.push(producer.await.expect("producer panicked").expect("append"));
    }

    // Ids form 0..12 with no gaps or repeats.
    let mut ids: Vec<usize> = rows.iter().map(|(row, _)| row.index()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..12).collect::<Vec<_>>());

    // The stream shows each text on the line its id names.
    let out = console.close().await.expect("close");
    let lines = replay(&out);
    for (row, text) in rows {
        assert_eq!(lines[row.index()], text);
    }
}

#[tokio::test]
async fn test_batch_ids_and_single_summary_repaint() {
    let console = Console::new(Vec::new());
    console.set_summary("SUM").await.expect("set summary");

    let ids = console
        .append_rows(["a", "b", "c"])
        .await
        .expect("append batch");
    assert_eq!(
        ids,
        vec![Row::from(0), Row::from(1), Row::from(2)],
        "batch ids must be contiguous from 0"
    );

    let out = console.close().await.expect("close");
    // Once for set_summary itself, exactly once after the batch —
    // never once per row.
    assert_eq!(occurrences(&out, b"SUM"), 2);
    assert_eq!(replay(&out), ["a", "b", "c", "SUM"]);
}

#[tokio::test]
async fn test_empty_batch_is_a_noop() {
    let console = Console::new(Vec::new());
    console.set_summary("SUM").await.expect("set summary");

    let ids = console
        .append_rows(Vec::<String>::new())
        .await
        .expect("empty batch");
    assert!(ids.is_empty());

    let out = console.close().await.expect("close");
    assert_eq!(occurrences(&out, b"SUM"), 1, "no repaint for an empty batch");
}

#[tokio::test]
async fn test_edit_escape_sequence_and_replay() {
    let console = Console::new(Vec::new());
    console.append_rows(["a", "b", "c"]).await.expect("append");
    console.edit_row(Row::from(1), "B").await.expect("edit");

    let out = console.close().await.expect("close");
    // Up 2 lines, clear, replacement without newline, back down 2.
    let tail = b"\x1b[2A\r\x1b[2KB\x1b[2B";
    assert!(
        out.ends_with(tail),
        "unexpected edit bytes: {:?}",
        String::from_utf8_lossy(&out)
    );
    assert_eq!(replay(&out), ["a", "B", "c"]);
}

#[tokio::test]
async fn test_summary_stays_last_and_never_gets_a_newline() {
    let console = Console::new(Vec::new());
    console.append_rows(["a", "b"]).await.expect("append");
    console.set_summary("Done").await.expect("set summary");
    console.append_row("d").await.expect("append");

    let out = console.close().await.expect("close");
    assert_eq!(occurrences(&out, b"Done\n"), 0);
    assert_eq!(replay(&out), ["a", "b", "d", "Done"]);
}

#[tokio::test]
async fn test_round_trip_scenario() {
    let console = Console::new(Vec::new());
    let x = console.append_row("x").await.expect("append x");
    console.append_row("y").await.expect("append y");
    console.edit_row(x, "X").await.expect("edit");
    console.set_summary("done").await.expect("set summary");

    let out = console.close().await.expect("close");
    assert_eq!(replay(&out), ["X", "y", "done"]);
}

#[tokio::test]
async fn test_row_text_is_trimmed() {
    let console = Console::new(Vec::new());
    console.append_row("  padded  \t").await.expect("append");

    let out = console.close().await.expect("close");
    assert_eq!(replay(&out), ["padded"]);
}

#[tokio::test]
async fn test_clearing_the_summary_stops_repaints() {
    let console = Console::new(Vec::new());
    console.set_summary("SUM").await.expect("set summary");
    console.set_summary("").await.expect("clear summary");
    console.append_row("a").await.expect("append");

    let out = console.close().await.expect("close");
    assert_eq!(occurrences(&out, b"SUM"), 1, "cleared summary must not repaint");
    assert_eq!(replay(&out), ["a"]);
}

#[tokio::test]
async fn test_edit_out_of_range_is_rejected() {
    let console = Console::new(Vec::new());
    console.append_row("only").await.expect("append");

    let err = console
        .edit_row(Row::from(5), "nope")
        .await
        .expect_err("edit beyond the row count must fail");
    assert!(matches!(
        err,
        ConsoleError::RowOutOfRange { row: 5, rows: 1 }
    ));

    // The dispatcher stays alive and the stream stays untouched.
    let row = console.append_row("next").await.expect("append after error");
    assert_eq!(row.index(), 1);
    let out = console.close().await.expect("close");
    assert_eq!(replay(&out), ["only", "next"]);
}

#[tokio::test]
async fn test_write_failure_degrades_one_row_only() {
    let console = Console::new(FailingWriter::new());

    let err = console
        .append_row("boom")
        .await
        .expect_err("refused write must surface to the submitter");
    assert!(matches!(err, ConsoleError::Io(_)));

    // The failed row still consumed id 0: the dispatcher keeps
    // running and the next append gets the next contiguous id.
    let row = console.append_row("fine").await.expect("append after failure");
    assert_eq!(row.index(), 1);
    console.edit_row(row, "fine indeed").await.expect("edit after failure");

    let out = console.close().await.expect("close");
    let shown = String::from_utf8_lossy(&out.inner);
    assert!(shown.contains("fine indeed"));
    assert!(!shown.contains("boom"), "refused write must not reach the stream");
}

#[tokio::test]
async fn test_failed_batch_still_allocates_all_ids() {
    let console = Console::new(FailingWriter::new());

    let err = console
        .append_rows(["ok", "boom", "ok too"])
        .await
        .expect_err("a lost row fails the whole batch");
    assert!(matches!(err, ConsoleError::Io(_)));

    // All three batch ids were allocated despite the mid-batch
    // failure, so the next append continues at 3.
    let row = console.append_row("after").await.expect("append after failure");
    assert_eq!(row.index(), 3);

    let out = console.close().await.expect("close");
    let shown = String::from_utf8_lossy(&out.inner);
    // The rows around the refused one were still written.
    assert!(shown.contains("ok"));
    assert!(shown.contains("ok too"));
    assert!(shown.contains("after"));
}

#[tokio::test]
async fn test_close_drains_fire_and_forget_jobs() {
    let console = Console::new(Vec::new());
    let row = console.append_row("job 0").await.expect("append");
    // Discarded Pendings still run, in order, before close returns.
    drop(console.edit_row(row, "job 0 edited"));
    drop(console.set_summary("closing"));

    let out = console.close().await.expect("close");
    assert_eq!(replay(&out), ["job 0 edited", "closing"]);
}

#[tokio::test]
async fn test_submissions_after_close_resolve_closed() {
    let console = Console::new(Vec::new());
    let handle = console.handle();
    console.close().await.expect("close");

    let err = handle
        .append_row("late")
        .await
        .expect_err("append after close must fail");
    assert!(matches!(err, ConsoleError::Closed));
}
