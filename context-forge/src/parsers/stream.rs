//! Running a parse on a blocking worker and consuming it as a stream.

use std::ops::ControlFlow;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{FileParser, ParseEvent, ParseProgress, Parser};
use crate::error::ParseError;

/// Events of one parse, in order, ending after the terminal event.
///
/// Dropping the stream before the end cancels the worker at its next
/// progress report.
#[derive(Debug)]
pub struct ParseStream {
    rx: mpsc::Receiver<ParseEvent>,
    finished: bool,
}

impl Stream for ParseStream {
    type Item = ParseEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(event)) => {
                if event.is_terminal() {
                    self.finished = true;
                    self.rx.close();
                }
                Poll::Ready(Some(event))
            }
            // The worker went away without a terminal event
            Poll::Ready(None) => {
                self.finished = true;
                Poll::Ready(Some(ParseEvent::Error(ParseError::new(
                    "Parsing stopped unexpectedly",
                ))))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// How a parse worker ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerOutcome {
    /// The consumer went away and the parse stopped early.
    pub cancelled: bool,
    /// Row count of the last progress report the worker produced.
    pub reported_rows: usize,
}

/// Parses `content` on a tokio blocking worker.
///
/// `capacity` bounds the number of events buffered ahead of the consumer; a
/// slow consumer slows the parser down rather than growing memory.
///
/// Must be called from within a tokio runtime.
pub fn parse_stream(
    parser: Parser,
    content: Arc<str>,
    max_rows: usize,
    capacity: usize,
) -> ParseStream {
    spawn_parse(parser, content, max_rows, capacity).0
}

/// Like [`parse_stream`], also returning the worker's handle.
pub fn spawn_parse(
    parser: Parser,
    content: Arc<str>,
    max_rows: usize,
    capacity: usize,
) -> (ParseStream, JoinHandle<WorkerOutcome>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));

    let worker = tokio::task::spawn_blocking(move || {
        let progress_tx = tx.clone();
        let mut reported_rows = 0;
        let result = {
            let mut sink = |progress: ParseProgress| {
                reported_rows = progress.parsed_rows;
                match progress_tx.blocking_send(ParseEvent::Progress(progress)) {
                    Ok(()) => ControlFlow::Continue(()),
                    Err(_) => ControlFlow::Break(()),
                }
            };
            parser.parse_with(&content, max_rows, &mut sink)
        };

        let cancelled = matches!(&result, Err(err) if err.is_cancelled());
        match &result {
            Ok(data) => debug!(
                file_type = ?parser.file_type(),
                rows = data.rows.len(),
                "Parse worker finished"
            ),
            Err(_) if cancelled => debug!(reported_rows, "Parse worker cancelled by consumer"),
            Err(err) => warn!(error = %err, "Parse worker failed"),
        }

        // The consumer may already be gone
        let _ = tx.blocking_send(result.into());

        WorkerOutcome {
            cancelled,
            reported_rows,
        }
    });

    let stream = ParseStream {
        rx,
        finished: false,
    };
    (stream, worker)
}
