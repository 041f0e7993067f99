//! Inbound envelope sources.

use futures::{StreamExt, stream::BoxStream};
use push_dispatch_core::Envelope;
use thiserror::Error;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::mpsc,
};
use tokio_stream::wrappers::{LinesStream, UnboundedReceiverStream};

/// Transport error.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(#[from] serde_json::Error),
}

impl TransportError {
    /// Whether the source can keep producing envelopes after this error.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidEnvelope(_))
    }
}

/// Stream of inbound envelopes.
pub type EnvelopeStream = BoxStream<'static, Result<Envelope, TransportError>>;

/// Decode newline-delimited JSON envelopes from `reader`.
///
/// Blank lines are skipped. A malformed line yields an error item and the
/// stream continues with the next line.
pub fn json_lines<R>(reader: R) -> EnvelopeStream
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    LinesStream::new(reader.lines())
        .filter_map(|line| async move {
            match line {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(Envelope::from_json(line.trim()).map_err(Into::into)),
                Err(e) => Some(Err(e.into())),
            }
        })
        .boxed()
}

/// In-process envelope source.
///
/// Returns the sender for the producing side and the stream for the client.
#[must_use]
pub fn channel() -> (mpsc::UnboundedSender<Envelope>, EnvelopeStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, UnboundedReceiverStream::new(rx).map(Ok).boxed())
}

/// Encode an envelope as one JSON line, without the trailing newline.
///
/// # Errors
/// Returns error if the payload cannot be serialized.
pub fn to_json_line(envelope: &Envelope) -> Result<String, serde_json::Error> {
    serde_json::to_string(envelope)
}
