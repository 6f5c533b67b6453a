//! Slot-holding read streams.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::{Stream, StreamExt};
use rfs_core::ClientError;
use rfs_pool::SlotControl;

use crate::backend::ByteStream;

/// A chunked file read that keeps its connection slot busy.
///
/// The slot the stream was opened on stays reserved until the stream
/// is fully consumed or dropped, so no other task can be dispatched
/// onto that connection while bytes are still flowing. Release also
/// starts the slot's idle-disconnect window.
#[must_use = "dropping a ReadStream releases its connection slot"]
pub struct ReadStream {
    inner: ByteStream,
    control: SlotControl,
}

impl ReadStream {
    pub(crate) fn new(inner: ByteStream, control: SlotControl) -> Self {
        Self { inner, control }
    }

    /// Drains the stream, returning the concatenated contents.
    pub async fn collect(mut self) -> Result<Vec<u8>, ClientError> {
        let mut out = Vec::new();
        while let Some(chunk) = self.inner.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }
}

impl Stream for ReadStream {
    type Item = Result<Vec<u8>, ClientError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let poll = self.inner.as_mut().poll_next(cx);
        if matches!(poll, Poll::Ready(None)) {
            // Fully consumed; free the slot before the value is dropped.
            self.control.release();
        }
        poll
    }
}

impl Drop for ReadStream {
    fn drop(&mut self) {
        self.control.release();
    }
}

impl std::fmt::Debug for ReadStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadStream").finish_non_exhaustive()
    }
}
