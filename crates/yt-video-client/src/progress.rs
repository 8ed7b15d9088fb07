use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

const PROGRESS_TEMPLATE: &str =
    "{bytes}/{total_bytes} [{bar:40.cyan/blue}] {percent:>3}% {binary_bytes_per_sec} ETA {eta}";

/// Reader that advances a progress bar by every byte it hands out
#[derive(Debug)]
pub struct ProgressReader<R> {
    inner: R,
    bar: ProgressBar,
}

impl<R> ProgressReader<R> {
    /// Wrap `inner` with a visible bar of `total` bytes
    pub fn new(inner: R, total: u64) -> Self {
        let bar = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::with_template(PROGRESS_TEMPLATE) {
            bar.set_style(style.progress_chars("=> "));
        }
        Self { inner, bar }
    }

    /// Wrap `inner` with a bar that tracks position but never draws
    pub fn hidden(inner: R, total: u64) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total);
        Self { inner, bar }
    }

    /// Handle to the bar, still usable once the reader is consumed
    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Stop the indicator, leaving it at its final position
    pub fn finish(&self) {
        self.bar.finish();
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ProgressReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &poll {
            this.bar.inc((buf.filled().len() - before) as u64);
        }
        poll
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn final_position_equals_total_bytes() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let mut reader = ProgressReader::hidden(&data[..], data.len() as u64);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        reader.finish();

        assert_eq!(out, data);
        assert_eq!(reader.position(), data.len() as u64);
        assert!(reader.bar().is_finished());
    }

    #[tokio::test]
    async fn each_read_advances_by_bytes_returned() {
        let data = [7u8; 100];
        let mut reader = ProgressReader::hidden(&data[..], 100);

        let mut chunk = [0u8; 30];
        let n = reader.read(&mut chunk).await.unwrap();
        assert_eq!(n, 30);
        assert_eq!(reader.position(), 30);

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).await.unwrap();
        assert_eq!(reader.position(), 100);
        assert_eq!(rest.len(), 70);
    }

    #[tokio::test]
    async fn empty_source_leaves_bar_at_zero() {
        let mut reader = ProgressReader::hidden(&b""[..], 0);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(reader.position(), 0);
    }
}
