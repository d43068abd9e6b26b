//! JSON Lines output: one canonical record per line.

use std::io::Write;

use anyhow::Context;
use detmir_core::CanonicalListing;

pub(crate) struct JsonlSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonlSink<W> {
    pub(crate) fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Serializes `listing` onto its own line.
    pub(crate) fn write_listing(&mut self, listing: &CanonicalListing) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.writer, listing)
            .with_context(|| format!("failed to serialize listing {}", listing.id))?;
        self.writer
            .write_all(b"\n")
            .context("failed to write record separator")?;
        self.written += 1;
        Ok(())
    }

    pub(crate) fn write_all<'a, I>(&mut self, listings: I) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = &'a CanonicalListing>,
    {
        for listing in listings {
            self.write_listing(listing)?;
        }
        Ok(())
    }

    pub(crate) fn written(&self) -> usize {
        self.written
    }

    pub(crate) fn finish(mut self) -> anyhow::Result<W> {
        self.writer.flush().context("failed to flush output")?;
        Ok(self.writer)
    }
}
