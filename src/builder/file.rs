//! An incremental writer for seekable sinks.
//!
//! The archive format was not designed for streaming: every member header
//! declares its payload size up front.  [`FileBuilder`] avoids buffering
//! whole payloads by writing a placeholder size, streaming the payload
//! bytes, and seeking back to patch the real size when the entry is closed.

use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

use log::warn;

use crate::entry::Entry;
use crate::field::{
    self, ENTRY_MAGIC, FILENAME_WIDTH, GID_WIDTH, GLOBAL_HEADER, MODE_WIDTH,
    MTIME_WIDTH, SIZE_WIDTH, UID_WIDTH,
};
use crate::{Error, Result};

use super::now_secs;

// ========================================================================= //

/// A structure for building archives one entry at a time against a
/// random-access sink.
///
/// Payloads are streamed through the [`Write`] impl between
/// [`append_entry`](FileBuilder::append_entry) and
/// [`close_entry`](FileBuilder::close_entry); the in-memory payload of the
/// [`Entry`] is ignored.  Unlike [`Builder`](crate::Builder), this writer has
/// no long-name table: filenames longer than 16 bytes are truncated to their
/// first 15 bytes.
pub struct FileBuilder<W: Write + Seek> {
    writer: W,
    fixed_mtime: Option<u64>,
    header_written: bool,
    entry_open: bool,
    size_field_offset: u64,
    payload_len: u64,
}

impl<W: Write + Seek> FileBuilder<W> {
    /// Creates a new incremental builder writing to the given sink.
    pub fn new(writer: W) -> FileBuilder<W> {
        FileBuilder {
            writer,
            fixed_mtime: None,
            header_written: false,
            entry_open: false,
            size_field_offset: 0,
            payload_len: 0,
        }
    }

    /// Creates a builder that stamps every entry with the given modification
    /// time (in seconds) instead of the wall clock.
    pub fn new_with_mtime(writer: W, mtime_secs: u64) -> FileBuilder<W> {
        let mut builder = FileBuilder::new(writer);
        builder.fixed_mtime = Some(mtime_secs);
        builder
    }

    /// Starts a new entry, implicitly closing the previous one if it is
    /// still open.  The declared size is a placeholder until
    /// [`close_entry`](FileBuilder::close_entry) patches it.
    ///
    /// Filenames longer than 16 bytes are truncated to their first 15 bytes;
    /// there is no long-name table in this mode.
    pub fn append_entry(&mut self, entry: &Entry) -> Result<()> {
        if self.entry_open {
            self.close_entry()?;
        }
        entry.validate(false)?;
        if !self.header_written {
            self.writer.write_all(GLOBAL_HEADER)?;
            self.header_written = true;
        }

        let filename = entry.filename();
        let name_field =
            if filename.len() > FILENAME_WIDTH && filename.is_ascii() {
                warn!(
                    "truncating filename `{}` to {} bytes",
                    filename,
                    FILENAME_WIDTH - 1
                );
                &filename[..FILENAME_WIDTH - 1]
            } else {
                filename
            };
        let mtime = self.fixed_mtime.unwrap_or_else(now_secs).to_string();
        let w = &mut self.writer;
        field::encode_field(w, name_field, FILENAME_WIDTH, "filename")?;
        field::encode_field(w, &mtime, MTIME_WIDTH, "timestamp")?;
        field::encode_field(w, &entry.uid().to_string(), UID_WIDTH, "owner ID")?;
        field::encode_field(w, &entry.gid().to_string(), GID_WIDTH, "group ID")?;
        field::encode_field(w, &entry.mode().to_string(), MODE_WIDTH, "file mode")?;
        self.size_field_offset = self.writer.stream_position()?;
        field::encode_field(&mut self.writer, "0", SIZE_WIDTH, "file size")?;
        self.writer.write_all(ENTRY_MAGIC)?;
        self.payload_len = 0;
        self.entry_open = true;
        Ok(())
    }

    /// Closes the open entry: pads odd payloads, seeks back to patch the
    /// size field with the number of payload bytes actually written, and
    /// resumes at the end of the entry.  A no-op when no entry is open.
    pub fn close_entry(&mut self) -> Result<()> {
        if !self.entry_open {
            return Ok(());
        }
        if self.payload_len % 2 != 0 {
            self.writer.write_all(b"\n")?;
        }
        let entry_end = self.writer.stream_position()?;
        self.writer.seek(SeekFrom::Start(self.size_field_offset))?;
        field::encode_field(
            &mut self.writer,
            &self.payload_len.to_string(),
            SIZE_WIDTH,
            "file size",
        )?;
        self.writer.seek(SeekFrom::Start(entry_end))?;
        self.payload_len = 0;
        self.entry_open = false;
        Ok(())
    }

    /// Closes any open entry, flushes, and returns the underlying sink.
    pub fn finish(mut self) -> Result<W> {
        self.close_entry()?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write + Seek> Write for FileBuilder<W> {
    /// Appends payload bytes to the entry started by the last
    /// [`append_entry`](FileBuilder::append_entry) call.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.entry_open {
            let msg = "no entry is open for writing";
            return Err(io::Error::new(io::ErrorKind::InvalidInput, msg));
        }
        let written = self.writer.write(buf)?;
        self.payload_len += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl FileBuilder<File> {
    /// Creates or truncates the file at `path` and builds an archive in it.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<FileBuilder<File>> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(FileBuilder::new(file))
    }

    /// Closes any open entry and syncs the archive to durable storage.
    pub fn close(self) -> Result<()> {
        let file = self.finish()?;
        file.sync_all().map_err(Error::Io)
    }
}

// ========================================================================= //
