use std::io::{self, Read};

use log::{debug, trace};

use crate::entry::Entry;
use crate::field::{
    self, ENTRY_MAGIC, FILENAME_WIDTH, GID_WIDTH, GLOBAL_HEADER, MODE_WIDTH,
    MTIME_WIDTH, NAME_TABLE_ID, SIZE_WIDTH, UID_WIDTH,
};
use crate::{Error, Result};

// ========================================================================= //

/// A structure for reading archives.
///
/// The underlying stream is consumed in a single forward pass; there is no
/// rewinding.  Construction verifies the 8-byte global header, after which
/// [`next_entry`](Archive::next_entry) can be called repeatedly until it
/// returns `Ok(None)`.
pub struct Archive<R: Read> {
    reader: R,
    name_table: Option<Vec<u8>>,
    closed: bool,
}

impl<R: Read> Archive<R> {
    /// Creates a new archive reader, verifying the global header.
    pub fn new(mut reader: R) -> Result<Archive<R>> {
        let mut buffer = [0; GLOBAL_HEADER.len()];
        fill(&mut reader, &mut buffer, 0)?;
        if &buffer != GLOBAL_HEADER {
            return Err(Error::Format("not an ar archive".to_string()));
        }
        Ok(Archive { reader, name_table: None, closed: false })
    }

    /// Reads the next entry from the archive, or returns `Ok(None)` if there
    /// are no more.
    ///
    /// The GNU long-name table is captured internally and never surfaced as
    /// an entry; names of subsequent members are resolved against it.
    pub fn next_entry(&mut self) -> Result<Option<Entry>> {
        if self.closed {
            return Err(Error::State("archive reader is closed"));
        }
        // The name-table pseudo-entry is skipped by looping, not recursing,
        // so a hostile archive cannot grow the stack.
        loop {
            let mut name_buf = [0; FILENAME_WIDTH];
            let first_read = loop {
                match self.reader.read(&mut name_buf) {
                    Ok(count) => break count,
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                    Err(err) => return Err(err.into()),
                }
            };
            if first_read == 0 {
                return Ok(None);
            }
            fill(&mut self.reader, &mut name_buf, first_read)?;

            let mut mtime_buf = [0; MTIME_WIDTH];
            fill(&mut self.reader, &mut mtime_buf, 0)?;
            let mut uid_buf = [0; UID_WIDTH];
            fill(&mut self.reader, &mut uid_buf, 0)?;
            let mut gid_buf = [0; GID_WIDTH];
            fill(&mut self.reader, &mut gid_buf, 0)?;
            let mut mode_buf = [0; MODE_WIDTH];
            fill(&mut self.reader, &mut mode_buf, 0)?;
            let mut size_buf = [0; SIZE_WIDTH];
            fill(&mut self.reader, &mut size_buf, 0)?;
            let mut magic = [0; 2];
            fill(&mut self.reader, &mut magic, 0)?;
            if &magic != ENTRY_MAGIC {
                let msg = "invalid entry magic".to_string();
                return Err(Error::Format(msg));
            }

            let raw_name = field::decode_str(&name_buf);
            let mtime_millis =
                field::decode_number(&field::decode_str(&mtime_buf), "timestamp")?
                    * 1000;
            let uid =
                field::decode_number(&field::decode_str(&uid_buf), "owner ID")?
                    as u32;
            let gid =
                field::decode_number(&field::decode_str(&gid_buf), "group ID")?
                    as u32;
            let mode =
                field::decode_number(&field::decode_str(&mode_buf), "file mode")?
                    as u32;
            let size_text = field::decode_str(&size_buf);
            if size_text.is_empty() {
                let msg = "invalid file data length".to_string();
                return Err(Error::Format(msg));
            }
            let size = field::decode_number(&size_text, "file size")?;

            let mut data = vec![0; size as usize];
            fill(&mut self.reader, &mut data, 0)?;
            if size % 2 != 0 {
                let mut pad = [0; 1];
                fill(&mut self.reader, &mut pad, 0)?;
            }

            if raw_name == NAME_TABLE_ID && mtime_millis == 0 {
                debug!("captured GNU name table ({} bytes)", data.len());
                self.name_table = Some(data);
                continue;
            }
            let filename = match &self.name_table {
                Some(table) if raw_name != NAME_TABLE_ID => {
                    resolve_name(table, &raw_name)?
                }
                _ => raw_name,
            };
            trace!("read entry `{}` ({} bytes)", filename, data.len());
            return Ok(Some(Entry::from_wire(
                filename,
                mtime_millis,
                uid,
                gid,
                mode,
                data,
            )));
        }
    }

    /// Returns an iterator over the remaining entries of this archive.
    pub fn entries(&mut self) -> Entries<R> {
        Entries { archive: self, done: false }
    }

    /// Marks the reader as closed; further calls to
    /// [`next_entry`](Archive::next_entry) fail with [`Error::State`].
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Unwraps this archive reader, returning the underlying reader object.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Reads into `buf[from..]`, treating any end-of-stream before the buffer is
/// full as a truncation.  Interrupted reads are retried.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8], from: usize) -> Result<()> {
    let mut total = from;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => {
                return Err(Error::Truncated {
                    expected: buf.len() as u64,
                    actual: total as u64,
                });
            }
            Ok(count) => total += count,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

/// Resolves one raw filename field against the active name table.
///
/// Plain GNU names carry a trailing `/`; over-length names are `/offset`
/// references into the table, where each stored name is terminated by a `/`
/// that is the table's last byte or is followed by `\n`.
fn resolve_name(table: &[u8], raw_name: &str) -> Result<String> {
    let offset_text = match raw_name.strip_prefix('/') {
        None => {
            return match raw_name.strip_suffix('/') {
                Some(stripped) => Ok(stripped.to_string()),
                None => Err(Error::Format(format!(
                    "invalid short file name: {}",
                    raw_name
                ))),
            };
        }
        Some(rest) => rest.trim(),
    };
    let offset = offset_text.parse::<usize>().map_err(|_| {
        Error::Format(format!("invalid long file name offset: {}", raw_name))
    })?;
    if offset >= table.len() {
        return Err(Error::Format(format!(
            "invalid long file name offset: {}",
            offset
        )));
    }
    let mut end = None;
    for position in offset..table.len() {
        if table[position] == b'/'
            && (position + 1 == table.len() || table[position + 1] == b'\n')
        {
            end = Some(position);
            break;
        }
    }
    match end {
        Some(end) if end > offset => {
            Ok(field::decode_str(&table[offset..end]))
        }
        _ => Err(Error::Format(format!(
            "invalid long file name offset: {}",
            offset
        ))),
    }
}

// ========================================================================= //

/// An iterator over the entries of an archive.
///
/// Yields `Err` at most once: after the first failure the stream position is
/// unreliable, so iteration stops.
pub struct Entries<'a, R: Read> {
    archive: &'a mut Archive<R>,
    done: bool,
}

impl<'a, R: Read> Iterator for Entries<'a, R> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Result<Entry>> {
        if self.done {
            return None;
        }
        match self.archive.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(error) => {
                self.done = true;
                Some(Err(error))
            }
        }
    }
}

// ========================================================================= //
