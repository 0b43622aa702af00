//! Writers for producing archives.
//!
//! Two strategies are available.  [`Builder`] serializes a complete,
//! in-memory set of entries in one call and supports the GNU long-name
//! table.  [`FileBuilder`] targets a seekable sink, streams each payload
//! through [`std::io::Write`], and backpatches the declared size afterwards;
//! it cannot emit a long-name table and truncates over-length names instead.

use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::entry::Entry;
use crate::field::{
    self, ENTRY_MAGIC, FILENAME_WIDTH, GID_WIDTH, GLOBAL_HEADER, MODE_WIDTH,
    MTIME_WIDTH, NAME_TABLE_ID, SIZE_WIDTH, UID_WIDTH,
};
use crate::{Error, Result};

mod file;
pub use file::FileBuilder;

/// Wall-clock seconds since the Unix epoch, used as the shared modification
/// time for everything written in one batch.
pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

// ========================================================================= //

/// A structure for building archives from in-memory entries.
///
/// The full ordered list of entries is written in a single call to
/// [`write_entries`](Builder::write_entries); the builder needs the whole
/// list up front so it can emit the long-name table before the first member.
pub struct Builder<W: Write> {
    writer: W,
    fixed_mtime: Option<u64>,
    entries_written: bool,
}

impl<W: Write> Builder<W> {
    /// Creates a new archive builder with the underlying writer object as
    /// the destination of all data written.
    pub fn new(writer: W) -> Builder<W> {
        Builder { writer, fixed_mtime: None, entries_written: false }
    }

    /// Creates a builder that stamps every entry with the given modification
    /// time (in seconds) instead of the wall clock, for reproducible output.
    pub fn new_with_mtime(writer: W, mtime_secs: u64) -> Builder<W> {
        Builder {
            writer,
            fixed_mtime: Some(mtime_secs),
            entries_written: false,
        }
    }

    /// Unwraps this archive builder, returning the underlying writer object.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Writes the complete archive: global header, the long-name table if
    /// any filename exceeds 16 bytes, then every entry in order.
    ///
    /// All entries are validated before any bytes are written.  Every entry
    /// shares one modification-time stamp captured at the start of the call.
    /// May be called exactly once per builder; an empty slice produces a
    /// valid, member-less archive.
    pub fn write_entries(&mut self, entries: &[Entry]) -> Result<()> {
        if self.entries_written {
            return Err(Error::State("archive entries already written"));
        }
        for entry in entries {
            entry.validate(true)?;
        }
        self.entries_written = true;

        self.writer.write_all(GLOBAL_HEADER)?;
        if entries.is_empty() {
            return Ok(());
        }

        let name_refs = self.write_name_table(entries)?;
        let mtime = self.fixed_mtime.unwrap_or_else(now_secs).to_string();
        for (index, entry) in entries.iter().enumerate() {
            let name_field = match &name_refs {
                Some(refs) => refs[index].as_str(),
                None => entry.filename(),
            };
            let data = entry.data().ok_or_else(|| {
                Error::InvalidEntry(format!(
                    "entry `{}` has no payload",
                    entry.filename()
                ))
            })?;
            let w = &mut self.writer;
            field::encode_field(w, name_field, FILENAME_WIDTH, "filename")?;
            field::encode_field(w, &mtime, MTIME_WIDTH, "timestamp")?;
            field::encode_field(w, &entry.uid().to_string(), UID_WIDTH, "owner ID")?;
            field::encode_field(w, &entry.gid().to_string(), GID_WIDTH, "group ID")?;
            field::encode_field(w, &entry.mode().to_string(), MODE_WIDTH, "file mode")?;
            field::encode_field(w, &data.len().to_string(), SIZE_WIDTH, "file size")?;
            w.write_all(ENTRY_MAGIC)?;
            w.write_all(data)?;
            if data.len() % 2 != 0 {
                w.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    /// Emits the `//` name-table pseudo-entry when some filename exceeds 16
    /// bytes, and returns the `/offset` name field for each entry.
    ///
    /// Once a table exists, every member is referenced through it; the blob
    /// holds each filename in input order as `name/\n`, addressed by the byte
    /// offset at which its segment starts.
    fn write_name_table(
        &mut self,
        entries: &[Entry],
    ) -> Result<Option<Vec<String>>> {
        let has_long_names = entries
            .iter()
            .any(|entry| entry.filename().len() > FILENAME_WIDTH);
        if !has_long_names {
            return Ok(None);
        }

        let mut blob = Vec::new();
        let mut refs = Vec::with_capacity(entries.len());
        for entry in entries {
            if !entry.filename().is_ascii() {
                let msg = format!(
                    "filename `{}` is not ASCII",
                    entry.filename()
                );
                return Err(Error::Encoding(msg));
            }
            refs.push(format!("/{}", blob.len()));
            blob.extend_from_slice(entry.filename().as_bytes());
            blob.extend_from_slice(b"/\n");
        }

        // The table header leaves timestamp, owner, group, and mode blank.
        let w = &mut self.writer;
        field::encode_field(w, NAME_TABLE_ID, FILENAME_WIDTH, "filename")?;
        field::encode_field(w, "", MTIME_WIDTH, "timestamp")?;
        field::encode_field(w, "", UID_WIDTH, "owner ID")?;
        field::encode_field(w, "", GID_WIDTH, "group ID")?;
        field::encode_field(w, "", MODE_WIDTH, "file mode")?;
        field::encode_field(w, &blob.len().to_string(), SIZE_WIDTH, "file size")?;
        w.write_all(ENTRY_MAGIC)?;
        w.write_all(&blob)?;
        if blob.len() % 2 != 0 {
            w.write_all(b"\n")?;
        }
        Ok(Some(refs))
    }
}

// ========================================================================= //

#[cfg(test)]
mod tests {
    use super::Builder;
    use crate::{Archive, Entry, Error};
    use pretty_assertions::assert_eq;
    use std::str;

    #[test]
    fn build_archive_with_two_files() {
        let mut builder = Builder::new_with_mtime(Vec::new(), 1487552916);
        let mut entry1 = Entry::new("foo.txt", b"foobar\n".to_vec());
        entry1.set_uid(501);
        entry1.set_gid(20);
        entry1.set_mode(100644);
        let entry2 = Entry::new("baz.txt", b"baz\n".to_vec());
        builder.write_entries(&[entry1, entry2]).unwrap();
        let actual = builder.into_inner();
        let expected = "\
        !<arch>\n\
        foo.txt         1487552916  501   20    100644  7         `\n\
        foobar\n\n\
        baz.txt         1487552916  0     0     0       4         `\n\
        baz\n";
        assert_eq!(str::from_utf8(&actual).unwrap(), expected);
    }

    #[test]
    fn build_empty_archive() {
        let mut builder = Builder::new(Vec::new());
        builder.write_entries(&[]).unwrap();
        assert_eq!(builder.into_inner(), b"!<arch>\n");
    }

    #[test]
    fn build_archive_with_long_filenames() {
        let mut builder = Builder::new_with_mtime(Vec::new(), 1487552916);
        let entry1 = Entry::new(
            "this_is_a_very_long_filename.txt",
            b"foobar\n".to_vec(),
        );
        let entry2 = Entry::new("short.txt", b"baz\n".to_vec());
        builder.write_entries(&[entry1, entry2]).unwrap();
        let actual = builder.into_inner();
        // The blob holds both names (34 + 11 = 45 bytes, so one pad byte),
        // and both members are referenced by offset.
        let expected = "\
        !<arch>\n\
        //                                              45        `\n\
        this_is_a_very_long_filename.txt/\n\
        short.txt/\n\n\
        /0              1487552916  0     0     0       7         `\n\
        foobar\n\n\
        /34             1487552916  0     0     0       4         `\n\
        baz\n";
        assert_eq!(str::from_utf8(&actual).unwrap(), expected);
    }

    #[test]
    fn long_filenames_survive_a_round_trip() {
        let mut builder = Builder::new(Vec::new());
        let entries = vec![
            Entry::new("this_is_a_very_long_filename.txt", b"foobar\n".to_vec()),
            Entry::new("short.txt", b"baz\n".to_vec()),
        ];
        builder.write_entries(&entries).unwrap();
        let bytes = builder.into_inner();

        let mut archive = Archive::new(&bytes[..]).unwrap();
        let entry = archive.next_entry().unwrap().unwrap();
        assert_eq!(entry.filename(), "this_is_a_very_long_filename.txt");
        assert_eq!(entry.data(), Some(&b"foobar\n"[..]));
        let entry = archive.next_entry().unwrap().unwrap();
        assert_eq!(entry.filename(), "short.txt");
        assert_eq!(entry.data(), Some(&b"baz\n"[..]));
        assert!(archive.next_entry().unwrap().is_none());
    }

    #[test]
    fn second_write_entries_call_fails() {
        let mut builder = Builder::new(Vec::new());
        builder.write_entries(&[]).unwrap();
        assert!(matches!(
            builder.write_entries(&[]),
            Err(Error::State(_))
        ));
    }

    #[test]
    fn invalid_entry_aborts_before_any_bytes_are_written() {
        let mut builder = Builder::new(Vec::new());
        let good = Entry::new("foo.txt", b"foobar\n".to_vec());
        let bad = Entry::new("   ", Vec::new());
        assert!(matches!(
            builder.write_entries(&[good, bad]),
            Err(Error::InvalidEntry(_))
        ));
        assert!(builder.into_inner().is_empty());
    }

    #[test]
    fn missing_payload_is_rejected() {
        let mut builder = Builder::new(Vec::new());
        let entry = Entry::without_data("foo.txt");
        assert!(matches!(
            builder.write_entries(&[entry]),
            Err(Error::InvalidEntry(_))
        ));
    }

    #[test]
    fn oversized_field_fails_encoding() {
        let mut builder = Builder::new(Vec::new());
        let mut entry = Entry::new("foo.txt", Vec::new());
        entry.set_uid(1234567); // 7 digits, field is 6 bytes wide
        assert!(matches!(
            builder.write_entries(&[entry]),
            Err(Error::Encoding(_))
        ));
    }
}
