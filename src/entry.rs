use crate::{Error, Result};

/// Representation of one archive member.
///
/// Entries are either built by the caller before writing, or produced by
/// [`Archive`](crate::Archive) while parsing.  The payload is optional so
/// that [`FileBuilder`](crate::FileBuilder), which streams payload bytes
/// separately, does not have to hold it in memory; the buffered
/// [`Builder`](crate::Builder) requires it to be present.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry {
    filename: String,
    mtime_millis: u64,
    uid: u32,
    gid: u32,
    mode: u32,
    data: Option<Vec<u8>>,
}

impl Entry {
    /// Creates an entry with the given filename and payload, and all other
    /// fields set to zero.
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Entry {
        Entry {
            filename: filename.into(),
            mtime_millis: 0,
            uid: 0,
            gid: 0,
            mode: 0,
            data: Some(data),
        }
    }

    /// Creates an entry with no in-memory payload, for use with
    /// [`FileBuilder`](crate::FileBuilder) where the payload is streamed.
    pub fn without_data(filename: impl Into<String>) -> Entry {
        Entry {
            filename: filename.into(),
            mtime_millis: 0,
            uid: 0,
            gid: 0,
            mode: 0,
            data: None,
        }
    }

    /// Returns the member's filename.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Sets the member's filename.
    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = filename.into();
    }

    /// Returns the last modification time in Unix milliseconds.
    ///
    /// On the wire this is a whole number of seconds; reading an archive
    /// always yields a multiple of 1000.
    pub fn mtime_millis(&self) -> u64 {
        self.mtime_millis
    }

    /// Sets the last modification time in Unix milliseconds.
    pub fn set_mtime_millis(&mut self, mtime_millis: u64) {
        self.mtime_millis = mtime_millis;
    }

    /// Returns the value of the owner's user ID field.
    pub fn uid(&self) -> u32 {
        self.uid
    }

    /// Sets the value of the owner's user ID field.
    pub fn set_uid(&mut self, uid: u32) {
        self.uid = uid;
    }

    /// Returns the value of the group ID field.
    pub fn gid(&self) -> u32 {
        self.gid
    }

    /// Sets the value of the group ID field.
    pub fn set_gid(&mut self, gid: u32) {
        self.gid = gid;
    }

    /// Returns the mode bits for this member.
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// Sets the mode bits for this member.
    pub fn set_mode(&mut self, mode: u32) {
        self.mode = mode;
    }

    /// Returns the member's payload, if present.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Sets the member's payload.
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = Some(data);
    }

    /// Consumes the entry, returning its payload if present.
    pub fn into_data(self) -> Option<Vec<u8>> {
        self.data
    }

    pub(crate) fn from_wire(
        filename: String,
        mtime_millis: u64,
        uid: u32,
        gid: u32,
        mode: u32,
        data: Vec<u8>,
    ) -> Entry {
        Entry { filename, mtime_millis, uid, gid, mode, data: Some(data) }
    }

    /// Checks the fields every writer requires.  `require_data` additionally
    /// rejects entries without an in-memory payload, which only the buffered
    /// writer needs.
    pub(crate) fn validate(&self, require_data: bool) -> Result<()> {
        if self.filename.trim().is_empty() {
            let msg = "entry filename must not be blank".to_string();
            return Err(Error::InvalidEntry(msg));
        }
        if require_data && self.data.is_none() {
            let msg = format!(
                "entry `{}` has no payload (empty payloads are allowed, \
                 missing ones are not)",
                self.filename
            );
            return Err(Error::InvalidEntry(msg));
        }
        Ok(())
    }
}
