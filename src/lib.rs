//! A library for encoding/decoding GNU-variant Unix archive (`ar`) files,
//! the container format used by `.deb` packages and static libraries.
//!
//! An archive is the 8-byte magic `!<arch>\n` followed by members, each a
//! 60-byte fixed-width ASCII header and a raw payload padded to an even
//! length:
//!
//! | Field             | Width | Encoding                          |
//! |-------------------|-------|-----------------------------------|
//! | Filename          | 16    | ASCII, left-justified, space-padded |
//! | Modification time | 12    | ASCII decimal seconds             |
//! | Owner ID          | 6     | ASCII decimal                     |
//! | Group ID          | 6     | ASCII decimal                     |
//! | File mode         | 8     | ASCII decimal                     |
//! | Data size         | 10    | ASCII decimal byte count          |
//! | End magic         | 2     | `` ` `` then `\n`                 |
//!
//! Filenames longer than 16 bytes use the GNU extension: a pseudo-member
//! named `//` holds a blob of `name/\n` segments, and regular members
//! reference it by byte offset (`/0`, `/34`, ...).
//!
//! # Example
//!
//! ```
//! use gnuar::{Archive, Builder, Entry};
//!
//! let mut entry = Entry::new("control.tar.gz", b"AB".to_vec());
//! entry.set_mode(644);
//! let mut builder = Builder::new(Vec::new());
//! builder.write_entries(&[entry])?;
//! let bytes = builder.into_inner();
//!
//! let mut archive = Archive::new(&bytes[..])?;
//! while let Some(entry) = archive.next_entry()? {
//!     println!("{}: {} bytes", entry.filename(), entry.data().unwrap().len());
//! }
//! # Ok::<(), gnuar::Error>(())
//! ```

#![warn(missing_docs)]

mod builder;
mod entry;
mod error;
mod field;
mod read;

pub use crate::builder::{Builder, FileBuilder};
pub use crate::entry::Entry;
pub use crate::error::{Error, Result};
pub use crate::read::{Archive, Entries};
