//! Fixed-width ASCII header fields shared by the reader and both writers.
//!
//! Every per-entry header is 60 bytes: six left-justified, space-padded ASCII
//! fields followed by a two-byte end marker.  All of the wire constants live
//! here so that the writers and the reader agree on them by construction.

use std::io::Write;

use crate::{Error, Result};

/// The 8-byte magic at the start of every archive.
pub(crate) const GLOBAL_HEADER: &[u8; 8] = b"!<arch>\n";

/// The 2-byte marker terminating every entry header (`` ` `` then `\n`).
pub(crate) const ENTRY_MAGIC: &[u8; 2] = &[0x60, 0x0A];

/// Identifier of the GNU long-name table pseudo-entry.
pub(crate) const NAME_TABLE_ID: &str = "//";

pub(crate) const FILENAME_WIDTH: usize = 16;
pub(crate) const MTIME_WIDTH: usize = 12;
pub(crate) const UID_WIDTH: usize = 6;
pub(crate) const GID_WIDTH: usize = 6;
pub(crate) const MODE_WIDTH: usize = 8;
pub(crate) const SIZE_WIDTH: usize = 10;

/// Decodes a raw field as ASCII text with leading/trailing whitespace
/// removed.  An all-blank field decodes to the empty string.
pub(crate) fn decode_str(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

/// Decodes a trimmed field as a non-negative decimal integer.  A blank field
/// decodes to zero.
pub(crate) fn decode_number(text: &str, field_name: &str) -> Result<u64> {
    if text.is_empty() {
        return Ok(0);
    }
    text.parse::<u64>().map_err(|_| {
        Error::Format(format!("invalid {} field ({:?})", field_name, text))
    })
}

/// Encodes `text` as ASCII, left-justified and space-padded to exactly
/// `width` bytes.
pub(crate) fn encode_field<W: Write>(
    writer: &mut W,
    text: &str,
    width: usize,
    field_name: &str,
) -> Result<()> {
    if !text.is_ascii() {
        let msg = format!("{} `{}` is not ASCII", field_name, text);
        return Err(Error::Encoding(msg));
    }
    if text.len() > width {
        let msg = format!(
            "{} `{}` does not fit in {} bytes",
            field_name,
            text,
            width
        );
        return Err(Error::Encoding(msg));
    }
    writer.write_all(text.as_bytes())?;
    writer.write_all(&vec![b' '; width - text.len()])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use pretty_assertions::assert_eq;

    #[test]
    fn decode_trims_blanks() {
        assert_eq!(decode_str(b"foo.txt         "), "foo.txt");
        assert_eq!(decode_str(b"   foo bar  "), "foo bar");
        assert_eq!(decode_str(b"            "), "");
    }

    #[test]
    fn decode_number_blank_is_zero() {
        assert_eq!(decode_number("", "owner ID").unwrap(), 0);
        assert_eq!(decode_number("501", "owner ID").unwrap(), 501);
    }

    #[test]
    fn decode_number_rejects_garbage() {
        let err = decode_number("foo", "owner ID").unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        assert!(err.to_string().contains("owner ID"));
        assert!(decode_number("-1", "timestamp").is_err());
    }

    #[test]
    fn encode_pads_to_width() {
        let mut buf = Vec::new();
        encode_field(&mut buf, "foo.txt", 16, "filename").unwrap();
        assert_eq!(&buf, b"foo.txt         ");
    }

    #[test]
    fn encode_exact_width_has_no_padding() {
        let mut buf = Vec::new();
        encode_field(&mut buf, "0123456789", 10, "file size").unwrap();
        assert_eq!(&buf, b"0123456789");
    }

    #[test]
    fn encode_rejects_overflow() {
        let mut buf = Vec::new();
        let err = encode_field(&mut buf, "this_is_a_very_long_filename.txt", 16, "filename")
            .unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
        assert!(buf.is_empty());
    }

    #[test]
    fn encode_rejects_non_ascii() {
        let mut buf = Vec::new();
        assert!(matches!(
            encode_field(&mut buf, "caf\u{e9}", 16, "filename"),
            Err(Error::Encoding(_))
        ));
    }
}
