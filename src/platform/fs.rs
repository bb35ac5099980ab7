// CmdSift - platform/fs.rs
//
// File reading with text-encoding detection.
//
// Detection order: byte-order mark, then valid UTF-8, then GBK (device logs
// and name tables in the field are commonly GBK when not UTF-8).
//
// ASCII-compatible encodings are decoded strictly line by line so a single
// undecodable line can be reported with its raw content. UTF-16 input is
// decoded as a whole with replacement characters.

use crate::util::constants;
use crate::util::error::{DecodeError, LineError};
use encoding_rs::{Encoding, GBK, UTF_8};
use std::io;
use std::path::Path;

/// Pick the encoding for `bytes`. Returns the encoding and the BOM length to skip.
pub fn detect_encoding(bytes: &[u8]) -> (&'static Encoding, usize) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return (encoding, bom_len);
    }
    if std::str::from_utf8(bytes).is_ok() {
        (UTF_8, 0)
    } else {
        (GBK, 0)
    }
}

/// Decode a whole buffer strictly in its detected encoding.
pub fn decode_text(bytes: &[u8]) -> Result<String, DecodeError> {
    let (encoding, bom_len) = detect_encoding(bytes);
    encoding
        .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
        .map(|text| text.into_owned())
        .ok_or(DecodeError {
            encoding: encoding.name(),
        })
}

/// Split `bytes` into decoded lines.
///
/// Line terminators (`\n`, `\r\n`) are stripped and a final empty segment
/// after the last terminator is not reported, matching `str::lines`.
pub fn decode_lines(bytes: &[u8]) -> Vec<Result<String, LineError>> {
    let (encoding, bom_len) = detect_encoding(bytes);
    let body = &bytes[bom_len..];

    tracing::debug!(encoding = encoding.name(), bytes = body.len(), "Decoding log text");

    if !encoding.is_ascii_compatible() {
        let (text, had_errors) = encoding.decode_without_bom_handling(body);
        if had_errors {
            tracing::warn!(
                encoding = encoding.name(),
                "Malformed sequences replaced while decoding"
            );
        }
        return text.lines().map(|l| Ok(l.to_string())).collect();
    }

    let mut segments: Vec<&[u8]> = body.split(|b| *b == b'\n').collect();
    if segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }

    segments
        .into_iter()
        .map(|segment| {
            let segment = segment.strip_suffix(b"\r").unwrap_or(segment);
            match encoding.decode_without_bom_handling_and_without_replacement(segment) {
                Some(text) => Ok(text.into_owned()),
                None => Err(LineError::new(
                    String::from_utf8_lossy(segment).into_owned(),
                    DecodeError {
                        encoding: encoding.name(),
                    },
                )),
            }
        })
        .collect()
}

/// Read a log file and split it into decoded lines.
///
/// Files above the configured size limit are refused with `InvalidData`.
pub fn read_log_lines(path: &Path) -> io::Result<Vec<Result<String, LineError>>> {
    let size = std::fs::metadata(path)?.len();
    if size > constants::MAX_INPUT_FILE_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "file is {size} bytes, exceeds maximum of {} bytes",
                constants::MAX_INPUT_FILE_SIZE
            ),
        ));
    }
    let bytes = std::fs::read(path)?;
    Ok(decode_lines(&bytes))
}
