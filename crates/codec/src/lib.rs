//! # Codec - Page and Index Serialization
//!
//! Converts in-memory pages and index records into durable bytes and back.
//! Every persisted file holds exactly one frame:
//!
//! ```text
//! [body_len: u32 LE][crc32: u32 LE][body ...]
//! ```
//!
//! The body is the `bincode` encoding of any serde value. `crc32` covers the
//! body only. A frame whose length or checksum does not match is reported as
//! [`CodecError::Corrupt`]; unlike a log there is no "truncated tail" to
//! tolerate, since a page file is always written whole.
//!
//! ## Atomic writes
//!
//! [`write_file`] writes `<path>.tmp`, optionally fsyncs it and renames it
//! over `<path>`, so a reader never observes a half-written page.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//!
//! let mut page: HashMap<String, i64> = HashMap::new();
//! page.insert("a".into(), 1);
//! codec::write_file("pages/users7", &page, false).unwrap();
//! let back: HashMap<String, i64> = codec::read_file("pages/users7").unwrap();
//! assert_eq!(back, page);
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher as Crc32;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Size of the frame header: `body_len` + `crc32`.
pub const FRAME_HEADER_BYTES: usize = 8;

/// Suffix of the sibling file used during atomic writes.
pub const TMP_SUFFIX: &str = ".tmp";

/// Refuse to allocate bodies larger than this when decoding.
const MAX_BODY_SIZE: u32 = 256 * 1024 * 1024;

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Frame length, checksum or body did not validate.
    #[error("corrupt frame: {0}")]
    Corrupt(String),

    /// The value could not be encoded.
    #[error("encode failed: {0}")]
    Encode(String),
}

impl CodecError {
    /// Returns `true` when the error is an I/O `NotFound`.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, CodecError::Io(e) if e.kind() == io::ErrorKind::NotFound)
    }
}

fn checksum(body: &[u8]) -> u32 {
    let mut hasher = Crc32::new();
    hasher.update(body);
    hasher.finalize()
}

/// Encodes `value` into a single frame.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    let body = bincode::serialize(value).map_err(|e| CodecError::Encode(e.to_string()))?;
    if body.len() as u64 > u64::from(MAX_BODY_SIZE) {
        return Err(CodecError::Encode(format!(
            "frame body too large: {} bytes",
            body.len()
        )));
    }

    let mut frame = Vec::with_capacity(FRAME_HEADER_BYTES + body.len());
    frame.write_u32::<LittleEndian>(body.len() as u32)?;
    frame.write_u32::<LittleEndian>(checksum(&body))?;
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Reads one frame from `reader` and decodes its body.
pub fn read_frame<T: DeserializeOwned, R: Read>(reader: &mut R) -> Result<T, CodecError> {
    let body_len = match reader.read_u32::<LittleEndian>() {
        Ok(v) => v,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            return Err(CodecError::Corrupt("missing frame header".into()))
        }
        Err(e) => return Err(CodecError::Io(e)),
    };
    if body_len > MAX_BODY_SIZE {
        return Err(CodecError::Corrupt(format!("absurd body length {}", body_len)));
    }

    let crc = match reader.read_u32::<LittleEndian>() {
        Ok(v) => v,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            return Err(CodecError::Corrupt("truncated frame header".into()))
        }
        Err(e) => return Err(CodecError::Io(e)),
    };

    let mut body = vec![0u8; body_len as usize];
    match reader.read_exact(&mut body) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            return Err(CodecError::Corrupt(format!(
                "truncated frame body (expected {} bytes)",
                body_len
            )))
        }
        Err(e) => return Err(CodecError::Io(e)),
    }

    if checksum(&body) != crc {
        return Err(CodecError::Corrupt("checksum mismatch".into()));
    }

    bincode::deserialize(&body).map_err(|e| CodecError::Corrupt(e.to_string()))
}

/// Decodes a complete frame held in memory. Trailing bytes are rejected.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let mut cursor = bytes;
    let value = read_frame(&mut cursor)?;
    if !cursor.is_empty() {
        return Err(CodecError::Corrupt(format!(
            "{} trailing bytes after frame",
            cursor.len()
        )));
    }
    Ok(value)
}

/// Returns `path` with [`TMP_SUFFIX`] appended to its file name.
#[must_use]
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_os_string();
    s.push(TMP_SUFFIX);
    PathBuf::from(s)
}

/// Atomically replaces the file at `path` with the frame for `value`.
///
/// When `sync` is `true` the temp file is fsynced before the rename.
pub fn write_file<P, T>(path: P, value: &T, sync: bool) -> Result<(), CodecError>
where
    P: AsRef<Path>,
    T: Serialize + ?Sized,
{
    let path = path.as_ref();
    let frame = encode(value)?;
    let tmp = tmp_path(path);

    write_direct(&tmp, &frame, sync)?;

    // Some platforms refuse to rename over an existing file; fall back to a
    // direct overwrite in that case. The temp file is removed either way.
    if fs::rename(&tmp, path).is_err() {
        let written = write_direct(path, &frame, sync);
        let removed = fs::remove_file(&tmp);
        written?;
        removed?;
    }

    Ok(())
}

fn write_direct(path: &Path, frame: &[u8], sync: bool) -> io::Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    f.write_all(frame)?;
    f.flush()?;
    if sync {
        f.sync_all()?;
    }
    Ok(())
}

/// Reads and decodes the frame stored at `path`.
pub fn read_file<P, T>(path: P) -> Result<T, CodecError>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    let mut reader = BufReader::new(File::open(path)?);
    let value = read_frame(&mut reader)?;
    let mut rest = [0u8; 1];
    if reader.read(&mut rest)? != 0 {
        return Err(CodecError::Corrupt("trailing bytes after frame".into()));
    }
    Ok(value)
}
