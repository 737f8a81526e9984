//! UDP wire codec
//!
//! Emits and parses the exact byte layout agreed between agent and
//! collector: fixed-length fields, little-endian integers and floats, no
//! reliance on native struct padding. Every field is read or written
//! explicitly so the layout is enforced by construction rather than by
//! `#[repr(C, packed)]` convention.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Cursor, Read, Write};
use thiserror::Error;

use crate::datablock::{Datablock, DATABLOCKARRAY_LEN};
use crate::timestamp::Timestamp;

pub const MAGIC: &[u8; 16] = b"fslatency      \0";
pub const VERSION_MAJOR: u16 = 0;
pub const VERSION_MINOR: u16 = 1;
pub const HOSTNAME_LEN: usize = 64;
pub const TEXT_LEN: usize = 64;

const TIMESTAMP_LEN: usize = 16;
const DATABLOCK_LEN: usize = 8 + TIMESTAMP_LEN * 2 + 8 * 4;
pub const MESSAGEBLOCK_LEN: usize =
    16 + 2 + 2 + HOSTNAME_LEN + TEXT_LEN + TIMESTAMP_LEN + DATABLOCK_LEN * DATABLOCKARRAY_LEN;

#[derive(Debug, Error, PartialEq)]
pub enum WireError {
    #[error("datagram is {got} bytes, expected {expected}")]
    WrongSize { expected: usize, got: usize },
    #[error("bad magic bytes")]
    BadMagic,
    #[error("unsupported version {major}.{minor}")]
    UnsupportedVersion { major: u16, minor: u16 },
    #[error("i/o error decoding datagram: {0}")]
    Io(String),
}

impl From<io::Error> for WireError {
    fn from(e: io::Error) -> Self {
        WireError::Io(e.to_string())
    }
}

/// The full UDP payload: header plus eight historical datablocks, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Messageblock {
    pub major: u16,
    pub minor: u16,
    pub hostname: [u8; HOSTNAME_LEN],
    pub text: [u8; TEXT_LEN],
    pub precision: Timestamp,
    pub datablocks: [Datablock; DATABLOCKARRAY_LEN],
}

fn fixed_bytes<const N: usize>(s: &str) -> [u8; N] {
    let mut out = [0u8; N];
    let bytes = s.as_bytes();
    let n = bytes.len().min(N);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}

impl Messageblock {
    pub fn new(hostname: &str, text: &str, precision: Timestamp) -> Self {
        Self {
            major: VERSION_MAJOR,
            minor: VERSION_MINOR,
            hostname: fixed_bytes(hostname),
            text: fixed_bytes(text),
            precision,
            datablocks: [Datablock::empty(); DATABLOCKARRAY_LEN],
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(MESSAGEBLOCK_LEN);
        buf.extend_from_slice(MAGIC);
        buf.write_u16::<LittleEndian>(self.major).unwrap();
        buf.write_u16::<LittleEndian>(self.minor).unwrap();
        buf.extend_from_slice(&self.hostname);
        buf.extend_from_slice(&self.text);
        write_timestamp(&mut buf, self.precision);
        for db in &self.datablocks {
            write_datablock(&mut buf, db);
        }
        debug_assert_eq!(buf.len(), MESSAGEBLOCK_LEN);
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() != MESSAGEBLOCK_LEN {
            return Err(WireError::WrongSize {
                expected: MESSAGEBLOCK_LEN,
                got: bytes.len(),
            });
        }
        let mut cur = Cursor::new(bytes);

        let mut magic = [0u8; 16];
        cur.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(WireError::BadMagic);
        }
        let major = cur.read_u16::<LittleEndian>()?;
        let minor = cur.read_u16::<LittleEndian>()?;
        if major != VERSION_MAJOR || minor != VERSION_MINOR {
            return Err(WireError::UnsupportedVersion { major, minor });
        }
        let mut hostname = [0u8; HOSTNAME_LEN];
        cur.read_exact(&mut hostname)?;
        let mut text = [0u8; TEXT_LEN];
        cur.read_exact(&mut text)?;
        let precision = read_timestamp(&mut cur)?;

        let mut datablocks = [Datablock::empty(); DATABLOCKARRAY_LEN];
        for slot in &mut datablocks {
            *slot = read_datablock(&mut cur)?;
        }

        Ok(Self {
            major,
            minor,
            hostname,
            text,
            precision,
            datablocks,
        })
    }

    /// The 128-byte (hostname || text) key used to identify a client in the
    /// name registry.
    pub fn identity_key(&self) -> [u8; HOSTNAME_LEN + TEXT_LEN] {
        let mut key = [0u8; HOSTNAME_LEN + TEXT_LEN];
        key[..HOSTNAME_LEN].copy_from_slice(&self.hostname);
        key[HOSTNAME_LEN..].copy_from_slice(&self.text);
        key
    }
}

fn write_timestamp(buf: &mut Vec<u8>, ts: Timestamp) {
    buf.write_i64::<LittleEndian>(ts.sec).unwrap();
    buf.write_i64::<LittleEndian>(ts.nsec).unwrap();
}

fn read_timestamp(cur: &mut Cursor<&[u8]>) -> Result<Timestamp, WireError> {
    let sec = cur.read_i64::<LittleEndian>()?;
    let nsec = cur.read_i64::<LittleEndian>()?;
    Ok(Timestamp::new(sec, nsec))
}

fn write_datablock(buf: &mut Vec<u8>, db: &Datablock) {
    buf.write_u64::<LittleEndian>(db.measurementcount).unwrap();
    write_timestamp(buf, db.starttime);
    write_timestamp(buf, db.endtime);
    buf.write_f64::<LittleEndian>(db.min).unwrap();
    buf.write_f64::<LittleEndian>(db.max).unwrap();
    buf.write_f64::<LittleEndian>(db.sumx).unwrap();
    buf.write_f64::<LittleEndian>(db.sumxx).unwrap();
}

fn read_datablock(cur: &mut Cursor<&[u8]>) -> Result<Datablock, WireError> {
    let measurementcount = cur.read_u64::<LittleEndian>()?;
    let starttime = read_timestamp(cur)?;
    let endtime = read_timestamp(cur)?;
    let min = cur.read_f64::<LittleEndian>()?;
    let max = cur.read_f64::<LittleEndian>()?;
    let sumx = cur.read_f64::<LittleEndian>()?;
    let sumxx = cur.read_f64::<LittleEndian>()?;
    Ok(Datablock {
        measurementcount,
        starttime,
        endtime,
        min,
        max,
        sumx,
        sumxx,
    })
}

/// Write `text`, truncated to exactly `N` bytes with no terminator
/// guarantee if it does not fit (resolves the off-by-one ambiguity in the
/// original tool's `--text` length check).
pub fn truncate_into<const N: usize>(text: &str) -> [u8; N] {
    fixed_bytes(text)
}
