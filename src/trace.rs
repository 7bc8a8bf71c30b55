use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

const MAGIC: &[u8; 4] = b"B2R1"; // ASCII magic
const VERSION: u8 = 1;
const ENDIAN_LE: u8 = 0; // 0 = little-endian

use serde::{Deserialize, Serialize};

use crate::board::Board;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub width: u8,
    pub height: u8,
    pub steps: u32,
    pub start_unix_s: u64,
    pub elapsed_s: f32,
    pub highest_tile: u32,
    pub engine_str: Option<String>,
}

impl Meta {
    #[inline]
    fn cells(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub meta: Meta,
    /// Row-major exponent snapshots, `(steps + 1) * width * height` bytes.
    pub states: Vec<u8>,
    /// One direction byte per step (`Direction::to_u8`).
    pub moves: Vec<u8>,
}

impl Run {
    /// Rebuild the board as of snapshot `idx` (0 = before the first move).
    pub fn state_at(&self, idx: usize) -> Option<Board> {
        let cells = self.meta.cells();
        let chunk = self.states.get(idx * cells..(idx + 1) * cells)?;
        Some(Board::from_exponents(
            u32::from(self.meta.width),
            u32::from(self.meta.height),
            chunk,
        ))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TraceError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid magic or version")]
    MagicOrVersion,
    #[error("unsupported endianness")]
    Endianness,
    #[error("file too short or malformed")]
    Malformed,
    #[error("checksum mismatch")]
    Checksum,
}

#[inline]
fn read_u16_le(bytes: &[u8]) -> Option<u16> {
    if bytes.len() < 2 {
        return None;
    }
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

#[inline]
fn read_u32_le(bytes: &[u8]) -> Option<u32> {
    if bytes.len() < 4 {
        return None;
    }
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[inline]
fn read_u64_le(bytes: &[u8]) -> Option<u64> {
    if bytes.len() < 8 {
        return None;
    }
    Some(u64::from_le_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ]))
}

#[inline]
fn read_f32_le(bytes: &[u8]) -> Option<f32> {
    read_u32_le(bytes).map(f32::from_bits)
}

// Header size:
// 4 magic + 1 version + 1 endian + 1 width + 1 height + 4 steps + 8 start
// + 4 elapsed + 4 highest_tile + 2 engine_len
const HEADER_LEN: usize = 4 + 1 + 1 + 1 + 1 + 4 + 8 + 4 + 4 + 2;

pub fn encode_run(meta: &Meta, states: &[u8], moves: &[u8]) -> Vec<u8> {
    // Validate lengths consistent
    assert!(meta.width > 0 && meta.height > 0);
    assert_eq!(states.len(), (meta.steps as usize + 1) * meta.cells());
    assert_eq!(moves.len(), meta.steps as usize);

    let engine_bytes = meta.engine_str.as_ref().map(|s| s.as_bytes()).unwrap_or(&[]);
    let engine_len: u16 = engine_bytes
        .len()
        .try_into()
        .expect("engine_str too long for u16 length");

    let payload_len = engine_len as usize + states.len() + moves.len();
    let mut buf = Vec::with_capacity(HEADER_LEN + payload_len + 4);

    // Header
    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    buf.push(ENDIAN_LE);
    buf.push(meta.width);
    buf.push(meta.height);
    buf.extend_from_slice(&meta.steps.to_le_bytes());
    buf.extend_from_slice(&meta.start_unix_s.to_le_bytes());
    buf.extend_from_slice(&meta.elapsed_s.to_bits().to_le_bytes());
    buf.extend_from_slice(&meta.highest_tile.to_le_bytes());
    buf.extend_from_slice(&engine_len.to_le_bytes());

    // Variable metadata
    buf.extend_from_slice(engine_bytes);

    // Payload: exponent snapshots, then move bytes
    buf.extend_from_slice(states);
    buf.extend_from_slice(moves);

    // Trailer: CRC32C of all preceding bytes
    let checksum = crc32c::crc32c(&buf);
    buf.extend_from_slice(&checksum.to_le_bytes());
    buf
}

pub fn write_run_to_path<P: AsRef<Path>>(
    path: P,
    meta: &Meta,
    states: &[u8],
    moves: &[u8],
) -> Result<(), TraceError> {
    let data = encode_run(meta, states, moves);
    let mut f = fs::File::create(path)?;
    f.write_all(&data)?;
    Ok(())
}

pub fn parse_run_bytes(bytes: &[u8]) -> Result<Run, TraceError> {
    if bytes.len() < HEADER_LEN + 4 {
        // header + checksum at minimum (no payload)
        return Err(TraceError::Malformed);
    }

    // Validate checksum first to avoid panics while reading fields
    let (content, trailer) = bytes.split_at(bytes.len() - 4);
    let file_crc = read_u32_le(trailer).ok_or(TraceError::Malformed)?;
    let calc_crc = crc32c::crc32c(content);
    if file_crc != calc_crc {
        return Err(TraceError::Checksum);
    }

    // Fixed header
    if &content[..4] != MAGIC {
        return Err(TraceError::MagicOrVersion);
    }
    if content[4] != VERSION {
        return Err(TraceError::MagicOrVersion);
    }
    if content[5] != ENDIAN_LE {
        return Err(TraceError::Endianness);
    }
    let width = content[6];
    let height = content[7];
    if width == 0 || height == 0 {
        return Err(TraceError::Malformed);
    }

    let mut off = 8;
    let steps = read_u32_le(&content[off..]).ok_or(TraceError::Malformed)?;
    off += 4;
    let start_unix_s = read_u64_le(&content[off..]).ok_or(TraceError::Malformed)?;
    off += 8;
    let elapsed_s = read_f32_le(&content[off..]).ok_or(TraceError::Malformed)?;
    off += 4;
    let highest_tile = read_u32_le(&content[off..]).ok_or(TraceError::Malformed)?;
    off += 4;
    let engine_len = read_u16_le(&content[off..]).ok_or(TraceError::Malformed)? as usize;
    off += 2;

    if content.len() < off + engine_len {
        return Err(TraceError::Malformed);
    }
    let engine_bytes = &content[off..off + engine_len];
    off += engine_len;
    let engine_str = if engine_len > 0 {
        match std::str::from_utf8(engine_bytes) {
            Ok(s) => Some(s.to_string()),
            Err(_) => None,
        }
    } else {
        None
    };

    let cells = width as usize * height as usize;
    let states_len = (steps as usize)
        .checked_add(1)
        .and_then(|n| n.checked_mul(cells))
        .ok_or(TraceError::Malformed)?;
    let moves_len = steps as usize;

    if content.len() < off + states_len + moves_len {
        return Err(TraceError::Malformed);
    }

    let states = content[off..off + states_len].to_vec();
    off += states_len;
    let moves = content[off..off + moves_len].to_vec();

    let meta = Meta {
        width,
        height,
        steps,
        start_unix_s,
        elapsed_s,
        highest_tile,
        engine_str,
    };

    Ok(Run { meta, states, moves })
}

pub fn parse_run_file<P: AsRef<Path>>(path: P) -> Result<Run, TraceError> {
    let data = fs::read(path)?;
    parse_run_bytes(&data)
}

pub fn now_unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
