//! Linux evdev record layout
//!
//! Each record is 16 bytes, native (little-endian on the target) order:
//! `u32 seconds, u32 microseconds, u16 type, u16 code, i32 value`.

use byteorder::{ByteOrder, LittleEndian};
use std::time::Duration;

/// Size of one input record
pub const RECORD_LEN: usize = 16;

pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_ABS: u16 = 0x03;

pub const ABS_X: u16 = 0x00;
pub const ABS_Y: u16 = 0x01;

pub const BTN_TOUCH: u16 = 0x14a;

/// One decoded input record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    /// Kernel timestamp of the event
    pub time: Duration,
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

/// The subset of records the touch decoder acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchSignal {
    Press,
    Release,
    AbsX(i32),
    AbsY(i32),
}

impl RawEvent {
    pub fn new(time: Duration, kind: u16, code: u16, value: i32) -> Self {
        Self {
            time,
            kind,
            code,
            value,
        }
    }

    /// Parse one record; `None` unless exactly [`RECORD_LEN`] bytes
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != RECORD_LEN {
            return None;
        }
        let sec = LittleEndian::read_u32(&bytes[0..4]);
        let usec = LittleEndian::read_u32(&bytes[4..8]);
        Some(Self {
            time: Duration::from_secs(sec as u64) + Duration::from_micros(usec as u64),
            kind: LittleEndian::read_u16(&bytes[8..10]),
            code: LittleEndian::read_u16(&bytes[10..12]),
            value: LittleEndian::read_i32(&bytes[12..16]),
        })
    }

    pub fn to_bytes(&self) -> [u8; RECORD_LEN] {
        let mut out = [0u8; RECORD_LEN];
        LittleEndian::write_u32(&mut out[0..4], self.time.as_secs() as u32);
        LittleEndian::write_u32(&mut out[4..8], self.time.subsec_micros());
        LittleEndian::write_u16(&mut out[8..10], self.kind);
        LittleEndian::write_u16(&mut out[10..12], self.code);
        LittleEndian::write_i32(&mut out[12..16], self.value);
        out
    }

    pub fn signal(&self) -> Option<TouchSignal> {
        match (self.kind, self.code) {
            (EV_KEY, BTN_TOUCH) if self.value != 0 => Some(TouchSignal::Press),
            (EV_KEY, BTN_TOUCH) => Some(TouchSignal::Release),
            (EV_ABS, ABS_X) => Some(TouchSignal::AbsX(self.value)),
            (EV_ABS, ABS_Y) => Some(TouchSignal::AbsY(self.value)),
            _ => None,
        }
    }
}

/// Split a buffer into whole records, returning them and the count of
/// trailing bytes that did not form a full record
pub fn parse_records(buf: &[u8]) -> (Vec<RawEvent>, usize) {
    let chunks = buf.chunks_exact(RECORD_LEN);
    let rest = chunks.remainder().len();
    (chunks.filter_map(RawEvent::parse).collect(), rest)
}
