use super::OpCode;
use crate::errors::{DriverError, Result};
use std::sync::atomic::{AtomicI32, Ordering};

/// Standard message header: four little-endian int32s.
pub const HEADER_LEN: usize = 16;

static REQUEST_ID: AtomicI32 = AtomicI32::new(1);

/// Process-wide, monotonically increasing request id.
pub fn next_request_id() -> i32 {
    REQUEST_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    /// Total message size, header included.
    pub message_length: i32,
    pub request_id: i32,
    pub response_to: i32,
    pub op_code: OpCode,
}

impl RequestHeader {
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.message_length.to_le_bytes());
        buf.extend_from_slice(&self.request_id.to_le_bytes());
        buf.extend_from_slice(&self.response_to.to_le_bytes());
        buf.extend_from_slice(&self.op_code.value().to_le_bytes());
    }

    pub fn read_from(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(DriverError::Decoding(format!("header needs {HEADER_LEN} bytes, got {}", bytes.len())));
        }
        let int_at = |at: usize| i32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        let raw_op = int_at(12);
        let op_code = OpCode::from_value(raw_op).ok_or_else(|| DriverError::Decoding(format!("unknown op code {raw_op}")))?;
        Ok(Self { message_length: int_at(0), request_id: int_at(4), response_to: int_at(8), op_code })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let header = RequestHeader { message_length: 40, request_id: 7, response_to: 0, op_code: OpCode::KillCursors };
        let mut buf = Vec::new();
        header.write_to(&mut buf);
        assert_eq!(buf.len(), HEADER_LEN);
        assert_eq!(&buf[12..16], &2007_i32.to_le_bytes());
        assert_eq!(RequestHeader::read_from(&buf).unwrap(), header);
    }

    #[test]
    fn short_or_unknown_header_is_rejected() {
        assert!(RequestHeader::read_from(&[0; 8]).is_err());
        let mut buf = vec![0; 12];
        buf.extend_from_slice(&9999_i32.to_le_bytes());
        assert!(matches!(RequestHeader::read_from(&buf), Err(DriverError::Decoding(_))));
    }

    #[test]
    fn request_ids_increase() {
        let a = next_request_id();
        let b = next_request_id();
        assert!(b > a);
    }
}
