use super::{HEADER_LEN, OpCode, RequestHeader};
use crate::cursor::ServerCursor;
use crate::errors::{DriverError, Result};

/// Request to release a set of server cursors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillCursor {
    pub server_cursors: Vec<ServerCursor>,
}

impl KillCursor {
    #[must_use]
    pub const fn new(server_cursors: Vec<ServerCursor>) -> Self {
        Self { server_cursors }
    }
}

/// `OP_KILL_CURSORS` message. No reply is sent for it.
///
/// Body: `int32 0` (reserved), `int32 count`, then `count` int64 cursor ids,
/// all little-endian, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillCursorsMessage {
    cursor_ids: Vec<i64>,
}

impl KillCursorsMessage {
    #[must_use]
    pub const fn new(cursor_ids: Vec<i64>) -> Self {
        Self { cursor_ids }
    }

    #[must_use]
    pub fn from_kill_cursor(kill: &KillCursor) -> Self {
        Self::new(kill.server_cursors.iter().map(|c| c.id).collect())
    }

    #[must_use]
    pub fn cursor_ids(&self) -> &[i64] {
        &self.cursor_ids
    }

    #[must_use]
    pub const fn op_code(&self) -> OpCode {
        OpCode::KillCursors
    }

    #[must_use]
    pub fn body_len(&self) -> usize {
        8 + 8 * self.cursor_ids.len()
    }

    pub fn encode_body(&self, buf: &mut Vec<u8>) -> Result<()> {
        let count = i32::try_from(self.cursor_ids.len())
            .map_err(|_| DriverError::Encoding(format!("too many cursor ids: {}", self.cursor_ids.len())))?;
        buf.reserve(self.body_len());
        buf.extend_from_slice(&0_i32.to_le_bytes());
        buf.extend_from_slice(&count.to_le_bytes());
        for id in &self.cursor_ids {
            buf.extend_from_slice(&id.to_le_bytes());
        }
        Ok(())
    }

    /// Full framed message: header followed by the body.
    pub fn encode(&self, request_id: i32) -> Result<Vec<u8>> {
        let total = HEADER_LEN + self.body_len();
        let message_length =
            i32::try_from(total).map_err(|_| DriverError::Encoding(format!("message too large: {total} bytes")))?;
        let header = RequestHeader { message_length, request_id, response_to: 0, op_code: self.op_code() };
        let mut buf = Vec::with_capacity(total);
        header.write_to(&mut buf);
        self.encode_body(&mut buf)?;
        Ok(buf)
    }
}
