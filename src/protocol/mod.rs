//! Legacy wire-protocol framing. Only the pieces the core sends itself live here.

mod header;
mod kill_cursors;
mod opcode;

pub use header::{HEADER_LEN, RequestHeader, next_request_id};
pub use kill_cursors::{KillCursor, KillCursorsMessage};
pub use opcode::OpCode;
