//! Messaging - 프런트엔드 ↔ 백엔드 메시지 계층
//!
//! ```text
//! Messenger ──(Message, requestId)──► MessageSink ──► DispatchRouter
//!     ▲                                                   │
//!     └──────────── receive(<type>_Response) ◄────────────┘
//! ```

mod correlator;
mod protocol;
mod transport;

pub use correlator::{Messenger, Subscription};
pub use protocol::{
    decode_line, encode_line, reply_marker, Message, ReplyError, DEFAULT_REPLY_SUFFIX,
};
pub use transport::{spawn_writer, ChannelSink, MessageReader, MessageSink, StdioPeer};
