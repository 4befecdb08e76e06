//! Protocol types shared by the codec and the connection loop.
//!
//! - [`RequestHeader`]: a decoded request head, before its body is attached
//! - [`PayloadSize`]: how the body following a head is delimited
//! - [`HttpError`], [`ParseError`], [`SendError`]: the error hierarchy

mod request;
pub use request::RequestHeader;
pub(crate) use request::keep_alive;

mod payload;
pub use payload::PayloadSize;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
