//! Wire types and JSON codec shared by the manager and peer binaries.
//!
//! Every type here mirrors a concrete JSON shape: field names and `kebab-case`
//! tags are chosen to match the protocol's external interface exactly, not
//! Rust naming conventions, since they cross the wire.

mod codec;
mod envelope;
mod handle;
mod peer_message;
mod reply;
mod request;

pub use codec::{decode, encode, CodecError, MAX_DATAGRAM_BYTES};
pub use envelope::Envelope;
pub use handle::PeerHandle;
pub use peer_message::{Cause, PeerMessage};
pub use reply::{ManagerReply, ManagerSuccess};
pub use request::ManagerRequest;
