//! Resource stores
//!
//! The stateful core of the crate: each store owns the authoritative local
//! copy of one domain aggregate, tracks loading/error/mutating flags,
//! collapses concurrent fetches, applies optimistic local mutations and
//! reconciles network responses against a tracked request epoch. Consumers
//! observe stores through read-only snapshots published on a watch channel;
//! stale responses are dropped, never applied out of order.

mod conversations;
mod disputes;
mod messages;

pub use conversations::{ConversationStore, ConversationsSnapshot};
pub use disputes::{DisputeStore, DisputesSnapshot};
pub use messages::{MessageStore, MessagesSnapshot};
