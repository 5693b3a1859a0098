//! The acting principal, opaque to the core beyond identity and a reply
//! sink.
//!
//! Generalizes the teacher's `CommandSender` (`command/sender.rs`), which
//! is a concrete three-variant enum (`Player`/`Console`/`Rcon`) tied to the
//! Minecraft protocol. The core can't depend on a concrete actor type (the
//! Design Notes call for actor polymorphism to be a single type parameter,
//! not an inheritance hierarchy), so it asks only for identity and a
//! reply/error sink through a trait, the same two operations
//! `CommandSender` exposes (`send_message`, implicit identity via
//! `Display`/equality).
use std::hash::Hash;

/// Opaque identity used for cooldown keying and hook/equality checks.
/// Embedders typically wrap a UUID, an integer id, or a session token.
pub trait ActorId: Clone + Eq + Hash + Send + Sync + 'static {}
impl<T: Clone + Eq + Hash + Send + Sync + 'static> ActorId for T {}

/// The principal invoking a command.
pub trait Actor: Send + Sync + 'static {
    /// Stable identity, used for cooldown keying and hook bookkeeping.
    type Id: ActorId;

    /// Returns this actor's identity.
    fn id(&self) -> Self::Id;

    /// Sends a normal reply.
    fn reply(&self, text: &str);

    /// Sends an error reply. Default implementation forwards to
    /// [`reply`](Self::reply); embedders with a distinct error channel
    /// (chat color, stderr, an ephemeral toast) override it.
    fn error(&self, text: &str) {
        self.reply(text);
    }
}
