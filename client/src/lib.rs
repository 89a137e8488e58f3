// Library entry for the client session engine. Re-exports the modules so
// integration tests and embedding applications can depend on the crate as
// a library.

pub mod api;
pub mod channel;
pub mod controller;
pub mod error;
pub mod events;
pub mod store;
pub mod transport;

pub use api::GameApi;
pub use channel::{ChannelConfig, HandlerId, LinkState, MessageChannel};
pub use controller::SessionController;
pub use error::ClientError;
pub use events::{ChannelEvent, EventKind, OutboundEvent};
pub use store::SessionStore;
pub use transport::{Dial, TcpDialer, TcpTransport, Transport};
