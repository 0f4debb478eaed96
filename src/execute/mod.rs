//! Execute message handlers, one module per concern:
//! - `delegate` - the write-once delegate-key registry
//! - `event` - remote-chain event voting
//! - `confirm` - checkpoint signature submission
//! - `pool` - outgoing transfers, cancellation and batch requests

mod confirm;
mod delegate;
mod event;
mod pool;

pub use confirm::*;
pub use delegate::*;
pub use event::*;
pub use pool::*;
