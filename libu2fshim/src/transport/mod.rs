pub mod error;
pub mod memory;

mod channel;

pub use channel::{Channel, MessageData, MessageEvent};
pub use memory::MemoryChannel;
