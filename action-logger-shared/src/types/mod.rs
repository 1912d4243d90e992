mod action_event;
mod address;
mod network;

pub use action_event::{ActionEvent, NewActionEvent, timestamp_from_unix};
pub use address::{encode_address, shorten_address};
pub use network::{NativeCurrency, NetworkConfig};
