//! Bindings for the `EventLogger` contract.
//!
//! The contract exposes a single state-changing call taking the action text and
//! emits `ActionLogged` for every call.

alloy::sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    contract EventLogger {
        event ActionLogged(address indexed user, string action);

        function log(string action) external;
    }
}

pub use EventLogger::{ActionLogged, EventLoggerInstance};
