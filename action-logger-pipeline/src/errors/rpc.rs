//! JSON-RPC error codes shared by wallet and contract error classification.
use alloy::transports::TransportError;

/// EIP-1193: the user rejected the request.
pub(crate) const USER_REJECTED_CODE: i64 = 4001;
/// EIP-3326: the requested chain has not been added to the wallet.
pub(crate) const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;
/// JSON-RPC 2.0: the method does not exist on the endpoint.
pub(crate) const METHOD_NOT_FOUND_CODE: i64 = -32601;

/// Extracts the JSON-RPC error code when the endpoint answered with an error object.
pub(crate) fn rpc_error_code(err: &TransportError) -> Option<i64> {
    err.as_error_resp().map(|payload| payload.code)
}
