use alloy::primitives::Address;

/// Encodes an address as lowercase `0x`-prefixed hex, the form stored in the
/// `user_address` column.
pub fn encode_address(address: &Address) -> String {
    format!("0x{}", alloy::hex::encode(address.as_slice()))
}

/// Shortens an address for display, e.g. `0xd8dA...6045`.
pub fn shorten_address(address: &str) -> String {
    if address.is_empty() {
        return "???".to_string();
    }
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
