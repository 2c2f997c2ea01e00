//! Channel name rules.

use super::ChannelError;

/// Checks that a channel name is usable as a table key.
///
/// Names must be non-empty, at most `max_len` bytes, and free of
/// whitespace and control characters.
pub fn validate_channel_name(name: &str, max_len: usize) -> Result<(), ChannelError> {
    if name.is_empty() {
        return Err(ChannelError::InvalidName("name is empty".to_string()));
    }
    if name.len() > max_len {
        return Err(ChannelError::InvalidName(format!(
            "name exceeds {} bytes",
            max_len
        )));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ChannelError::InvalidName(
            "name contains whitespace or control characters".to_string(),
        ));
    }
    Ok(())
}
