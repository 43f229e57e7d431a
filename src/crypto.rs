//! Login token generation.
//!
//! Tokens are bearer credentials delivered out-of-band, so the only thing
//! that matters is entropy: 32 bytes from the OS RNG, URL-safe base64 so
//! the token can live in a link path without escaping.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Raw entropy per token (256 bits).
const TOKEN_BYTES: usize = 32;

pub fn generate_login_token() -> String {
    use rand::rngs::OsRng;
    use rand::RngCore;

    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let a = generate_login_token();
        let b = generate_login_token();
        assert_ne!(a, b);
        // 32 bytes -> 43 base64 chars, no padding
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
