//! Guest checkout password generation

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::RngCore;

/// Generate an unguessable password for a guest-checkout account.
///
/// The user never sees this password; they set their own through the
/// invitation flow. 12 random bytes, base64-encoded.
pub fn generate_password() -> String {
    let mut bytes = [0u8; 12];
    rand::rng().fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passwords_are_unique_and_nonempty() {
        let a = generate_password();
        let b = generate_password();
        assert_ne!(a, b);
        assert_eq!(a.len(), 16); // 12 bytes -> 16 base64 chars
    }
}
