// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic cache fingerprints.

use sha2::{Digest, Sha256};

/// Separates content from user id so `("ab", "c")` and `("a", "bc")` differ.
const FIELD_SEPARATOR: u8 = 0x1f;

/// SHA-256 of `content ‖ 0x1f ‖ user_id`, hex-encoded and truncated to `hex_len` characters.
pub fn fingerprint(content: &str, user_id: &str, hex_len: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hasher.update([FIELD_SEPARATOR]);
    hasher.update(user_id.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(hex_len.clamp(1, 64));
    digest
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn truncates_to_requested_length() {
        assert_eq!(fingerprint("hi", "u1", 32).len(), 32);
        assert_eq!(fingerprint("hi", "u1", 200).len(), 64);
    }

    #[test]
    fn boundary_between_fields_matters() {
        assert_ne!(fingerprint("ab", "c", 32), fingerprint("a", "bc", 32));
    }

    proptest! {
        #[test]
        fn same_inputs_same_fingerprint(content in ".*", user in "[a-z0-9-]{1,16}") {
            prop_assert_eq!(fingerprint(&content, &user, 32), fingerprint(&content, &user, 32));
        }

        #[test]
        fn different_content_same_user_never_collides(
            a in "[ -~]{1,40}",
            b in "[ -~]{1,40}",
            user in "[a-z0-9]{1,8}",
        ) {
            prop_assume!(a != b);
            prop_assert_ne!(fingerprint(&a, &user, 32), fingerprint(&b, &user, 32));
        }
    }
}
