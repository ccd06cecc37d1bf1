use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use hkdf::Hkdf;
use sha2::Sha256;
use uuid::Uuid;

use crate::error::ApiError;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Derives the per-user profile key from the process master key.
///
/// The master key itself never encrypts payloads; each account gets its own
/// HKDF-SHA256 expansion keyed by its user id, so one client's key cannot
/// decrypt another account's profile.
pub fn derive_profile_key(master: &[u8; 32], user_id: Uuid) -> [u8; 32] {
    let hk = Hkdf::<Sha256>::new(None, master);
    let info = format!("profile-key:{user_id}");
    let mut okm = [0u8; 32];
    hk.expand(info.as_bytes(), &mut okm)
        .expect("32 bytes is a valid HKDF-SHA256 output length");
    okm
}

/// Encrypts a JSON-serializable payload with AES-256-GCM and encodes the
/// result as `nonceHex:tagHex:cipherHex`. A fresh random 96-bit nonce is
/// drawn from the OS RNG on every call.
pub fn encrypt(payload: &serde_json::Value, key: &[u8; 32]) -> Result<String, ApiError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let plaintext = serde_json::to_vec(payload)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("serialize payload: {e}")))?;

    // aes-gcm appends the 16-byte tag to the ciphertext
    let sealed = cipher
        .encrypt(&nonce, plaintext.as_ref())
        .map_err(|_| ApiError::Internal(anyhow::anyhow!("aead seal failed")))?;
    let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);

    Ok(format!(
        "{}:{}:{}",
        hex::encode(nonce),
        hex::encode(tag),
        hex::encode(ciphertext)
    ))
}

/// Reverses [`encrypt`]. Fails with `ApiError::Decrypt` if the string does
/// not have exactly three hex parts, the nonce or tag has the wrong length,
/// or tag verification fails; format and authentication failures are
/// deliberately indistinguishable to the caller.
pub fn decrypt(encoded: &str, key: &[u8; 32]) -> Result<serde_json::Value, ApiError> {
    let parts: Vec<&str> = encoded.split(':').collect();
    let [nonce_hex, tag_hex, cipher_hex] = parts.as_slice() else {
        return Err(ApiError::Decrypt);
    };

    let nonce_bytes = hex::decode(nonce_hex).map_err(|_| ApiError::Decrypt)?;
    let tag = hex::decode(tag_hex).map_err(|_| ApiError::Decrypt)?;
    let ciphertext = hex::decode(cipher_hex).map_err(|_| ApiError::Decrypt)?;
    if nonce_bytes.len() != NONCE_LEN || tag.len() != TAG_LEN {
        return Err(ApiError::Decrypt);
    }

    let mut sealed = ciphertext;
    sealed.extend_from_slice(&tag);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), sealed.as_ref())
        .map_err(|_| ApiError::Decrypt)?;

    serde_json::from_slice(&plaintext).map_err(|_| ApiError::Decrypt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEY: [u8; 32] = [1u8; 32];

    #[test]
    fn roundtrip_preserves_payload() {
        let payload = json!({ "email": "a@x.com", "joined": "2024-03-01" });
        let encoded = encrypt(&payload, &KEY).expect("encrypt");
        let decoded = decrypt(&encoded, &KEY).expect("decrypt");
        assert_eq!(decoded, payload);
    }

    #[test]
    fn encoding_has_exactly_two_delimiters() {
        let encoded = encrypt(&json!("hello"), &KEY).expect("encrypt");
        assert_eq!(encoded.matches(':').count(), 2);
        let nonce_hex = encoded.split(':').next().unwrap();
        assert_eq!(nonce_hex.len(), NONCE_LEN * 2);
    }

    #[test]
    fn fresh_nonce_per_call() {
        let payload = json!({ "q": "naruto" });
        let a = encrypt(&payload, &KEY).expect("encrypt");
        let b = encrypt(&payload, &KEY).expect("encrypt");
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_fails() {
        let encoded = encrypt(&json!({ "secret": true }), &KEY).expect("encrypt");
        let err = decrypt(&encoded, &[2u8; 32]).unwrap_err();
        assert!(matches!(err, ApiError::Decrypt));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let encoded = encrypt(&json!({ "secret": true }), &KEY).expect("encrypt");
        let mut parts: Vec<String> = encoded.split(':').map(String::from).collect();
        let flipped = if parts[2].ends_with('0') { "1" } else { "0" };
        let end = parts[2].len() - 1;
        parts[2].replace_range(end.., flipped);
        let err = decrypt(&parts.join(":"), &KEY).unwrap_err();
        assert!(matches!(err, ApiError::Decrypt));
    }

    #[test]
    fn malformed_encodings_fail() {
        for bad in [
            "",
            "abc",
            "aabb:ccdd",
            "aabb:ccdd:eeff:0011",
            "zz:ccdd:eeff",
            "aabb:zz:eeff",
        ] {
            assert!(matches!(decrypt(bad, &KEY), Err(ApiError::Decrypt)));
        }
    }

    #[test]
    fn derived_keys_differ_per_user() {
        let master = [9u8; 32];
        let k1 = derive_profile_key(&master, Uuid::new_v4());
        let k2 = derive_profile_key(&master, Uuid::new_v4());
        assert_ne!(k1, k2);
        assert_ne!(k1, master);
    }

    #[test]
    fn derived_key_is_stable_for_a_user() {
        let master = [9u8; 32];
        let id = Uuid::new_v4();
        assert_eq!(
            derive_profile_key(&master, id),
            derive_profile_key(&master, id)
        );
    }

    #[test]
    fn cross_user_key_cannot_decrypt() {
        let master = [9u8; 32];
        let alice = derive_profile_key(&master, Uuid::new_v4());
        let bob = derive_profile_key(&master, Uuid::new_v4());
        let encoded = encrypt(&json!({ "email": "alice@x.com" }), &alice).expect("encrypt");
        assert!(matches!(decrypt(&encoded, &bob), Err(ApiError::Decrypt)));
    }
}
