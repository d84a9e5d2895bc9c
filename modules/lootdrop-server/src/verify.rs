use anyhow::{anyhow, Context, Result};
use ed25519_dalek::{Signature, VerifyingKey};

/// Verifies interaction request signatures before anything is parsed.
/// Discord signs `timestamp || raw_body` with the application's
/// Ed25519 key and probes the endpoint with bad signatures at
/// registration time, so rejection is a normal code path.
pub struct RequestVerifier {
    key: VerifyingKey,
}

impl RequestVerifier {
    pub fn new(public_key_hex: &str) -> Result<Self> {
        let bytes: [u8; 32] = hex::decode(public_key_hex)
            .context("Public key is not valid hex")?
            .try_into()
            .map_err(|_| anyhow!("Public key must be 32 bytes"))?;
        let key = VerifyingKey::from_bytes(&bytes).context("Public key is not a valid point")?;
        Ok(Self { key })
    }

    pub fn verify(&self, timestamp: &str, body: &[u8], signature_hex: &str) -> bool {
        let Ok(signature_bytes) = hex::decode(signature_hex) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&signature_bytes) else {
            return false;
        };

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.key.verify_strict(&message, &signature).is_ok()
    }
}
