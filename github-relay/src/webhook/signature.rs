//! GitHub webhook signature verification.
//!
//! GitHub signs the raw request body with HMAC using the webhook secret and
//! sends the result as `<algorithm>=<hex>`. `X-Hub-Signature-256` carries the
//! SHA-256 variant; the legacy `X-Hub-Signature` header carries SHA-1 and is
//! only consulted when the SHA-256 header is absent.
//! Reference: https://docs.github.com/en/webhooks/using-webhooks/validating-webhook-deliveries

use base64::Engine;
use hmac::{digest::KeyInit, Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use tracing::warn;

use super::request::{RawRequest, SHA1_SIGNATURE_HEADER, SHA256_SIGNATURE_HEADER};
use crate::error::WebhookError;

type HmacSha256 = Hmac<Sha256>;
type HmacSha1 = Hmac<Sha1>;

/// HMAC algorithms GitHub signs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    Sha256,
    Sha1,
}

impl SignatureAlgorithm {
    pub fn prefix(self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha256 => "sha256=",
            SignatureAlgorithm::Sha1 => "sha1=",
        }
    }
}

/// Payload bytes whose signature has been checked against the secret.
///
/// Only [`verify_request`] can produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayload(Vec<u8>);

impl VerifiedPayload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

/// Parse a signature header value such as `sha256=abcd...` into its
/// algorithm and raw digest bytes.
///
/// Returns `None` for unknown algorithms and invalid hex.
pub fn parse_signature_header(value: &str) -> Option<(SignatureAlgorithm, Vec<u8>)> {
    let value = value.trim();
    [SignatureAlgorithm::Sha256, SignatureAlgorithm::Sha1]
        .into_iter()
        .find_map(|algorithm| {
            let hex_sig = value.strip_prefix(algorithm.prefix())?;
            hex::decode(hex_sig).ok().map(|digest| (algorithm, digest))
        })
}

/// Verify `signature` (a header value) over `body` with `secret`.
///
/// The digest comparison is constant-time. Request handling goes through
/// [`verify_request`], which also extracts the payload and returns it as a
/// [`VerifiedPayload`].
pub fn verify(body: &[u8], signature: &str, secret: &[u8]) -> Result<(), WebhookError> {
    let (algorithm, expected) = parse_signature_header(signature).ok_or_else(|| {
        WebhookError::Authentication("unrecognized signature format".to_string())
    })?;

    let valid = match algorithm {
        SignatureAlgorithm::Sha256 => mac_matches::<HmacSha256>(secret, body, &expected),
        SignatureAlgorithm::Sha1 => mac_matches::<HmacSha1>(secret, body, &expected),
    };

    if !valid {
        warn!(
            algorithm = ?algorithm,
            body_length = body.len(),
            "webhook_signature_mismatch"
        );
        return Err(WebhookError::Authentication(
            "payload signature check failed".to_string(),
        ));
    }

    Ok(())
}

fn mac_matches<M: Mac + KeyInit>(secret: &[u8], body: &[u8], expected: &[u8]) -> bool {
    let mut mac = match <M as Mac>::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(body);
    mac.verify_slice(expected).is_ok()
}

/// Authenticate a whole request and extract its payload.
///
/// Checks, in order: a signature header is present, the content type parses,
/// a base64 body decodes, the media type is supported, and the signature
/// matches. The signature always covers the full raw body; for form-encoded
/// deliveries the returned payload is the `payload` field.
pub fn verify_request(request: &RawRequest, secret: &[u8]) -> Result<VerifiedPayload, WebhookError> {
    let signature = request
        .header(SHA256_SIGNATURE_HEADER)
        .or_else(|| request.header(SHA1_SIGNATURE_HEADER))
        .ok_or_else(|| WebhookError::MalformedRequest("missing signature header".to_string()))?;

    let raw_content_type = request.content_type().unwrap_or_default();
    let media_type = parse_media_type(raw_content_type).ok_or_else(|| {
        WebhookError::MalformedRequest(format!(
            "parse media type from '{raw_content_type}'"
        ))
    })?;

    let body = if request.is_base64_encoded() {
        base64::engine::general_purpose::STANDARD
            .decode(request.body())
            .map_err(|e| WebhookError::MalformedRequest(format!("decoding body: {e}")))?
    } else {
        request.body().to_vec()
    };

    let payload = if media_type == mime::APPLICATION_JSON.essence_str() {
        body.clone()
    } else if media_type == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() {
        url::form_urlencoded::parse(&body)
            .find(|(key, _)| key == "payload")
            .map(|(_, value)| value.into_owned().into_bytes())
            .ok_or_else(|| {
                WebhookError::MalformedRequest("form body has no 'payload' field".to_string())
            })?
    } else {
        return Err(WebhookError::MalformedRequest(format!(
            "webhook request has unsupported Content-Type '{media_type}'"
        )));
    };

    verify(&body, signature, secret)?;

    Ok(VerifiedPayload(payload))
}

/// Parse a `Content-Type` value down to its lowercased `type/subtype`.
fn parse_media_type(value: &str) -> Option<String> {
    let mime: mime::Mime = value.trim().parse().ok()?;
    if mime.subtype().as_str().is_empty() {
        return None;
    }
    Some(mime.essence_str().to_string())
}
