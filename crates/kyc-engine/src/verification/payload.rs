use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::domain::{ImagePayload, VerificationId};
use super::service::{VerificationServiceError, VerificationSubmission};

/// Largest decoded image accepted, per image.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Image as it travels over JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    #[serde(default = "default_media_type")]
    pub media_type: String,
    pub data_base64: String,
}

fn default_media_type() -> String {
    "image/jpeg".to_string()
}

impl EncodedImage {
    pub fn from_payload(payload: &ImagePayload) -> Self {
        Self {
            media_type: payload.media_type.clone(),
            data_base64: STANDARD.encode(&payload.bytes),
        }
    }

    /// Only `image/*` media types up to [`MAX_IMAGE_BYTES`] are accepted.
    pub fn decode(&self) -> Result<ImagePayload, VerificationServiceError> {
        let media_type = self.media_type.trim();
        if !media_type.to_ascii_lowercase().starts_with("image/") {
            return Err(VerificationServiceError::InvalidPayload(format!(
                "media type {media_type:?} is not an image"
            )));
        }
        let bytes = decode_base64_any(&self.data_base64)?;
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(VerificationServiceError::InvalidPayload(format!(
                "image of {} bytes exceeds the {MAX_IMAGE_BYTES} byte limit",
                bytes.len()
            )));
        }
        Ok(ImagePayload::new(media_type, bytes))
    }
}

/// JSON body accepted by the verify endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequestBody {
    #[serde(default)]
    pub verification_id: Option<String>,
    pub document: EncodedImage,
    #[serde(default)]
    pub selfie: Option<EncodedImage>,
}

impl VerifyRequestBody {
    pub fn into_submission(self) -> Result<VerificationSubmission, VerificationServiceError> {
        let document = self.document.decode()?;
        if document.is_empty() {
            return Err(VerificationServiceError::InvalidPayload(
                "document image is empty".to_string(),
            ));
        }
        let selfie = self.selfie.as_ref().map(EncodedImage::decode).transpose()?;
        let verification_id = self
            .verification_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .map(VerificationId);

        Ok(VerificationSubmission {
            verification_id,
            document,
            selfie,
        })
    }
}

/// Accepts padded, unpadded, standard and URL-safe alphabets.
pub fn decode_base64_any(input: &str) -> Result<Vec<u8>, VerificationServiceError> {
    let trimmed = input.trim();
    STANDARD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .or_else(|_| URL_SAFE.decode(trimmed))
        .or_else(|_| URL_SAFE_NO_PAD.decode(trimmed))
        .map_err(|err| VerificationServiceError::InvalidPayload(format!("invalid base64: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_every_alphabet() {
        for encoded in ["+/8=", "+/8", "-_8=", "-_8"] {
            assert_eq!(decode_base64_any(encoded).expect(encoded), vec![0xFB, 0xFF]);
        }
    }

    #[test]
    fn rejects_empty_document() {
        let body = VerifyRequestBody {
            verification_id: None,
            document: EncodedImage {
                media_type: "image/jpeg".to_string(),
                data_base64: String::new(),
            },
            selfie: None,
        };
        let err = body.into_submission().expect_err("empty document");
        assert!(err.to_string().contains("document image is empty"));
    }

    #[test]
    fn rejects_non_image_media_type() {
        let image = EncodedImage {
            media_type: "application/pdf".to_string(),
            data_base64: "AQID".to_string(),
        };
        let err = image.decode().expect_err("pdf refused");
        assert!(err.to_string().contains("is not an image"));
    }

    #[test]
    fn rejects_images_over_the_size_limit() {
        let at_limit = EncodedImage::from_payload(&ImagePayload::new(
            "image/png",
            vec![0; MAX_IMAGE_BYTES],
        ));
        assert_eq!(at_limit.decode().expect("at limit").bytes.len(), MAX_IMAGE_BYTES);

        let oversized = EncodedImage::from_payload(&ImagePayload::new(
            "image/png",
            vec![0; MAX_IMAGE_BYTES + 1],
        ));
        let err = oversized.decode().expect_err("too large");
        assert!(err.to_string().contains("byte limit"));
    }

    #[test]
    fn blank_verification_id_is_dropped() {
        let body: VerifyRequestBody = serde_json::from_value(serde_json::json!({
            "verification_id": "  ",
            "document": { "data_base64": "AQID" },
        }))
        .expect("body parses");

        let submission = body.into_submission().expect("valid");
        assert_eq!(submission.verification_id, None);
        assert_eq!(submission.document.media_type, "image/jpeg");
        assert_eq!(submission.document.bytes, vec![1, 2, 3]);
        assert!(submission.selfie.is_none());
    }
}
