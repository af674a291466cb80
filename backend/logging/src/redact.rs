//! Log Redaction Layer
//!
//! Scrubs API keys, bearer tokens and URL signature parameters from strings
//! prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9]{16,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap()
});

// Query parameters that authorize access to a signed object URL.
static SIGNED_PARAM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([?&](?:signature|x-amz-signature|x-amz-credential|x-amz-security-token|ossaccesskeyid|security-token|api_key|key|token)=)[^&#\s]*",
    )
    .unwrap()
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]");
    SIGNED_PARAM_RE
        .replace_all(&redacted, "${1}[REDACTED]")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction() {
        let raw = "key sk-0123456789abcdef0123456789abcdef with Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("sk-0123456789abcdef"));
        assert!(!clean.contains("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"));
    }

    #[test]
    fn test_signed_url_keeps_shape() {
        let url = "https://bucket.oss-cn-beijing.aliyuncs.com/clip.mp4?OSSAccessKeyId=LTAI5t&Expires=1700000000&Signature=abc%2Bdef#t=3";
        assert_eq!(
            redact_sensitive_data(url),
            "https://bucket.oss-cn-beijing.aliyuncs.com/clip.mp4?OSSAccessKeyId=[REDACTED]&Expires=1700000000&Signature=[REDACTED]#t=3"
        );
    }

    #[test]
    fn test_plain_reference_untouched() {
        let url = "https://example.com/clip.mp4";
        assert_eq!(redact_sensitive_data(url), url);
        assert_eq!(redact_sensitive_data("videos/sk-short.mp4"), "videos/sk-short.mp4");
    }
}
