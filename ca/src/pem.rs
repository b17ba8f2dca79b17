use base64::{engine::general_purpose::STANDARD, Engine as _};
use models::PlatformError;

pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";
pub const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";
pub(crate) const PKCS8_PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

const LINE_WIDTH: usize = 64;

/// Base64 of `der`, 64 characters per line, between BEGIN/END markers,
/// with a trailing newline.
pub fn encode_pem(label: &str, der: &[u8]) -> String {
    let body = STANDARD.encode(der);
    let mut out = String::with_capacity(body.len() + body.len() / LINE_WIDTH + 2 * label.len() + 40);
    out.push_str("-----BEGIN ");
    out.push_str(label);
    out.push_str("-----\n");
    for line in body.as_bytes().chunks(LINE_WIDTH) {
        out.push_str(&String::from_utf8_lossy(line));
        out.push('\n');
    }
    out.push_str("-----END ");
    out.push_str(label);
    out.push_str("-----\n");
    out
}

/// DER bytes of the first `label` block in `text`.
pub fn decode_pem(label: &str, text: &str) -> Result<Vec<u8>, PlatformError> {
    let begin = format!("-----BEGIN {label}-----");
    let end = format!("-----END {label}-----");
    let Some(start) = text.find(&begin) else {
        return Err(PlatformError::Crypto(format!("no {label} block found")));
    };
    let body_start = start + begin.len();
    let Some(end_rel) = text[body_start..].find(&end) else {
        return Err(PlatformError::Crypto(format!("unterminated {label} block")));
    };
    let body: String = text[body_start..body_start + end_rel]
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(body)
        .map_err(|e| PlatformError::Crypto(format!("invalid base64 in {label} block: {e}")))
}
