use models::PlatformError;
use rand_core::{OsRng, RngCore};
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
    KeyUsagePurpose, SerialNumber, PKCS_RSA_SHA256,
};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::EncodePrivateKey;
use rsa::RsaPrivateKey;
use sha1::{Digest, Sha1};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, BufReader, Write};
use std::path::Path;

use crate::pem::{encode_pem, CERTIFICATE_LABEL, PKCS8_PRIVATE_KEY_LABEL, RSA_PRIVATE_KEY_LABEL};

pub const CA_COMMON_NAME: &str = "terasu-proxy CA";
const RSA_KEY_BITS: usize = 2048;
const VALIDITY_YEARS: i32 = 10;
const SERIAL_BYTES: usize = 16;

/// A freshly generated root CA, not yet written anywhere.
pub struct CaMaterial {
    pub certificate_pem: String,
    /// PKCS#1 (`RSA PRIVATE KEY`) PEM.
    pub private_key_pem: String,
    pub certificate_der: Vec<u8>,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl fmt::Debug for CaMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaMaterial")
            .field("fingerprint", &Fingerprint::from_der(&self.certificate_der))
            .field("not_before", &self.not_before)
            .field("not_after", &self.not_after)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// A file already sat at the certificate path; nothing was touched.
    AlreadyPresent,
    Generated,
}

/// SHA-1 thumbprint of a certificate's DER bytes: 40 uppercase hex digits,
/// no separators. This is the form `certutil`, the `Cert:` drive, and
/// `security delete-certificate -Z` all accept.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn from_der(der: &[u8]) -> Self {
        let digest = Sha1::digest(der);
        Self(digest.iter().map(|b| format!("{:02X}", b)).collect())
    }

    /// Accepts any separators and either case, e.g. `aa:bb:...`.
    pub fn parse(s: &str) -> Result<Self, PlatformError> {
        let normalized = normalize_fingerprint(s);
        if normalized.len() != 40 {
            return Err(PlatformError::Crypto(format!(
                "'{s}' is not a SHA-1 fingerprint (expected 40 hex digits)"
            )));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn normalize_fingerprint(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_hexdigit())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

pub fn generate_ca_material() -> Result<CaMaterial, PlatformError> {
    generate_ca_material_at(OffsetDateTime::now_utc())
}

/// Build a self-signed RSA-2048 root valid from `now - 1 day` (clock skew on
/// the verifying side) to `now + 10 years`.
pub fn generate_ca_material_at(now: OffsetDateTime) -> Result<CaMaterial, PlatformError> {
    // rcgen cannot generate RSA keys itself; feed it one from `rsa`.
    let rsa_key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
        .map_err(|e| crypto_err("failed to generate RSA key pair", e))?;
    let pkcs8 = rsa_key
        .to_pkcs8_der()
        .map_err(|e| crypto_err("failed to encode PKCS#8 key", e))?;
    let pkcs1 = rsa_key
        .to_pkcs1_der()
        .map_err(|e| crypto_err("failed to encode PKCS#1 key", e))?;
    let key_pair = KeyPair::from_pkcs8_pem_and_sign_algo(
        &encode_pem(PKCS8_PRIVATE_KEY_LABEL, pkcs8.as_bytes()),
        &PKCS_RSA_SHA256,
    )
    .map_err(|e| crypto_err("failed to load RSA key for signing", e))?;

    let not_before = now - Duration::days(1);
    let not_after = years_after(now, VALIDITY_YEARS);

    let mut params = CertificateParams::default();
    params.distinguished_name = {
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, CA_COMMON_NAME);
        dn
    };
    params.is_ca = IsCa::Ca(BasicConstraints::Constrained(0));
    params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
    params.serial_number = Some(random_serial());
    params.not_before = not_before;
    params.not_after = not_after;

    let cert = params
        .self_signed(&key_pair)
        .map_err(|e| crypto_err("failed to self-sign CA certificate", e))?;
    let certificate_der = cert.der().to_vec();

    Ok(CaMaterial {
        certificate_pem: encode_pem(CERTIFICATE_LABEL, &certificate_der),
        private_key_pem: encode_pem(RSA_PRIVATE_KEY_LABEL, pkcs1.as_bytes()),
        certificate_der,
        not_before,
        not_after,
    })
}

/// Make sure a CA certificate exists at `cert_path`, generating one if not.
///
/// Presence of the certificate file alone decides; the key file is neither
/// checked nor regenerated. Writes are plain (not temp-and-rename), so a
/// truncated file left by a crash still counts as present next time.
pub fn ensure_ca_files(
    cert_path: &Path,
    key_path: Option<&Path>,
) -> Result<EnsureOutcome, PlatformError> {
    create_parent_dir(cert_path)?;
    if cert_path.exists() {
        debug!(path = %cert_path.display(), "CA certificate already present");
        return Ok(EnsureOutcome::AlreadyPresent);
    }

    let material = generate_ca_material()?;
    fs::write(cert_path, material.certificate_pem.as_bytes())
        .map_err(|e| PlatformError::filesystem(cert_path, e))?;

    if let Some(key_path) = key_path {
        create_parent_dir(key_path)?;
        write_private_key(key_path, &material.private_key_pem)
            .map_err(|e| PlatformError::filesystem(key_path, e))?;
    }

    info!(
        cert = %cert_path.display(),
        key = %key_path.map(|p| p.display().to_string()).unwrap_or_else(|| "-".into()),
        fingerprint = %Fingerprint::from_der(&material.certificate_der),
        "Generated new CA certificate"
    );
    Ok(EnsureOutcome::Generated)
}

/// Fingerprint of the first certificate in the PEM file at `path`.
///
/// Recomputed on every call.
pub fn fingerprint_for_pem_file(path: &Path) -> Result<Fingerprint, PlatformError> {
    let data = fs::read(path).map_err(|e| {
        PlatformError::Crypto(format!("failed to read {}: {e}", path.display()))
    })?;
    let mut reader = BufReader::new(io::Cursor::new(data));
    let certs = rustls_pemfile::certs(&mut reader).map_err(|e| {
        PlatformError::Crypto(format!("failed to parse PEM certs from {}: {e}", path.display()))
    })?;
    let der = certs.into_iter().next().ok_or_else(|| {
        PlatformError::Crypto(format!("no certificates found in {}", path.display()))
    })?;
    x509_parser::parse_x509_certificate(&der).map_err(|e| {
        PlatformError::Crypto(format!("{} is not a valid certificate: {e}", path.display()))
    })?;
    Ok(Fingerprint::from_der(&der))
}

fn create_parent_dir(path: &Path) -> Result<(), PlatformError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| PlatformError::filesystem(parent, e))?;
        }
    }
    Ok(())
}

fn write_private_key(path: &Path, pem: &str) -> io::Result<()> {
    let mut opts = OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut file = opts.open(path)?;
    file.write_all(pem.as_bytes())
}

fn random_serial() -> SerialNumber {
    let mut bytes = [0u8; SERIAL_BYTES];
    OsRng.fill_bytes(&mut bytes);
    // Keep the DER INTEGER positive and non-zero-led.
    bytes[0] = (bytes[0] & 0x7f) | 0x01;
    SerialNumber::from_slice(&bytes)
}

/// Same calendar date `years` later; Feb 29 lands on Feb 28.
fn years_after(t: OffsetDateTime, years: i32) -> OffsetDateTime {
    let year = t.year() + years;
    t.replace_year(year)
        .or_else(|_| t.replace_day(28).and_then(|d| d.replace_year(year)))
        .unwrap_or_else(|_| t + Duration::days(365 * i64::from(years)))
}

fn crypto_err(what: &str, e: impl fmt::Display) -> PlatformError {
    PlatformError::Crypto(format!("{what}: {e}"))
}
