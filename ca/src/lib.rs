pub mod authority;
pub mod pem;
pub mod trust_store;

pub use authority::{
    ensure_ca_files, fingerprint_for_pem_file, generate_ca_material, generate_ca_material_at,
    normalize_fingerprint, CaMaterial, EnsureOutcome, Fingerprint, CA_COMMON_NAME,
};
pub use pem::{decode_pem, encode_pem, CERTIFICATE_LABEL, RSA_PRIVATE_KEY_LABEL};
pub use trust_store::{TrustStoreInstaller, LINUX_CA_DIR, LINUX_INSTALLED_CERT};
