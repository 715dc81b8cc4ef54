//! PDF Protect
//!
//! Password protection is written by qpdf: AES-256 (revision 6) with every
//! permission granted, so only opening the file needs a password.

use std::fmt;
use std::str::FromStr;

use qpdf::{EncryptionParams, EncryptionParamsR6, PrintPermission, QPdf, QPdfError, QPdfErrorCode};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::PdfError;

/// How the owner password is chosen when the caller supplies only a user password
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OwnerPasswordPolicy {
    /// A fresh random secret per document
    #[default]
    Random,
    /// `password + "_owner"`; guessable, kept for older clients
    Derived,
}

impl OwnerPasswordPolicy {
    pub fn owner_password_for(&self, user_password: &str) -> String {
        match self {
            OwnerPasswordPolicy::Random => Uuid::new_v4().simple().to_string(),
            OwnerPasswordPolicy::Derived => {
                warn!("deriving owner password from the user password; anyone who knows one knows both");
                format!("{}_owner", user_password)
            }
        }
    }
}

impl FromStr for OwnerPasswordPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(OwnerPasswordPolicy::Random),
            "derived" => Ok(OwnerPasswordPolicy::Derived),
            other => Err(format!(
                "Unknown owner password policy '{}'. Must be 'random' or 'derived'",
                other
            )),
        }
    }
}

impl fmt::Display for OwnerPasswordPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerPasswordPolicy::Random => write!(f, "random"),
            OwnerPasswordPolicy::Derived => write!(f, "derived"),
        }
    }
}

/// An encrypted document together with its owner password
#[derive(Debug, Clone)]
pub struct ProtectedDocument {
    pub bytes: Vec<u8>,
    pub owner_password: String,
}

/// Encrypt a PDF so that it opens only with `user_password` (or the owner password)
pub fn protect_document(
    bytes: &[u8],
    user_password: &str,
    policy: OwnerPasswordPolicy,
) -> Result<ProtectedDocument, PdfError> {
    if user_password.is_empty() {
        return Err(PdfError::OperationError("Password must not be empty".into()));
    }

    // A file that needs a password to open fails here with InvalidPassword
    let qpdf = QPdf::read_from_memory(bytes).map_err(map_read_error)?;
    if qpdf.is_encrypted() {
        return Err(PdfError::AlreadyEncrypted);
    }

    let owner_password = policy.owner_password_for(user_password);
    let encryption = EncryptionParams::R6(EncryptionParamsR6 {
        user_password: user_password.to_string(),
        owner_password: owner_password.clone(),
        allow_accessibility: true,
        allow_extract: true,
        allow_assemble: true,
        allow_annotate_and_form: true,
        allow_form_filling: true,
        allow_modify_other: true,
        allow_print: PrintPermission::Full,
        encrypt_metadata: true,
    });

    let mut writer = qpdf.writer();
    writer
        .preserve_encryption(false)
        .encryption_params(encryption);
    let bytes = writer
        .write_to_memory()
        .map_err(|e| PdfError::OperationError(e.to_string()))?;

    debug!(size = bytes.len(), %policy, "Encrypted document");
    Ok(ProtectedDocument {
        bytes,
        owner_password,
    })
}

fn map_read_error(e: QPdfError) -> PdfError {
    match e.error_code() {
        QPdfErrorCode::InvalidPassword => PdfError::AlreadyEncrypted,
        _ => PdfError::ParseError(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_pdf, page_labels};
    use pretty_assertions::assert_eq;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    /// Open an encrypted file with `password` and write it back in the clear
    fn open_with(bytes: &[u8], password: &str) -> Result<Vec<u8>, QPdfError> {
        let qpdf = QPdf::read_from_memory_encrypted(bytes, password)?;
        let mut writer = qpdf.writer();
        writer.preserve_encryption(false);
        writer.write_to_memory()
    }

    #[test]
    fn test_protect_hides_content_and_adds_encrypt() {
        let pdf = create_test_pdf(1, "TopSecret");
        assert!(contains(&pdf, b"TopSecret-Page-1"));

        let protected = protect_document(&pdf, "hunter2", OwnerPasswordPolicy::Random).unwrap();

        assert!(contains(&protected.bytes, b"/Encrypt"));
        assert!(!contains(&protected.bytes, b"TopSecret-Page-1"));
    }

    #[test]
    fn test_protected_document_opens_with_user_password() {
        let pdf = create_test_pdf(2, "Doc");
        let protected = protect_document(&pdf, "hunter2", OwnerPasswordPolicy::Random).unwrap();

        let plain = open_with(&protected.bytes, "hunter2").unwrap();
        assert_eq!(page_labels(&plain), vec!["Doc-Page-1", "Doc-Page-2"]);
    }

    #[test]
    fn test_protected_document_rejects_wrong_password() {
        let pdf = create_test_pdf(1, "Doc");
        let protected = protect_document(&pdf, "hunter2", OwnerPasswordPolicy::Random).unwrap();

        let err = open_with(&protected.bytes, "hunter3").unwrap_err();
        assert_eq!(err.error_code(), QPdfErrorCode::InvalidPassword);
        let err = QPdf::read_from_memory(&protected.bytes).err().unwrap();
        assert_eq!(err.error_code(), QPdfErrorCode::InvalidPassword);
    }

    #[test]
    fn test_protected_document_opens_with_owner_password() {
        let pdf = create_test_pdf(1, "Doc");
        let protected = protect_document(&pdf, "hunter2", OwnerPasswordPolicy::Random).unwrap();

        let plain = open_with(&protected.bytes, &protected.owner_password).unwrap();
        assert_eq!(page_labels(&plain), vec!["Doc-Page-1"]);
    }

    #[test]
    fn test_derived_owner_password_is_guessable() {
        let pdf = create_test_pdf(1, "Doc");
        let protected = protect_document(&pdf, "pw", OwnerPasswordPolicy::Derived).unwrap();

        assert_eq!(protected.owner_password, "pw_owner");
        assert!(open_with(&protected.bytes, "pw_owner").is_ok());
    }

    #[test]
    fn test_random_owner_password_is_not_derived() {
        let pdf = create_test_pdf(1, "Doc");
        let protected = protect_document(&pdf, "pw", OwnerPasswordPolicy::Random).unwrap();

        assert_ne!(protected.owner_password, "pw_owner");
        assert!(open_with(&protected.bytes, "pw_owner").is_err());
    }

    #[test]
    fn test_protecting_twice_is_rejected() {
        let pdf = create_test_pdf(1, "Doc");
        let protected = protect_document(&pdf, "pw", OwnerPasswordPolicy::Random).unwrap();

        assert!(matches!(
            protect_document(&protected.bytes, "pw", OwnerPasswordPolicy::Random),
            Err(PdfError::AlreadyEncrypted)
        ));
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        assert!(matches!(
            protect_document(b"hello", "pw", OwnerPasswordPolicy::Random),
            Err(PdfError::ParseError(_))
        ));
    }

    #[test]
    fn test_empty_password_rejected() {
        let pdf = create_test_pdf(1, "Doc");
        assert!(protect_document(&pdf, "", OwnerPasswordPolicy::Random).is_err());
    }

    #[test]
    fn test_whitespace_password_is_accepted() {
        let pdf = create_test_pdf(1, "Doc");
        let protected = protect_document(&pdf, "   ", OwnerPasswordPolicy::Random).unwrap();
        assert!(open_with(&protected.bytes, "   ").is_ok());
    }

    #[test]
    fn test_policy_parses() {
        assert_eq!("random".parse::<OwnerPasswordPolicy>(), Ok(OwnerPasswordPolicy::Random));
        assert_eq!("Derived".parse::<OwnerPasswordPolicy>(), Ok(OwnerPasswordPolicy::Derived));
        assert!("weak".parse::<OwnerPasswordPolicy>().is_err());
    }
}
