//! Credential domain model - the one-time numeric archive password

use rand::rngs::OsRng;
use rand::Rng;

use super::result::ArchiveError;

/// Number of digits in every credential
pub const CREDENTIAL_LEN: usize = 8;

/// An 8-digit numeric password protecting one encrypted archive
///
/// Only lives in memory and in the rendered password mail. `Debug` is
/// redacted so the digits never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Generate a fresh credential from the operating system's CSPRNG
    ///
    /// Each digit is drawn independently and uniformly. A missing entropy
    /// source panics inside `OsRng`; that is an unrecoverable environment fault.
    pub fn generate() -> Self {
        let mut rng = OsRng;
        let digits: String = (0..CREDENTIAL_LEN)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();
        Self(digits)
    }

    /// Accept a caller-supplied credential after checking its shape
    pub fn parse(value: &str) -> Result<Self, ArchiveError> {
        ensure_well_formed(value)?;
        Ok(Self(value.to_string()))
    }

    /// The digit string, for encryption and for the password mail body
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(********)")
    }
}

/// Exactly [`CREDENTIAL_LEN`] ASCII decimal digits
pub(crate) fn ensure_well_formed(value: &str) -> Result<(), ArchiveError> {
    if value.len() == CREDENTIAL_LEN && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ArchiveError::InvalidCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_credentials_are_eight_digits() {
        for _ in 0..1000 {
            let credential = Credential::generate();
            assert_eq!(credential.expose().len(), CREDENTIAL_LEN);
            assert!(credential.expose().chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_digit_frequency_is_uniform() {
        const SAMPLES: usize = 10_000;
        let mut counts = [0u64; 10];
        for _ in 0..SAMPLES {
            for b in Credential::generate().expose().bytes() {
                counts[(b - b'0') as usize] += 1;
            }
        }

        let expected = (SAMPLES * CREDENTIAL_LEN) as f64 / 10.0;
        let chi_square: f64 = counts
            .iter()
            .map(|&observed| {
                let diff = observed as f64 - expected;
                diff * diff / expected
            })
            .sum();

        // 9 degrees of freedom, p = 0.001
        assert!(chi_square < 27.88, "chi-square {} for counts {:?}", chi_square, counts);
    }

    #[test]
    fn test_parse_accepts_eight_digits() {
        let credential = Credential::parse("01234567").unwrap();
        assert_eq!(credential.expose(), "01234567");
    }

    #[test]
    fn test_parse_rejects_malformed_values() {
        for bad in ["", "1234567", "123456789", "1234567a", "１２３４５６７８", " 1234567"] {
            assert!(
                matches!(Credential::parse(bad), Err(ArchiveError::InvalidCredential)),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_debug_is_redacted() {
        let credential = Credential::parse("12345678").unwrap();
        assert!(!format!("{:?}", credential).contains("12345678"));
    }
}
