use crate::identity::{CertificateIdentity, UNKNOWN_SUBJECT};

/// Name printed on the signature block.
///
/// Order: given name + surname (both needed), then the subject common name,
/// then `fallback`. Never returns an empty string.
pub fn display_name(identity: &CertificateIdentity, fallback: &str) -> String {
    let given_name = identity.given_name.as_deref().map(str::trim).unwrap_or("");
    let surname = identity.surname.as_deref().map(str::trim).unwrap_or("");
    if !given_name.is_empty() && !surname.is_empty() {
        return format!("{} {}", given_name, surname);
    }

    let common_name = identity.subject_common_name.trim();
    if !common_name.is_empty() {
        return common_name.to_owned();
    }

    let fallback = fallback.trim();
    if !fallback.is_empty() {
        return fallback.to_owned();
    }
    UNKNOWN_SUBJECT.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(given_name: &str, surname: &str, common_name: &str) -> CertificateIdentity {
        let optional = |value: &str| Some(value.to_owned());
        CertificateIdentity {
            subject_common_name: common_name.to_owned(),
            issuer_common_name: "Acme CA".to_owned(),
            valid_from: None,
            valid_to: None,
            given_name: optional(given_name),
            surname: optional(surname),
            organization: None,
            serial_number: None,
            thumbprint: None,
        }
    }

    #[test]
    fn given_name_and_surname_win() {
        assert_eq!(display_name(&identity("Ana", "Pop", "ana.pop"), "J. Doe"), "Ana Pop");
    }

    #[test]
    fn half_a_name_uses_common_name() {
        assert_eq!(display_name(&identity("Ana", "", "ana.pop"), "J. Doe"), "ana.pop");
        assert_eq!(display_name(&identity("", "Pop", "ana.pop"), "J. Doe"), "ana.pop");
    }

    #[test]
    fn empty_identity_uses_fallback() {
        assert_eq!(display_name(&identity("", "", ""), "J. Doe"), "J. Doe");
    }

    #[test]
    fn never_empty() {
        assert_eq!(display_name(&identity("", "", ""), ""), "Unknown");
        assert_eq!(display_name(&identity(" ", " ", "  "), "   "), "Unknown");
        let mut bare = identity("", "", "");
        bare.given_name = None;
        bare.surname = None;
        assert!(!display_name(&bare, "").is_empty());
    }
}
