//! Field validators used by payload `#[validate(custom(...))]` attributes

use regex_lite::Regex;
use std::sync::OnceLock;
use tracing::error;
use validator::ValidationError;

const ORCID_PATTERN: &str = r"^\d{4}-\d{4}-\d{4}-\d{3}[\dX]$";
const ISSN_PATTERN: &str = r"^\d{4}-\d{3}[\dX]$";
const PHONE_PATTERN: &str = r"^\+?[0-9 ().\-]{6,20}$";
const DOI_PATTERN: &str = r"^10\.\d{4,9}/\S+$";
const INVENTORY_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9_./\-]{0,63}$";

static ORCID: OnceLock<Option<Regex>> = OnceLock::new();
static ISSN: OnceLock<Option<Regex>> = OnceLock::new();
static PHONE: OnceLock<Option<Regex>> = OnceLock::new();
static DOI: OnceLock<Option<Regex>> = OnceLock::new();
static INVENTORY: OnceLock<Option<Regex>> = OnceLock::new();

/// Compiled once per pattern. A pattern that fails to compile is logged and
/// rejects every value.
fn compiled(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            error!(pattern, error = %err, "Invalid validation pattern");
            None
        }
    })
    .as_ref()
}

fn matches(cell: &'static OnceLock<Option<Regex>>, pattern: &str, value: &str) -> bool {
    compiled(cell, pattern).is_some_and(|re| re.is_match(value))
}

fn check(ok: bool, code: &'static str, message: &'static str) -> Result<(), ValidationError> {
    if ok {
        Ok(())
    } else {
        Err(ValidationError::new(code).with_message(message.into()))
    }
}

/// Rejects empty and whitespace-only strings
pub fn not_blank<T: AsRef<str> + ?Sized>(value: &T) -> Result<(), ValidationError> {
    check(!value.as_ref().trim().is_empty(), "blank", "must not be blank")
}

/// ORCID iD, e.g. `0000-0002-1825-0097`
pub fn orcid<T: AsRef<str> + ?Sized>(value: &T) -> Result<(), ValidationError> {
    check(
        matches(&ORCID, ORCID_PATTERN, value.as_ref()),
        "orcid",
        "must look like 0000-0000-0000-0000",
    )
}

/// ISSN or e-ISSN, e.g. `2049-3630`
pub fn issn<T: AsRef<str> + ?Sized>(value: &T) -> Result<(), ValidationError> {
    check(matches(&ISSN, ISSN_PATTERN, value.as_ref()), "issn", "must look like 0000-000X")
}

pub fn phone<T: AsRef<str> + ?Sized>(value: &T) -> Result<(), ValidationError> {
    check(matches(&PHONE, PHONE_PATTERN, value.as_ref()), "phone", "is not a phone number")
}

pub fn doi<T: AsRef<str> + ?Sized>(value: &T) -> Result<(), ValidationError> {
    check(matches(&DOI, DOI_PATTERN, value.as_ref()), "doi", "must look like 10.xxxx/suffix")
}

/// Equipment inventory number: alphanumeric start, no spaces
pub fn inventory_num<T: AsRef<str> + ?Sized>(value: &T) -> Result<(), ValidationError> {
    check(
        matches(&INVENTORY, INVENTORY_PATTERN, value.as_ref()),
        "inventory_num",
        "must be alphanumeric without spaces",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_compile() {
        assert!(compiled(&ORCID, ORCID_PATTERN).is_some());
        assert!(compiled(&ISSN, ISSN_PATTERN).is_some());
        assert!(compiled(&PHONE, PHONE_PATTERN).is_some());
        assert!(compiled(&DOI, DOI_PATTERN).is_some());
        assert!(compiled(&INVENTORY, INVENTORY_PATTERN).is_some());
    }

    #[test]
    fn test_bad_pattern_rejects_everything() {
        static BROKEN: OnceLock<Option<Regex>> = OnceLock::new();
        assert!(!matches(&BROKEN, r"^(unclosed$", "(unclosed"));
        assert!(BROKEN.get().is_some_and(Option::is_none));
    }

    #[test]
    fn test_orcid() {
        assert!(orcid("0000-0002-1825-0097").is_ok());
        assert!(orcid("0000-0002-1694-233X").is_ok());
        assert!(orcid("0000-0002-1825").is_err());
    }

    #[test]
    fn test_issn() {
        assert!(issn("2049-3630").is_ok());
        assert!(issn("0317-847X").is_ok());
        assert!(issn("20493630").is_err());
    }

    #[test]
    fn test_phone_and_doi() {
        assert!(phone("+213 (0) 555-12-34").is_ok());
        assert!(phone("call me").is_err());
        assert!(doi("10.1000/xyz123").is_ok());
        assert!(doi("doi:10.1000").is_err());
    }

    #[test]
    fn test_blank_and_inventory() {
        assert!(not_blank("   ").is_err());
        assert!(not_blank("x").is_ok());
        assert!(inventory_num("EQ-001").is_ok());
        assert!(inventory_num("EQ 001").is_err());
    }
}
