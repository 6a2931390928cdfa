// Validation utilities
// Author: Gabriel Demetrios Lafis

use std::fmt::Display;

/// Validate that a string value is not empty
pub fn validate_not_empty(value: &str, name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("'{}' cannot be empty", name))
    } else {
        Ok(())
    }
}

/// Validate that a numeric value is in range
pub fn validate_range<T: PartialOrd + Display>(
    value: T,
    min: T,
    max: T,
    name: &str,
) -> Result<(), String> {
    if value < min || value > max {
        Err(format!("'{}' must be between {} and {}", name, min, max))
    } else {
        Ok(())
    }
}

/// Validate a property identifier: a URL prefix or an `sc-domain:` property
pub fn validate_site(site: &str) -> Result<(), String> {
    let valid = site.starts_with("https://")
        || site.starts_with("http://")
        || site
            .strip_prefix("sc-domain:")
            .map_or(false, |domain| !domain.is_empty() && !domain.contains('/'));

    if valid {
        Ok(())
    } else {
        Err(format!(
            "'{}' is not a site URL or sc-domain property",
            site
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_range() {
        assert!(validate_range(5, 1, 10, "top_n").is_ok());
        assert!(validate_range(0, 1, 10, "top_n").is_err());
        assert!(validate_range(11, 1, 10, "top_n").is_err());
    }

    #[test]
    fn test_validate_site() {
        assert!(validate_site("https://apudsi.com/").is_ok());
        assert!(validate_site("sc-domain:apudsi.com").is_ok());
        assert!(validate_site("sc-domain:").is_err());
        assert!(validate_site("apudsi.com").is_err());
    }

    #[test]
    fn test_validate_not_empty() {
        assert!(validate_not_empty("x", "name").is_ok());
        assert!(validate_not_empty("  ", "name").is_err());
    }
}
