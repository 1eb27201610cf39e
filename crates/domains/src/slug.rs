use crate::errors::{AppError, Result};

pub const MAX_SLUG_LEN: usize = 80;

/// Derives a URL slug from a title: lowercase ASCII alphanumerics joined by
/// single dashes. Returns an empty string when nothing usable remains.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    slug.truncate(MAX_SLUG_LEN);
    slug.trim_end_matches('-').to_string()
}

/// Accepts `[a-z0-9]` runs separated by single dashes.
pub fn validate_slug(slug: &str) -> Result<()> {
    let well_formed = !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if well_formed {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "story id '{slug}' must be lowercase letters, digits and single dashes"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  The Legendary  Mechanic! "), "the-legendary-mechanic");
        assert_eq!(slugify("Vol. 2 -- Return"), "vol-2-return");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn slugify_output_validates() {
        let slug = slugify("Lord of the Mysteries");
        assert!(validate_slug(&slug).is_ok());
    }

    #[test]
    fn validate_rejects_malformed_ids() {
        for bad in ["", "Upper", "a--b", "-a", "a-", "with space", "ü"] {
            assert!(validate_slug(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
