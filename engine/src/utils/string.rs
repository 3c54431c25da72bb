//! String utility functions

/// Split an identifier into words at `_`, `-`, `.`, whitespace, and case changes.
///
/// Acronyms stay together: `userID` gives `user`, `ID`; `HTTPServer` gives
/// `HTTP`, `Server`.
pub fn split_identifier(identifier: &str) -> Vec<String> {
    let chars: Vec<char> = identifier.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c == '.' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Human-readable form of an identifier: `createdAt` becomes `Created At`
pub fn humanize_identifier(identifier: &str) -> String {
    split_identifier(identifier)
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case-insensitive substring match
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize_camel_case() {
        assert_eq!(humanize_identifier("createdAt"), "Created At");
        assert_eq!(humanize_identifier("isSuperAdmin"), "Is Super Admin");
        assert_eq!(humanize_identifier("status"), "Status");
    }

    #[test]
    fn test_humanize_snake_and_kebab() {
        assert_eq!(humanize_identifier("last_login_at"), "Last Login At");
        assert_eq!(humanize_identifier("access-type"), "Access Type");
        assert_eq!(humanize_identifier("company.name"), "Company Name");
    }

    #[test]
    fn test_humanize_acronyms() {
        assert_eq!(humanize_identifier("userID"), "User ID");
        assert_eq!(humanize_identifier("HTTPServer"), "HTTP Server");
        assert_eq!(humanize_identifier("address2Line"), "Address2 Line");
    }

    #[test]
    fn test_humanize_empty() {
        assert_eq!(humanize_identifier(""), "");
        assert_eq!(humanize_identifier("__"), "");
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Created At", "created"));
        assert!(contains_ignore_case("email", ""));
        assert!(!contains_ignore_case("Status", "role"));
    }
}
