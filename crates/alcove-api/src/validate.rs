//! Input normalization and format policy, applied at the request boundary.

pub const ALLOWED_BADGES: [&str; 3] = ["premium", "verified", "early"];
pub const MAX_BADGES: usize = 5;
pub const MAX_ABOUT_CHARS: usize = 240;

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn email_ok(email: &str) -> bool {
    email.contains('@')
}

/// Usernames are case-folded and may be typed with a leading `@`.
pub fn normalize_username(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    lowered.strip_prefix('@').unwrap_or(&lowered).to_string()
}

/// 3-20 lowercase alphanumerics/underscores, no double underscore.
pub fn username_ok(username: &str) -> bool {
    (3..=20).contains(&username.len())
        && username
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        && !username.contains("__")
}

pub fn name_ok(name: &str) -> bool {
    (1..=40).contains(&name.trim().chars().count())
}

pub fn about_ok(about: &str) -> bool {
    about.chars().count() <= MAX_ABOUT_CHARS
}

/// Keep allow-listed badges in their given order, dropping duplicates and
/// anything past the cap.
pub fn filter_badges(raw: &[String]) -> Vec<String> {
    let mut badges: Vec<String> = Vec::new();
    for badge in raw {
        if ALLOWED_BADGES.contains(&badge.as_str()) && !badges.contains(badge) {
            badges.push(badge.clone());
        }
        if badges.len() >= MAX_BADGES {
            break;
        }
    }
    badges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
        assert!(email_ok("alice@example.com"));
        assert!(!email_ok("not-an-email"));
    }

    #[test]
    fn username_normalization_strips_at_and_case() {
        assert_eq!(normalize_username("@Alice_99 "), "alice_99");
        assert_eq!(normalize_username("BOB"), "bob");
    }

    #[test]
    fn username_policy() {
        assert!(username_ok("alice_99"));
        assert!(username_ok("abc"));
        assert!(!username_ok("ab"));
        assert!(!username_ok(&"a".repeat(21)));
        assert!(!username_ok("double__under"));
        assert!(!username_ok("Upper"));
        assert!(!username_ok("with-dash"));
        assert!(!username_ok("with space"));
    }

    #[test]
    fn name_policy() {
        assert!(name_ok("A"));
        assert!(name_ok(&"n".repeat(40)));
        assert!(!name_ok(""));
        assert!(!name_ok("   "));
        assert!(!name_ok(&"n".repeat(41)));
    }

    #[test]
    fn badges_filtered_in_order_without_duplicates() {
        let raw: Vec<String> = ["verified", "bogus", "premium", "verified", "early"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(filter_badges(&raw), vec!["verified", "premium", "early"]);
    }

    #[test]
    fn badge_cap_holds() {
        // allow-list is shorter than the cap today; duplicates must still
        // never push past it
        let raw = vec!["premium".to_string(); 10];
        assert_eq!(filter_badges(&raw), vec!["premium"]);
    }
}
