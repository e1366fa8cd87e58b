//! Emoji normalisation for nomination matching.

/// Variation selector Discord sometimes appends to unicode reactions.
const VARIATION_SELECTOR: char = '\u{FE0F}';

/// Turn a configured emoji into the form reactions arrive in.
///
/// Accepts a raw emoji (`⭐`), a shortcode (`:star:`), or a custom emoji name,
/// which is returned unchanged.
pub fn normalize_emoji(input: &str) -> String {
    let trimmed = input.trim();

    if let Some(code) = trimmed
        .strip_prefix(':')
        .and_then(|rest| rest.strip_suffix(':'))
    {
        if let Some(emoji) = emojis::get_by_shortcode(&code.to_lowercase()) {
            return strip_variation(emoji.as_str());
        }
    }

    strip_variation(trimmed)
}

/// Compare a reaction's emoji name with the configured nomination emoji.
pub fn same_emoji(reaction: &str, configured: &str) -> bool {
    strip_variation(reaction) == normalize_emoji(configured)
}

fn strip_variation(s: &str) -> String {
    s.chars().filter(|c| *c != VARIATION_SELECTOR).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcode_resolves() {
        assert_eq!(normalize_emoji(":star:"), "⭐");
        assert_eq!(normalize_emoji(":STAR:"), "⭐");
    }

    #[test]
    fn test_unknown_shortcode_kept() {
        assert_eq!(normalize_emoji(":not_a_real_emoji:"), ":not_a_real_emoji:");
    }

    #[test]
    fn test_custom_name_kept() {
        assert_eq!(normalize_emoji("pepega"), "pepega");
    }

    #[test]
    fn test_variation_selector_ignored() {
        assert!(same_emoji("\u{2B50}\u{FE0F}", "\u{2B50}"));
        assert!(same_emoji("⭐", ":star:"));
        assert!(!same_emoji("🔥", "⭐"));
    }
}
