use crate::models::{Rule, Specificity};

/// Vocabulary that marks a description as clearly business-readable.
const BUSINESS_TERMS: &[&str] = &["SALARY", "GROCERY", "RENT", "PAYMENT", "STORE", "PURCHASE"];

/// Vocabulary that marks a description as cryptic bank noise.
const CRYPTIC_MARKERS: &[&str] = &["POS", "TXN", "REF", "CODE"];

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn average_word_length(description: &str) -> f64 {
    let words: Vec<&str> = description.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let total: usize = words.iter().map(|w| w.chars().count()).sum();
    total as f64 / words.len() as f64
}

/// Heuristic description clarity in {0.0, 0.5, 1.0}. Blank descriptions
/// force the low end of the band.
fn clarity(description: &str) -> f64 {
    if description.trim().is_empty() {
        return 0.0;
    }
    let upper = description.to_uppercase();
    let avg_len = average_word_length(description);
    if BUSINESS_TERMS.iter().any(|t| upper.contains(t)) && avg_len >= 4.0 {
        return 1.0;
    }
    if CRYPTIC_MARKERS.iter().any(|t| upper.contains(t)) || avg_len <= 3.0 {
        return 0.0;
    }
    0.5
}

/// Estimate match quality from rule specificity and description clarity.
///
/// Unmatched transactions score a flat 0.1. Wildcard rules land in
/// 0.3..=0.5, literal rules in 0.7..=0.9, with the clarity heuristic
/// picking the point inside the band.
pub fn score(rule: Option<&Rule>, description: &str) -> (f64, Specificity) {
    let Some(rule) = rule else {
        return (0.1, Specificity::None);
    };
    let (base, specificity) = if rule.pattern.contains('*') {
        (0.3, Specificity::Wildcard)
    } else {
        (0.7, Specificity::Specific)
    };
    (round1(base + clarity(description) * 0.2), specificity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str) -> Rule {
        Rule {
            pattern: pattern.to_string(),
            debit_account: "Assets:Checking".to_string(),
            credit_account: "Income:Misc".to_string(),
            description: None,
        }
    }

    #[test]
    fn test_no_match_scores_low_flat() {
        assert_eq!(score(None, "whatever"), (0.1, Specificity::None));
        assert_eq!(score(None, ""), (0.1, Specificity::None));
    }

    #[test]
    fn test_wildcard_band() {
        let r = rule("*salary*");
        // Business term + long words
        assert_eq!(score(Some(&r), "Monthly SALARY Payment").0, 0.5);
        // Neutral: no vocabulary hit, average word length above 3
        assert_eq!(score(Some(&r), "Wyndham Realty Deposit").0, 0.4);
        // Cryptic marker
        assert_eq!(score(Some(&r), "POS 1234 SALE").0, 0.3);
    }

    #[test]
    fn test_specific_band() {
        let r = rule("TRANSFER RENT PAYMENT Wyndham Realty");
        assert_eq!(
            score(Some(&r), "TRANSFER RENT PAYMENT Wyndham Realty").0,
            0.9
        );
        assert_eq!(score(Some(&r), "Quarterly Insurance Renewal").0, 0.8);
        assert_eq!(score(Some(&r), "TXN 00912 AX").0, 0.7);
    }

    #[test]
    fn test_specificity_reported() {
        assert_eq!(score(Some(&rule("*x*")), "abcd efgh").1, Specificity::Wildcard);
        assert_eq!(score(Some(&rule("x")), "abcd efgh").1, Specificity::Specific);
    }

    #[test]
    fn test_blank_description_forces_band_floor() {
        assert_eq!(score(Some(&rule("*x*")), "").0, 0.3);
        assert_eq!(score(Some(&rule("x")), "   ").0, 0.7);
    }

    #[test]
    fn test_short_words_are_cryptic() {
        // Average word length <= 3 counts as cryptic even with no marker.
        assert_eq!(score(Some(&rule("x")), "ab cd ef").0, 0.7);
    }

    #[test]
    fn test_business_term_needs_long_words() {
        // RENT is a business term but the surrounding words are too short,
        // so it falls through to neutral rather than clear.
        let desc = "the rent guy"; // avg word length 10/3, between 3 and 4
        assert_eq!(score(Some(&rule("x")), desc).0, 0.8);
    }
}
