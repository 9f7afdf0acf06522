//! Vowel statistics

use crate::records::Vowels;

/// Characters counted as vowels
pub const VOWELS: &str = "aeiouAEIOU";

pub fn count_vowels(word: &str) -> usize {
    word.chars().filter(|c| VOWELS.contains(*c)).count()
}

/// Share of characters that are vowels; `None` for an empty word
pub fn vowel_fraction(word: &str) -> Option<f64> {
    let len = word.chars().count();
    if len == 0 {
        return None;
    }
    Some(count_vowels(word) as f64 / len as f64)
}

pub fn vowel_stats(word: &str) -> Option<Vowels> {
    vowel_fraction(word).map(|fraction| Vowels {
        fraction,
        count: Some(count_vowels(word) as u32),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_vowels() {
        assert_eq!(count_vowels("queue"), 4);
        assert_eq!(count_vowels("rhythm"), 0);
        assert_eq!(count_vowels("AEIOU"), 5);
        assert_eq!(count_vowels("Yonder"), 2);
    }

    #[test]
    fn test_vowel_fraction() {
        assert_eq!(vowel_fraction("aeon"), Some(0.75));
        assert_eq!(vowel_fraction("crypt"), Some(0.0));
        assert_eq!(vowel_fraction(""), None);
    }

    #[test]
    fn test_fraction_counts_characters_not_bytes() {
        // 'é' is not in the vowel set but is a single character
        assert_eq!(vowel_fraction("café"), Some(0.25));
    }

    #[test]
    fn test_vowel_stats() {
        let stats = vowel_stats("idea").unwrap();
        assert_eq!(stats.count, Some(3));
        assert_eq!(stats.fraction, 0.75);
        assert!(vowel_stats("").is_none());
    }
}
