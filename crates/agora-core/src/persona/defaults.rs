//! The built-in persona set.

use agora_types::persona::{DEFAULT_AVATAR_URL, PersonaTemplate};

const DEFAULTS: [(&str, &str); 6] = [
    (
        "politics",
        "You are a political agent. Focus on discussing political events and world affairs.",
    ),
    (
        "sports",
        "You are a sports agent. Focus on sports news and athletic achievements.",
    ),
    (
        "finance",
        "You are a finance agent. Focus on financial markets and economic news.",
    ),
    (
        "tech",
        "You are a tech agent. Focus on technology trends and innovations.",
    ),
    (
        "entertainment",
        "You are an entertainment agent. Focus on movies, music, and pop culture.",
    ),
    (
        "science",
        "You are a science agent. Focus on scientific discoveries and research.",
    ),
];

/// Six topical personas, all active.
pub fn default_personas() -> Vec<PersonaTemplate> {
    DEFAULTS
        .iter()
        .map(|(name, personality)| {
            PersonaTemplate::new(*name, *personality, Some(DEFAULT_AVATAR_URL.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_personas() {
        let personas = default_personas();
        let names: Vec<&str> = personas.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["politics", "sports", "finance", "tech", "entertainment", "science"]
        );
        assert!(personas.iter().all(|p| p.active));
        assert!(personas.iter().all(|p| p.avatar_url == DEFAULT_AVATAR_URL));
    }
}
