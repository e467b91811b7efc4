//! Title matching heuristics shared by the providers

/// Words that mark a video as something other than a trailer
const NON_TRAILER_WORDS: &[&str] = &[
    "review",
    "reaction",
    "reacts",
    "clip",
    "breakdown",
    "explained",
    "fan made",
    "fanmade",
    "parody",
    "analysis",
    "scene",
    "recap",
    "ending",
];

const LEADING_ARTICLES: &[&str] = &["the ", "a ", "an "];

/// Prefix of constructed Criterion site-search links
pub const CRITERION_SEARCH_PREFIX: &str = "https://www.criterion.com/search#stq=";

/// Whether `url` is a constructed search link rather than a film page
pub fn is_criterion_search_link(url: &str) -> bool {
    url.starts_with(CRITERION_SEARCH_PREFIX)
}

/// Lowercase, strip punctuation, collapse whitespace, drop a leading article
pub fn normalize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else if c == '\'' || c == '\u{2019}' {
                '\0'
            } else {
                ' '
            }
        })
        .filter(|c| *c != '\0')
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    for article in LEADING_ARTICLES {
        if let Some(rest) = collapsed.strip_prefix(article)
            && !rest.is_empty()
        {
            return rest.to_string();
        }
    }
    collapsed
}

/// Whether `candidate` plausibly names the same work as `wanted`
pub fn title_matches(wanted: &str, candidate: &str) -> bool {
    let wanted = normalize_title(wanted);
    let candidate = normalize_title(candidate);
    if wanted.is_empty() || candidate.is_empty() {
        return false;
    }
    candidate.contains(&wanted) || wanted.contains(&candidate)
}

/// Whether a video title looks like an official trailer or teaser
pub fn is_official_trailer(video_title: &str) -> bool {
    let title = video_title.to_lowercase();
    if !(title.contains("trailer") || title.contains("teaser")) {
        return false;
    }
    !NON_TRAILER_WORDS.iter().any(|word| title.contains(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("The Left Hand of Darkness"), "left hand of darkness");
        assert_eq!(normalize_title("  Solaris!  "), "solaris");
        assert_eq!(normalize_title("Childhood's End"), "childhoods end");
        assert_eq!(normalize_title("Blade Runner 2049"), "blade runner 2049");
        assert_eq!(normalize_title("A.I. Artificial Intelligence"), "i artificial intelligence");
        // An article alone is kept
        assert_eq!(normalize_title("The"), "the");
    }

    #[test]
    fn test_title_matches() {
        assert!(title_matches("Dune", "Dune: Part One"));
        assert!(title_matches("The Martian", "Martian"));
        assert!(title_matches("Solaris (1972)", "Solaris"));
        assert!(!title_matches("Dune", "Arrival"));
        assert!(!title_matches("", "Arrival"));
    }

    #[test]
    fn test_is_official_trailer() {
        assert!(is_official_trailer("Arrival - Official Trailer (2016)"));
        assert!(is_official_trailer("STALKER Teaser"));
        assert!(!is_official_trailer("Arrival Trailer Reaction"));
        assert!(!is_official_trailer("Arrival trailer breakdown & easter eggs"));
        assert!(!is_official_trailer("Dune (2021) Fan Made Trailer"));
        assert!(!is_official_trailer("Arrival - Ending Explained"));
        assert!(!is_official_trailer("Arrival full movie"));
    }
}
