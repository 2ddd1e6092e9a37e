use std::collections::HashSet;

/// Split a comma separated list into tags, keeping the first spelling of each
/// tag and dropping later case-insensitive duplicates.
pub fn parse_tags(raw: &str) -> Vec<String> {
    normalize_tags(raw.split(','))
}

pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if tag.is_empty() {
            continue;
        }
        if seen.insert(tag.to_lowercase()) {
            unique.push(tag.to_string());
        }
    }
    unique
}

pub fn has_tag(tags: &[String], wanted: &str) -> bool {
    let wanted = wanted.trim().to_lowercase();
    tags.iter().any(|tag| tag.to_lowercase() == wanted)
}

/// Union of several tag lists, sorted case-insensitively.
pub fn collect_tags<'a, I>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut all = normalize_tags(lists.into_iter().flatten());
    all.sort_by_key(|tag| tag.to_lowercase());
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tags_dedupes_case_insensitively() {
        assert_eq!(
            parse_tags("Gym, gym, READING, reading, "),
            vec!["Gym".to_string(), "READING".to_string()]
        );
    }

    #[test]
    fn parse_tags_is_idempotent() {
        let inputs = [
            "Gym, gym, READING, reading, ",
            " a ,, b,A , c ",
            "",
            ",,,",
            "Läufe, LÄUFE, focus",
        ];
        for raw in inputs {
            let once = parse_tags(raw);
            let twice = parse_tags(&once.join(", "));
            assert_eq!(once, twice, "input {raw:?}");
        }
    }

    #[test]
    fn parse_tags_keeps_first_order() {
        assert_eq!(parse_tags("b, a, B, c"), vec!["b", "a", "c"]);
    }

    #[test]
    fn has_tag_ignores_case_and_padding() {
        let tags = vec!["Health".to_string(), "Books".to_string()];
        assert!(has_tag(&tags, " health"));
        assert!(!has_tag(&tags, "movies"));
    }

    #[test]
    fn collect_tags_merges_and_sorts() {
        let habit = vec!["walk".to_string(), "Health".to_string()];
        let entry = vec!["health".to_string(), "Books".to_string()];
        let merged = collect_tags([habit.as_slice(), entry.as_slice()]);
        assert_eq!(merged, vec!["Books", "Health", "walk"]);
    }
}
