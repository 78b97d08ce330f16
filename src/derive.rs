//! Deterministic metadata derived from a candidate's path and content.
//!
//! | Function | Input | Example |
//! |----------|-------|---------|
//! | [`title_from_path`] | `sorts/bubble_sort.py` | `Bubble Sort` |
//! | [`language_for_path`] | `sorts/bubble_sort.py` | `python` |
//! | [`tags_from_path`] | `data_structures/binary_tree/avl.py` | `Data Structures`, `Binary Tree` |
//! | [`slugify`] | `Bubble Sort` | `bubble-sort` |

/// Extension → language tag. Anything else is [`FALLBACK_LANGUAGE`].
const LANGUAGES: &[(&str, &str)] = &[
    ("py", "python"),
    ("java", "java"),
    ("js", "javascript"),
    ("ts", "typescript"),
    ("cpp", "cpp"),
    ("c", "c"),
    ("go", "go"),
    ("rs", "rust"),
    ("rb", "ruby"),
    ("kt", "kotlin"),
    ("swift", "swift"),
    ("cs", "csharp"),
];

pub const FALLBACK_LANGUAGE: &str = "text";

const SLUG_MAX_LEN: usize = 50;
const DESCRIPTION_MAX_LINES: usize = 3;

/// Human-readable title from the file name: extension dropped, `_`/`-`
/// become spaces, camelCase is split, then title-cased.
pub fn title_from_path(path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let stem = file_name.split('.').next().unwrap_or(file_name);

    let mut spaced = String::with_capacity(stem.len() + 4);
    let mut prev: Option<char> = None;
    for c in stem.chars() {
        match c {
            '_' | '-' => spaced.push(' '),
            _ => {
                if c.is_uppercase() && prev.is_some_and(|p| p.is_lowercase()) {
                    spaced.push(' ');
                }
                spaced.push(c);
            }
        }
        prev = Some(c);
    }

    title_case(&spaced)
}

/// Capitalize the first letter of every run of letters and lowercase the
/// rest. Non-letters (digits included) start a new run: `2sum` → `2Sum`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Language tag for the file's extension.
pub fn language_for_path(path: &str) -> &'static str {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let Some((_, ext)) = file_name.rsplit_once('.') else {
        return FALLBACK_LANGUAGE;
    };
    let ext = ext.to_ascii_lowercase();
    LANGUAGES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, lang)| *lang)
        .unwrap_or(FALLBACK_LANGUAGE)
}

/// File extension used for the verbatim content copy of a language.
pub fn extension_for_language(language: &str) -> &'static str {
    LANGUAGES
        .iter()
        .find(|(_, lang)| *lang == language)
        .map(|(ext, _)| *ext)
        .unwrap_or("txt")
}

/// Tags from the directory segments of the path (file name excluded).
/// Hidden and empty segments are skipped.
pub fn tags_from_path(path: &str) -> Vec<String> {
    let mut segments: Vec<&str> = path.split('/').collect();
    segments.pop();
    segments
        .into_iter()
        .filter(|s| !s.is_empty() && !s.starts_with('.'))
        .map(|s| title_case(&s.replace(['_', '-'], " ")))
        .collect()
}

/// Leading description of a source file: up to three lines from its
/// opening `#`/`//` comments or first docstring.
pub fn extract_description(content: &str) -> Option<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut docstring: Option<&str> = None;

    for line in content.lines() {
        let stripped = line.trim();

        if let Some(quote) = docstring {
            let text = stripped.replace(quote, "");
            let text = text.trim();
            if !text.is_empty() {
                lines.push(text.to_string());
            }
            if stripped.contains(quote) {
                break;
            }
            continue;
        }

        if stripped.is_empty() {
            continue;
        }
        if let Some(comment) = stripped
            .strip_prefix("//")
            .or_else(|| stripped.strip_prefix('#'))
        {
            // Shebangs and encoding pragmas are not prose.
            if !comment.starts_with('!') && !comment.contains("coding") {
                let comment = comment.trim_start_matches('/').trim();
                if !comment.is_empty() {
                    lines.push(comment.to_string());
                }
            }
            continue;
        }

        let quote = if stripped.contains("\"\"\"") {
            "\"\"\""
        } else if stripped.contains("'''") {
            "'''"
        } else {
            break;
        };
        let text = stripped.replace(quote, "");
        let text = text.trim();
        if !text.is_empty() {
            lines.push(text.to_string());
        }
        // Opening and closing quotes on the same line.
        if stripped.matches(quote).count() >= 2 {
            break;
        }
        docstring = Some(quote);
    }

    if lines.is_empty() {
        None
    } else {
        lines.truncate(DESCRIPTION_MAX_LINES);
        Some(lines.join("\n"))
    }
}

/// Lowercase ASCII slug: alphanumeric runs joined by `-`, at most 50 chars.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.truncate(SLUG_MAX_LEN);
    let trimmed = slug.trim_end_matches('-');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Title recovered from an artifact folder name (`2024-03-01_bubble-sort`
/// → `Bubble Sort`).
pub fn title_from_artifact_id(artifact_id: &str) -> String {
    let slug = artifact_id
        .split_once('_')
        .map(|(_, rest)| rest)
        .unwrap_or(artifact_id);
    title_case(&slug.replace('-', " "))
}
