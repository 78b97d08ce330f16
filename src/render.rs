//! Markdown templates for generated documents.

use chrono::{DateTime, Local, NaiveDate};

use crate::derive::title_case;

/// Section headers of every notes scaffold, in order.
pub const NOTES_SECTIONS: [&str; 5] = [
    "Key Concepts",
    "Time Complexity",
    "Space Complexity",
    "Personal Notes",
    "Related Problems",
];

pub const PERSONAL_NOTES_HEADER: &str = "## Personal Notes";

/// Fields shown in the summary document.
pub struct Summary<'a> {
    pub title: &'a str,
    pub locator: &'a str,
    pub language: &'a str,
    pub path: &'a str,
    pub description: Option<&'a str>,
    pub tags: &'a [String],
    pub fetched_at: DateTime<Local>,
}

pub fn summary_document(s: &Summary<'_>) -> String {
    let tags = if s.tags.is_empty() {
        "No tags".to_string()
    } else {
        s.tags
            .iter()
            .map(|t| format!("`{}`", t))
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "# {title}\n\
         \n\
         **Source**: [{locator}]({locator})\n\
         **Language**: {language}\n\
         **Path**: `{path}`\n\
         \n\
         ## Description\n\
         \n\
         {description}\n\
         \n\
         ## Tags\n\
         \n\
         {tags}\n\
         \n\
         ---\n\
         \n\
         *Automatically fetched on {fetched}*\n",
        title = s.title,
        locator = s.locator,
        language = title_case(s.language),
        path = s.path,
        description = s.description.unwrap_or("No description available."),
        tags = tags,
        fetched = s.fetched_at.format("%Y-%m-%d %H:%M:%S"),
    )
}

pub fn notes_scaffold(title: &str) -> String {
    let mut out = format!("# Notes for {}\n\n", title);
    for section in NOTES_SECTIONS {
        out.push_str(&format!("## {}\n\n- \n\n", section));
    }
    out.push_str("---\n\n*Add your learning notes here*\n");
    out
}

/// Insert a dated entry directly under the personal-notes header, or append
/// it when the header is missing.
pub fn amend_notes(existing: &str, date: NaiveDate, insight: &str) -> String {
    let entry = format!("### {}\n{}", date.format("%Y-%m-%d"), insight);
    if existing.contains(PERSONAL_NOTES_HEADER) {
        existing.replacen(
            PERSONAL_NOTES_HEADER,
            &format!("{}\n\n{}", PERSONAL_NOTES_HEADER, entry),
            1,
        )
    } else {
        format!("{}\n\n{}\n", existing.trim_end(), entry)
    }
}

/// Append a dated bullet to a log document, creating it with `heading` and
/// `intro` when there is no existing content.
pub fn append_log_entry(
    existing: Option<&str>,
    heading: &str,
    intro: &str,
    date: NaiveDate,
    bullet: &str,
) -> String {
    let entry = format!("## {}\n{}\n", date.format("%Y-%m-%d"), bullet);
    match existing {
        Some(body) if !body.trim().is_empty() => {
            format!("{}\n\n{}", body.trim_end(), entry)
        }
        _ => format!("# {}\n\n{}\n\n{}", heading, intro, entry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn summary_includes_all_fields() {
        let tags = vec!["Sorts".to_string()];
        let doc = summary_document(&Summary {
            title: "Bubble Sort",
            locator: "https://github.com/o/r/blob/master/sorts/bubble_sort.py",
            language: "python",
            path: "sorts/bubble_sort.py",
            description: None,
            tags: &tags,
            fetched_at: Local.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
        });
        assert!(doc.starts_with("# Bubble Sort\n"));
        assert!(doc.contains("**Language**: Python\n"));
        assert!(doc.contains("**Path**: `sorts/bubble_sort.py`"));
        assert!(doc.contains("No description available."));
        assert!(doc.contains("`Sorts`"));
        assert!(doc.contains("*Automatically fetched on 2024-03-01 09:30:00*"));
    }

    #[test]
    fn scaffold_has_fixed_sections_in_order() {
        let notes = notes_scaffold("Bubble");
        let positions: Vec<usize> = NOTES_SECTIONS
            .iter()
            .map(|s| notes.find(&format!("## {}\n", s)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(notes.starts_with("# Notes for Bubble\n"));
    }

    #[test]
    fn amend_inserts_under_personal_notes() {
        let notes = notes_scaffold("Bubble");
        let amended = amend_notes(&notes, date(), "- Analyzed edge cases");
        assert!(amended.contains("## Personal Notes\n\n### 2024-03-01\n- Analyzed edge cases\n"));
        assert_eq!(amended.matches(PERSONAL_NOTES_HEADER).count(), 1);
    }

    #[test]
    fn amend_appends_without_header() {
        let amended = amend_notes("# Scratch\n", date(), "- Noted practical applications");
        assert_eq!(
            amended,
            "# Scratch\n\n### 2024-03-01\n- Noted practical applications\n"
        );
    }

    #[test]
    fn log_created_then_appended() {
        let fresh = append_log_entry(None, "Algorithm Learning Log", "Daily reflections.", date(), "- Reviewing");
        assert_eq!(
            fresh,
            "# Algorithm Learning Log\n\nDaily reflections.\n\n## 2024-03-01\n- Reviewing\n"
        );

        let next = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let appended = append_log_entry(Some(&fresh), "ignored", "ignored", next, "- Practicing");
        assert!(appended.starts_with("# Algorithm Learning Log\n"));
        assert!(appended.ends_with("## 2024-03-01\n- Reviewing\n\n## 2024-03-02\n- Practicing\n"));
    }
}
