//! Day-of-week rotation rules and the exact post text format.

use std::collections::BTreeSet;

use time::{Date, Weekday};

use crate::domain::entities::TipRecord;

/// Blank line between post sections.
pub const POST_SEPARATOR: &str = "\n\n";

/// Monday maps to category 1, Sunday to category 7.
pub fn category_for_weekday(weekday: Weekday) -> i64 {
    i64::from(weekday.number_from_monday())
}

pub fn category_for_date(date: Date) -> i64 {
    category_for_weekday(date.weekday())
}

/// Tips of the category that have never been attempted.
pub fn eligible_tip_ids(category_tips: &BTreeSet<i64>, posted: &BTreeSet<i64>) -> BTreeSet<i64> {
    category_tips.difference(posted).copied().collect()
}

/// Title, body, code sample and hashtags, skipping empty fields.
pub fn compose_post_text(tip: &TipRecord) -> String {
    let fields = [
        Some(tip.title.as_str()),
        Some(tip.body.as_str()),
        tip.code_sample.as_deref(),
        tip.hashtags.as_deref(),
    ];

    fields
        .into_iter()
        .flatten()
        .filter(|field| !field.is_empty())
        .collect::<Vec<_>>()
        .join(POST_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::TipProvenance;
    use time::macros::{date, datetime};

    fn tip(code_sample: Option<&str>, hashtags: Option<&str>) -> TipRecord {
        TipRecord {
            id: 1,
            category_id: 1,
            title: "Use enumerate() for cleaner loops".into(),
            body: "Get both index and value in loops.".into(),
            code_sample: code_sample.map(str::to_string),
            hashtags: hashtags.map(str::to_string),
            provenance: TipProvenance::Human,
            created_at: datetime!(2025-03-01 00:00:00 UTC),
            last_posted: None,
        }
    }

    #[test]
    fn weekdays_map_to_ordinal_categories() {
        let expected = [
            (Weekday::Monday, 1),
            (Weekday::Tuesday, 2),
            (Weekday::Wednesday, 3),
            (Weekday::Thursday, 4),
            (Weekday::Friday, 5),
            (Weekday::Saturday, 6),
            (Weekday::Sunday, 7),
        ];
        for (weekday, category) in expected {
            assert_eq!(category_for_weekday(weekday), category, "{weekday}");
        }
    }

    #[test]
    fn wednesday_resolves_to_category_three() {
        assert_eq!(category_for_date(date!(2025 - 03 - 05)), 3);
    }

    #[test]
    fn eligible_ids_exclude_posted_tips() {
        let category: BTreeSet<i64> = [10, 11, 12].into();
        let posted: BTreeSet<i64> = [10].into();

        let eligible = eligible_tip_ids(&category, &posted);
        assert_eq!(eligible, [11, 12].into());
    }

    #[test]
    fn post_text_joins_all_fields_with_blank_lines() {
        let text = compose_post_text(&tip(
            Some("for i, item in enumerate(xs):\n    print(i, item)"),
            Some("#Python #CleanCode"),
        ));

        assert_eq!(
            text,
            "Use enumerate() for cleaner loops\n\n\
             Get both index and value in loops.\n\n\
             for i, item in enumerate(xs):\n    print(i, item)\n\n\
             #Python #CleanCode"
        );
    }

    #[test]
    fn post_text_skips_missing_and_empty_fields() {
        let text = compose_post_text(&tip(None, Some("")));
        assert_eq!(
            text,
            "Use enumerate() for cleaner loops\n\nGet both index and value in loops."
        );
    }
}
