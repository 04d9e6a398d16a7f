// Record Intake
// Turns loosely-typed upload rows into reviews, skipping malformed ones

use crate::models::{RatingField, RawReviewRecord, Review};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeIssue {
    MissingProduct,
    MissingRating,
    RatingOutOfRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRecord {
    pub index: usize,
    pub issue: IntakeIssue,
}

#[derive(Debug, Clone, Default)]
pub struct IntakeOutcome {
    pub reviews: Vec<Review>,
    pub skipped: Vec<SkippedRecord>,
}

/// Validate every row. Rows missing a product tag or a usable 1-5 rating are
/// skipped and reported; an empty body is kept as-is.
pub fn intake_records(records: &[RawReviewRecord]) -> IntakeOutcome {
    let mut outcome = IntakeOutcome::default();

    for (index, record) in records.iter().enumerate() {
        match to_review(record) {
            Ok(review) => outcome.reviews.push(review),
            Err(issue) => {
                debug!(index, ?issue, "intake.record_skipped");
                outcome.skipped.push(SkippedRecord { index, issue });
            }
        }
    }

    outcome
}

fn to_review(record: &RawReviewRecord) -> Result<Review, IntakeIssue> {
    let product = record
        .product
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or(IntakeIssue::MissingProduct)?;

    let rating = parse_rating(record.rating.as_ref())?;

    Ok(Review {
        reviewer: record
            .reviewer
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        body: record.body.clone().unwrap_or_default(),
        rating,
        date: record.date.as_deref().and_then(parse_date),
        product: product.to_string(),
    })
}

fn parse_rating(field: Option<&RatingField>) -> Result<u8, IntakeIssue> {
    let value = match field {
        Some(RatingField::Number(n)) => *n,
        Some(RatingField::Text(s)) => {
            let trimmed = s.trim();
            // "4 out of 5", "4/5", "4 stars"
            let lead: String = trimmed
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            if lead.is_empty() {
                return Err(IntakeIssue::MissingRating);
            }
            lead.parse::<f64>().map_err(|_| IntakeIssue::MissingRating)?
        }
        None => return Err(IntakeIssue::MissingRating),
    };

    if !value.is_finite() {
        return Err(IntakeIssue::MissingRating);
    }
    let rounded = value.round();
    if !(1.0..=5.0).contains(&rounded) {
        return Err(IntakeIssue::RatingOutOfRange);
    }
    Ok(rounded as u8)
}

/// Best-effort date parsing; unknown formats yield `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(product: Option<&str>, rating: Option<RatingField>, body: Option<&str>) -> RawReviewRecord {
        RawReviewRecord {
            reviewer: Some(" jane_d ".to_string()),
            body: body.map(str::to_string),
            rating,
            date: Some("2024-03-09".to_string()),
            product: product.map(str::to_string),
        }
    }

    #[test]
    fn test_valid_record_converted() {
        let out = intake_records(&[record(
            Some(" Compression Socks "),
            Some(RatingField::Text("4 out of 5".into())),
            Some("Great"),
        )]);
        assert!(out.skipped.is_empty());
        let r = &out.reviews[0];
        assert_eq!(r.product, "Compression Socks");
        assert_eq!(r.rating, 4);
        assert_eq!(r.reviewer, "jane_d");
        assert_eq!(r.date, NaiveDate::from_ymd_opt(2024, 3, 9));
    }

    #[test]
    fn test_malformed_records_skipped_and_counted() {
        let out = intake_records(&[
            record(None, Some(RatingField::Number(5.0)), Some("a")),
            record(Some("  "), Some(RatingField::Number(5.0)), Some("b")),
            record(Some("Socks"), None, Some("c")),
            record(Some("Socks"), Some(RatingField::Text("n/a".into())), Some("d")),
            record(Some("Socks"), Some(RatingField::Number(9.0)), Some("e")),
            record(Some("Socks"), Some(RatingField::Number(5.0)), None),
        ]);
        assert_eq!(out.reviews.len(), 1);
        assert_eq!(out.reviews[0].body, "");
        let issues: Vec<_> = out.skipped.iter().map(|s| (s.index, s.issue)).collect();
        assert_eq!(
            issues,
            vec![
                (0, IntakeIssue::MissingProduct),
                (1, IntakeIssue::MissingProduct),
                (2, IntakeIssue::MissingRating),
                (3, IntakeIssue::MissingRating),
                (4, IntakeIssue::RatingOutOfRange),
            ]
        );
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 31);
        assert_eq!(parse_date("2024-01-31"), expected);
        assert_eq!(parse_date("01/31/2024"), expected);
        assert_eq!(parse_date("2024-01-31T10:00:00Z"), expected);
        assert_eq!(parse_date("January 31, 2024"), expected);
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_raw_record_aliases_deserialize() {
        let raw = r#"[{"author": "a", "text": "Love them", "stars": "5", "productLine": "Socks"},
                      {"name": "b", "review": "Meh", "score": 3, "product": "Sleeves"}]"#;
        let records: Vec<RawReviewRecord> = serde_json::from_str(raw).unwrap();
        let out = intake_records(&records);
        assert_eq!(out.reviews.len(), 2);
        assert_eq!(out.reviews[0].rating, 5);
        assert_eq!(out.reviews[1].product, "Sleeves");
    }
}
