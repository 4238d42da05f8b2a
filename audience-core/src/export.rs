use crate::analysis::RankedLiker;
use crate::model::Liker;
use error_stack::{Report, ResultExt};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
#[error("failed to build the export file")]
pub struct ExportError;

pub type ExportResult<T> = Result<T, Report<ExportError>>;

const TOP_LIKER_CATEGORY: &str = "Top Liker";
const WARM_AUDIENCE_CATEGORY: &str = "Warm Audience";

/// One spreadsheet row of the audience analysis export.
#[derive(Debug, Serialize)]
pub struct AudienceRow<'a> {
    pub category: &'static str,
    pub username: &'a str,
    pub full_name: &'a str,
    pub like_count: Option<u64>,
}

/// Flattens the two analysis lists into export rows, top likers first.
pub fn audience_rows<'a>(
    top_likers: &'a [RankedLiker],
    warm_audience: &'a [Liker],
) -> Vec<AudienceRow<'a>> {
    top_likers
        .iter()
        .map(|ranked| AudienceRow {
            category: TOP_LIKER_CATEGORY,
            username: &ranked.liker.username,
            full_name: &ranked.liker.full_name,
            like_count: Some(ranked.like_count),
        })
        .chain(warm_audience.iter().map(|liker| AudienceRow {
            category: WARM_AUDIENCE_CATEGORY,
            username: &liker.username,
            full_name: &liker.full_name,
            like_count: None,
        }))
        .collect()
}

/// Serializes the rows into a CSV document, header row included.
pub fn write_csv(rows: &[AudienceRow<'_>]) -> ExportResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for row in rows {
        writer.serialize(row).change_context(ExportError)?;
    }

    writer.into_inner().change_context(ExportError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_cover_both_categories_in_order() {
        let top = vec![RankedLiker {
            liker: Liker {
                username: "a".to_string(),
                full_name: "Ay".to_string(),
            },
            like_count: 3,
        }];
        let warm = vec![Liker {
            username: "b".to_string(),
            full_name: "Bee".to_string(),
        }];

        let rows = audience_rows(&top, &warm);

        assert_eq!(2, rows.len());
        assert_eq!(("Top Liker", "a"), (rows[0].category, rows[0].username));
        assert_eq!(("Warm Audience", "b"), (rows[1].category, rows[1].username));
    }

    #[test]
    fn csv_has_a_header_and_one_line_per_row() {
        let top = vec![RankedLiker {
            liker: Liker {
                username: "a".to_string(),
                full_name: "Ay".to_string(),
            },
            like_count: 3,
        }];
        let warm = vec![Liker {
            username: "b".to_string(),
            full_name: String::new(),
        }];

        let bytes = write_csv(&audience_rows(&top, &warm)).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(3, lines.len());
        assert_eq!("category,username,full_name,like_count", lines[0]);
        assert_eq!("Top Liker,a,Ay,3", lines[1]);
        assert_eq!("Warm Audience,b,,", lines[2]);
    }
}
