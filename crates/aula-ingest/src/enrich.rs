//! Derived-column enrichment.
//!
//! Two passes over the table: author/unit extraction from the structured
//! `url` runs as part of normalization, and Content/Evaluation
//! classification runs on explicit request.

use crate::table::EventTable;

/// Author recorded for events whose url carries no author segment.
pub const ANONYMOUS_AUTHOR: &str = "anonymous";

/// `unit_type` value for ordinary content activity.
pub const UNIT_TYPE_CONTENT: &str = "Content";

/// `unit_type` value for evaluation activity.
pub const UNIT_TYPE_EVALUATION: &str = "Evaluation";

/// Unit identifiers whose events are evaluation activity.
pub const EVALUATION_UNITS: &[&str] = &["ed12ad9791554f32b3327671030c0e5e"];

/// The player emits this bare prefix when activity has no content path.
const BARE_PREFIX: &str = "/la/";

/// Derive `author` and `unit` for every row from its `url`.
///
/// Each row is classified on its own url; no table-level branching.
pub fn add_author_unit(table: &mut EventTable) {
    for row in table.rows_mut() {
        let (author, unit) = derive_author_unit(&row.url);
        row.author = author;
        row.unit = unit;
    }
}

/// Split one url into its author and unit columns.
///
/// A url is structured when it contains `/` and is not exactly the bare
/// `/la/` prefix. Structured urls yield segment 1 as author and segment 2
/// as unit (empty when absent, index 0 being the empty text before the
/// leading separator); anything else is anonymous activity on the url
/// itself.
pub fn derive_author_unit(url: &str) -> (String, String) {
    if !url.contains('/') || url == BARE_PREFIX {
        return (ANONYMOUS_AUTHOR.to_string(), url.to_string());
    }

    let mut segments = url.split('/');
    let author = segments.nth(1).unwrap_or_default().to_string();
    let unit = segments.next().unwrap_or_default().to_string();
    (author, unit)
}

/// Classify every row as Content or Evaluation.
///
/// Invoked separately from normalization. Unclassified rows default to
/// `"Content"` and already-tagged rows keep their tag, except that rows
/// whose url is a known evaluation unit are forced to `"Evaluation"`
/// regardless of any prior value.
pub fn add_unit_type(table: &mut EventTable) {
    if table.is_empty() {
        return;
    }

    for row in table.rows_mut() {
        if row.unit_type.is_none() {
            row.unit_type = Some(UNIT_TYPE_CONTENT.to_string());
        }
        if EVALUATION_UNITS.contains(&row.url.as_str()) {
            row.unit_type = Some(UNIT_TYPE_EVALUATION.to_string());
        }
    }
}
