mod column_anchor;
mod column_detect;
mod column_projection;
mod compose;
mod error;
mod geometry;
mod model;
mod ocr_input;
mod options;
mod output;
mod rows;
mod warning;

use std::path::Path;

use tracing::debug;

use crate::ocr_input::OcrDocument;
use crate::output::{write_layout, write_layout_to_string};

pub use column_anchor::find_anchored_columns;
pub use column_detect::{AttemptOutcome, ColumnSource, ColumnStrategy, StrategyAttempt};
pub use column_projection::find_projection_columns;
pub use compose::{LayoutComposer, assign_column, is_spanning};
pub use error::{LayoutError, StrategyFailure};
pub use geometry::{
    AxisAlignedBox, BoxRejection, EPSILON, Normalized, NormalizedFragment, PageExtents, Point,
    normalize_fragments,
};
pub use model::{
    Column, DocumentLayout, Fragment, LayoutReport, LayoutResult, PageFragments, PageLayout, Row,
};
pub use ocr_input::{parse_ocr_json, read_ocr_file};
pub use options::{
    AnchorOptions, ColumnPolicy, LayoutOptions, OutputFormat, OutputOptions, ProjectionOptions,
    RowOptions, UnassignedPolicy,
};
pub use rows::{build_expanded_rows, build_rows};
pub use warning::{LayoutWarning, WarningCode};

/// Totals over a processed document, for callers that only need the outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSummary {
    pub page_count: usize,
    pub column_row_count: usize,
    pub spanning_row_count: usize,
    /// Input decoding warnings followed by every page's warnings.
    pub warnings: Vec<LayoutWarning>,
}

impl AnalysisSummary {
    fn new(document: &DocumentLayout, input_warnings: Vec<LayoutWarning>) -> Self {
        let mut warnings = input_warnings;
        for page in &document.pages {
            warnings.extend(page.report.warnings.iter().cloned());
        }
        Self {
            page_count: document.pages.len(),
            column_row_count: document.column_row_count(),
            spanning_row_count: document.spanning_row_count(),
            warnings,
        }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.column_row_count + self.spanning_row_count
    }
}

/// Lays out a single page of fragments, reported as page 1.
///
/// # Errors
///
/// Returns [`LayoutError::InvalidOption`] when `options` does not validate.
pub fn analyze_page(
    fragments: &[Fragment],
    options: &LayoutOptions,
) -> Result<PageLayout, LayoutError> {
    let composer = LayoutComposer::new(options.clone())?;
    Ok(composer.compose_page(1, fragments))
}

/// Lays out every page independently, in input order.
///
/// # Errors
///
/// Returns [`LayoutError::InvalidOption`] when `options` does not validate.
pub fn analyze_document(
    pages: &[PageFragments],
    options: &LayoutOptions,
) -> Result<DocumentLayout, LayoutError> {
    let composer = LayoutComposer::new(options.clone())?;
    let pages = pages
        .iter()
        .map(|page| composer.compose_page(page.page, &page.fragments))
        .collect();
    Ok(DocumentLayout { pages })
}

fn analyze_ocr_document(
    document: OcrDocument,
    options: &LayoutOptions,
) -> Result<(DocumentLayout, AnalysisSummary), LayoutError> {
    let layout = analyze_document(&document.pages, options)?;
    let summary = AnalysisSummary::new(&layout, document.warnings);
    debug!(
        pages = summary.page_count,
        column_rows = summary.column_row_count,
        spanning_rows = summary.spanning_row_count,
        warnings = summary.warnings.len(),
        "analyzed OCR document"
    );
    Ok((layout, summary))
}

/// Reads OCR JSON from `input`, lays it out and writes the result to `output`.
///
/// # Errors
///
/// Fails on invalid options, unreadable or malformed input, or when the
/// output cannot be written.
pub fn analyze_ocr_file(
    input: &Path,
    output: &Path,
    output_options: &OutputOptions,
    options: &LayoutOptions,
) -> Result<AnalysisSummary, LayoutError> {
    options.validate()?;

    let document = read_ocr_file(input)?;
    let (layout, summary) = analyze_ocr_document(document, options)?;
    write_layout(output, &layout, output_options)?;

    Ok(summary)
}

/// In-memory variant of [`analyze_ocr_file`].
///
/// # Errors
///
/// Fails on invalid options, malformed input, or when rendering fails.
pub fn analyze_ocr_json_to_string(
    input: &str,
    output_options: &OutputOptions,
    options: &LayoutOptions,
) -> Result<(String, AnalysisSummary), LayoutError> {
    options.validate()?;

    let document = parse_ocr_json(input)?;
    let (layout, summary) = analyze_ocr_document(document, options)?;
    let rendered = write_layout_to_string(&layout, output_options)?;

    Ok((rendered, summary))
}

#[cfg(test)]
mod tests {
    use super::{analyze_document, analyze_ocr_json_to_string, analyze_page};
    use crate::model::{Fragment, PageFragments};
    use crate::options::{LayoutOptions, OutputOptions};
    use crate::warning::WarningCode;

    #[test]
    fn analyze_page_rejects_invalid_options() {
        let mut options = LayoutOptions::default();
        options.anchor.keyword = "  ".to_string();
        let err = analyze_page(&[], &options).expect_err("empty keyword should fail");
        assert!(err.to_string().contains("anchor keyword"));
    }

    #[test]
    fn document_pages_keep_their_numbers() {
        let pages = vec![
            PageFragments {
                page: 4,
                fragments: vec![Fragment::rect(0.0, 0.0, 50.0, 10.0, "alone")],
            },
            PageFragments {
                page: 9,
                fragments: Vec::new(),
            },
        ];
        let document =
            analyze_document(&pages, &LayoutOptions::default()).expect("analysis should succeed");
        assert_eq!(document.pages[0].page, 4);
        assert_eq!(document.pages[1].page, 9);
        assert_eq!(document.column_row_count(), 1);
        assert!(document.pages[1].layout.is_empty());
    }

    #[test]
    fn summary_collects_input_and_page_warnings() {
        let input = r#"[[
            42,
            [[[0, 0], [10, 0], [10, 10], [0, 10]], ["a", 0.9]]
        ]]"#;
        let (_, summary) =
            analyze_ocr_json_to_string(input, &OutputOptions::default(), &LayoutOptions::default())
                .expect("analysis should succeed");

        assert_eq!(summary.page_count, 1);
        assert_eq!(summary.row_count(), 1);
        let codes = summary
            .warnings
            .iter()
            .map(|warning| warning.code)
            .collect::<Vec<_>>();
        assert_eq!(codes[0], WarningCode::SkippedEntry);
        assert_eq!(codes.last(), Some(&WarningCode::SingleColumnFallback));
    }
}
