use serde::Serialize;
use tracing::debug;

use crate::column_anchor::find_anchored_columns;
use crate::column_projection::find_projection_columns;
use crate::error::StrategyFailure;
use crate::geometry::{NormalizedFragment, PageExtents};
use crate::model::Column;
use crate::options::LayoutOptions;
use crate::warning::{LayoutWarning, WarningCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnStrategy {
    Anchored,
    Projection,
}

/// Where the final column list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnSource {
    Anchored,
    Projection,
    /// Every strategy failed; the page is one column.
    PageWide,
}

impl From<ColumnStrategy> for ColumnSource {
    fn from(strategy: ColumnStrategy) -> Self {
        match strategy {
            ColumnStrategy::Anchored => Self::Anchored,
            ColumnStrategy::Projection => Self::Projection,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Succeeded { columns: usize },
    Failed(StrategyFailure),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyAttempt {
    pub strategy: ColumnStrategy,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDetection {
    pub columns: Vec<Column>,
    pub source: ColumnSource,
    pub attempts: Vec<StrategyAttempt>,
}

fn run_strategy(
    strategy: ColumnStrategy,
    fragments: &[NormalizedFragment<'_>],
    extents: &PageExtents,
    options: &LayoutOptions,
) -> Result<Vec<Column>, StrategyFailure> {
    match strategy {
        ColumnStrategy::Anchored => {
            find_anchored_columns(fragments, extents.min_x, extents.max_x, &options.anchor)
        }
        ColumnStrategy::Projection => {
            let boxes = fragments
                .iter()
                .map(|fragment| fragment.bbox)
                .collect::<Vec<_>>();
            find_projection_columns(&boxes, extents.min_x, extents.max_x, &options.projection)
        }
    }
}

/// Runs the policy's strategies in order and keeps the first success. When
/// all of them fail the whole page width becomes a single column.
pub(crate) fn detect_columns(
    fragments: &[NormalizedFragment<'_>],
    extents: &PageExtents,
    options: &LayoutOptions,
    page: u32,
    warnings: &mut Vec<LayoutWarning>,
) -> ColumnDetection {
    let mut attempts = Vec::new();

    for &strategy in options.policy.strategies() {
        match run_strategy(strategy, fragments, extents, options) {
            Ok(columns) => {
                debug!(page, ?strategy, columns = columns.len(), "column strategy succeeded");
                attempts.push(StrategyAttempt {
                    strategy,
                    outcome: AttemptOutcome::Succeeded {
                        columns: columns.len(),
                    },
                });
                return ColumnDetection {
                    columns,
                    source: strategy.into(),
                    attempts,
                };
            }
            Err(failure) => {
                debug!(page, ?strategy, %failure, "column strategy failed");
                warnings.push(
                    LayoutWarning::new(
                        WarningCode::ColumnStrategyFailed,
                        format!("{strategy:?} column detection failed: {failure}"),
                    )
                    .with_page(page),
                );
                attempts.push(StrategyAttempt {
                    strategy,
                    outcome: AttemptOutcome::Failed(failure),
                });
            }
        }
    }

    warnings.push(
        LayoutWarning::new(
            WarningCode::SingleColumnFallback,
            "no column strategy succeeded, treating the page as one column",
        )
        .with_page(page),
    );
    ColumnDetection {
        columns: vec![Column::new(extents.min_x, extents.max_x)],
        source: ColumnSource::PageWide,
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{AttemptOutcome, ColumnSource, ColumnStrategy, detect_columns};
    use crate::error::StrategyFailure;
    use crate::geometry::{PageExtents, normalize_fragments};
    use crate::model::{Column, Fragment};
    use crate::options::{ColumnPolicy, LayoutOptions};
    use crate::warning::WarningCode;

    fn extents_of(fragments: &[Fragment]) -> PageExtents {
        PageExtents::from_boxes(&normalize_fragments(fragments).boxes())
            .expect("fixture has valid boxes")
    }

    fn statement_header() -> Vec<Fragment> {
        vec![
            Fragment::rect(0.0, 10.0, 60.0, 30.0, "Assets"),
            Fragment::rect(100.0, 50.0, 140.0, 70.0, "Note"),
            Fragment::rect(300.0, 52.0, 340.0, 70.0, "2024"),
            Fragment::rect(400.0, 52.0, 440.0, 70.0, "2023"),
            Fragment::rect(540.0, 80.0, 600.0, 100.0, "1,000"),
        ]
    }

    #[test]
    fn anchored_strategy_wins_when_header_is_present() {
        let fragments = statement_header();
        let normalized = normalize_fragments(&fragments);
        let mut warnings = Vec::new();
        let detection = detect_columns(
            &normalized.fragments,
            &extents_of(&fragments),
            &LayoutOptions::default(),
            1,
            &mut warnings,
        );

        assert_eq!(detection.source, ColumnSource::Anchored);
        assert_eq!(detection.columns.len(), 4);
        assert_eq!(detection.columns[0], Column::new(0.0, 100.0));
        assert_eq!(detection.attempts.len(), 1);
        assert!(warnings.is_empty());
    }

    #[test]
    fn falls_back_to_projection_without_anchor() {
        let mut fragments = Vec::new();
        for y in [0.0, 40.0] {
            fragments.push(Fragment::rect(0.0, y, 100.0, y + 20.0, "left"));
            fragments.push(Fragment::rect(300.0, y, 400.0, y + 20.0, "right"));
        }
        let normalized = normalize_fragments(&fragments);
        let mut warnings = Vec::new();
        let detection = detect_columns(
            &normalized.fragments,
            &extents_of(&fragments),
            &LayoutOptions::default(),
            2,
            &mut warnings,
        );

        assert_eq!(detection.source, ColumnSource::Projection);
        assert_eq!(detection.columns.len(), 2);
        assert_eq!(
            detection.attempts[0].outcome,
            AttemptOutcome::Failed(StrategyFailure::AnchorNotFound {
                keyword: "Note".to_string()
            })
        );
        assert_eq!(detection.attempts[1].strategy, ColumnStrategy::Projection);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, WarningCode::ColumnStrategyFailed);
        assert_eq!(warnings[0].page, Some(2));
    }

    #[test]
    fn anchored_only_policy_skips_projection() {
        let fragments = vec![
            Fragment::rect(0.0, 0.0, 100.0, 20.0, "left"),
            Fragment::rect(300.0, 0.0, 400.0, 20.0, "right"),
        ];
        let normalized = normalize_fragments(&fragments);
        let options = LayoutOptions {
            policy: ColumnPolicy::AnchoredOnly,
            ..LayoutOptions::default()
        };
        let mut warnings = Vec::new();
        let detection = detect_columns(
            &normalized.fragments,
            &extents_of(&fragments),
            &options,
            1,
            &mut warnings,
        );

        assert_eq!(detection.source, ColumnSource::PageWide);
        assert_eq!(detection.columns, vec![Column::new(0.0, 400.0)]);
        assert_eq!(detection.attempts.len(), 1);
        assert_eq!(
            warnings.last().map(|warning| warning.code),
            Some(WarningCode::SingleColumnFallback)
        );
    }
}
