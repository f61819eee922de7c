use serde::Serialize;
use shotdiff_common::{DiffAlgorithm, DiffSettings};
use similar::{Algorithm, ChangeTag, TextDiff};
use std::borrow::Cow;

const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// Line counts gathered from one diff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineStats {
    pub equal: usize,
    pub inserted: usize,
    pub deleted: usize,
    pub old_lines: usize,
    pub new_lines: usize,
}

impl LineStats {
    pub fn changed(&self) -> usize {
        self.inserted + self.deleted
    }
}

/// Outcome of comparing an original text against an actual text
#[derive(Debug, Clone, PartialEq)]
pub struct TextComparison {
    pub stats: LineStats,
    /// Normalized divergence in `[0, 1]`
    pub difference: f64,
    /// Unified diff, present only when `difference > 0`
    pub unified: Option<String>,
}

impl TextComparison {
    pub fn is_identical(&self) -> bool {
        self.difference == 0.0
    }
}

/// Line-based text diff engine
pub struct TextDiffEngine {
    settings: DiffSettings,
}

impl TextDiffEngine {
    pub fn new() -> Self {
        Self {
            settings: DiffSettings::default(),
        }
    }

    pub fn with_settings(settings: DiffSettings) -> Self {
        Self { settings }
    }

    fn preprocess<'a>(&self, text: &'a str) -> Cow<'a, str> {
        if self.settings.normalize_line_endings && text.contains('\r') {
            Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
        } else {
            Cow::Borrowed(text)
        }
    }

    fn algorithm(&self) -> Algorithm {
        match self.settings.algorithm {
            DiffAlgorithm::Myers => Algorithm::Myers,
            DiffAlgorithm::Patience => Algorithm::Patience,
        }
    }

    /// Compare `original` against `actual`, rendering a unified diff when they differ
    pub fn compare_text(&self, original: &str, actual: &str) -> TextComparison {
        let original = self.preprocess(original);
        let actual = self.preprocess(actual);

        let diff = TextDiff::configure()
            .algorithm(self.algorithm())
            .diff_lines(&*original, &*actual);

        let stats = collect_stats(&diff);
        let difference = Self::difference_ratio(&stats);
        let unified = (difference > 0.0).then(|| self.render(&diff));

        TextComparison {
            stats,
            difference,
            unified,
        }
    }

    /// Share of changed lines relative to the longer side, capped at 1.
    ///
    /// A single replaced line in a four-line file counts as one deletion plus
    /// one insertion, giving 0.5. Adding every line to an empty file gives 1.
    /// Once half the lines of the longer side are replaced the ratio reaches 1,
    /// so short inputs with some overlap can still report a full difference.
    pub fn difference_ratio(stats: &LineStats) -> f64 {
        let longest = stats.old_lines.max(stats.new_lines);
        if longest == 0 {
            return 0.0;
        }
        (stats.changed() as f64 / longest as f64).min(1.0)
    }

    /// Render a unified diff of `original` against `actual` regardless of the ratio
    pub fn render_unified(&self, original: &str, actual: &str) -> String {
        let original = self.preprocess(original);
        let actual = self.preprocess(actual);

        let diff = TextDiff::configure()
            .algorithm(self.algorithm())
            .diff_lines(&*original, &*actual);

        self.render(&diff)
    }

    /// Hunk headers carry no line numbers: every hunk starts with `@@ @@`.
    fn render(&self, diff: &TextDiff<'_, '_, '_, str>) -> String {
        let mut output = String::new();
        output.push_str("--- ");
        output.push_str(&self.settings.original_label);
        output.push('\n');
        output.push_str("+++ ");
        output.push_str(&self.settings.new_label);
        output.push('\n');

        for group in diff.grouped_ops(self.settings.context_lines) {
            output.push_str("@@ @@\n");
            for op in &group {
                for change in diff.iter_changes(op) {
                    let sign = match change.tag() {
                        ChangeTag::Equal => ' ',
                        ChangeTag::Delete => '-',
                        ChangeTag::Insert => '+',
                    };
                    output.push(sign);
                    output.push_str(change.value().strip_suffix('\n').unwrap_or(change.value()));
                    output.push('\n');
                    if change.missing_newline() {
                        output.push_str(NO_NEWLINE_MARKER);
                        output.push('\n');
                    }
                }
            }
        }

        output
    }
}

impl Default for TextDiffEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_stats<'a>(diff: &TextDiff<'a, 'a, 'a, str>) -> LineStats {
    let mut stats = LineStats {
        old_lines: diff.old_slices().len(),
        new_lines: diff.new_slices().len(),
        ..LineStats::default()
    };

    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Equal => stats.equal += 1,
            ChangeTag::Insert => stats.inserted += 1,
            ChangeTag::Delete => stats.deleted += 1,
        }
    }

    stats
}
