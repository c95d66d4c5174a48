//! Post-processing hooks
//!
//! A host that rewrites rendered pages registers a [`PostProcessHook`] to
//! see each original document next to the pipeline's result.

use crate::pipeline::PipelineOutcome;
use tracing::debug;

/// Observer called after every completed improve run
pub trait PostProcessHook: Send + Sync {
    /// Inspect the original markup and the run's outcome
    fn after_run(&self, original: &str, outcome: &PipelineOutcome);
}

/// Logs every changed line pair at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffLogHook;

impl DiffLogHook {
    /// Line pairs that differ, numbered from 1; a missing side is empty
    #[must_use]
    pub fn changed_lines<'a>(original: &'a str, improved: &'a str) -> Vec<(usize, &'a str, &'a str)> {
        let mut old = original.lines();
        let mut new = improved.lines();
        let mut changed = Vec::new();
        let mut line = 0;
        loop {
            line += 1;
            match (old.next(), new.next()) {
                (None, None) => break,
                (a, b) => {
                    let (a, b) = (a.unwrap_or_default(), b.unwrap_or_default());
                    if a != b {
                        changed.push((line, a, b));
                    }
                }
            }
        }
        changed
    }
}

impl PostProcessHook for DiffLogHook {
    fn after_run(&self, original: &str, outcome: &PipelineOutcome) {
        let changed = Self::changed_lines(original, &outcome.fixed_html);
        debug!(
            run_id = %outcome.report.run_id,
            changed = changed.len(),
            applied = outcome.remediation.applied(),
            "document diff"
        );
        for (line, before, after) in changed {
            debug!(line, original = before, improved = after, "changed line");
        }
    }
}
