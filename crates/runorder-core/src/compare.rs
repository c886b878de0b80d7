//! Output comparison between a recorded notebook and its re-execution.

use crate::error::OutputError;
use crate::notebook::{Directive, Notebook};

/// Compare code cell outputs of `re_executed` against `original`.
///
/// Cells are paired by their position among code cells. Runners reject a
/// result whose code cell count differs from the original; any extra cells
/// are ignored here. A `# no-run` directive on the
/// first code cell skips the whole comparison, `# no-check-output` skips one
/// cell. Outputs are compared by deep structural equality and the first
/// mismatch is reported.
pub fn compare_outputs(original: &Notebook, re_executed: &Notebook) -> Result<(), OutputError> {
    let fresh_cells = re_executed.code_cells();

    if fresh_cells
        .first()
        .is_some_and(|cell| cell.has_directive(Directive::NoRun))
    {
        tracing::debug!("first code cell is marked no-run, skipping output comparison");
        return Ok(());
    }

    let recorded_cells = original.code_cells();

    for (index, (fresh, recorded)) in fresh_cells.iter().zip(&recorded_cells).enumerate() {
        if fresh.has_directive(Directive::NoCheckOutput) {
            tracing::debug!(index, "skipping output check");
            continue;
        }

        if fresh.outputs != recorded.outputs {
            return Err(OutputError::Mismatch {
                index,
                cell: (*fresh).clone(),
                expected: recorded.outputs.clone(),
            });
        }
    }

    Ok(())
}
