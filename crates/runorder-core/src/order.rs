//! Sequential execution order checking.
//!
//! A notebook is in order when its non-empty code cells carry execution counts
//! `1, 2, 3, ...` with no gaps, repeats or reversals.

use crate::error::OrderError;
use crate::notebook::Notebook;

/// Check that the notebook's code cells were executed strictly in sequence.
///
/// Cells with empty source are skipped and never change the running count.
/// Stops at the first violation.
pub fn check_order(notebook: &Notebook) -> Result<(), OrderError> {
    let mut previous = 0;

    for (index, cell) in notebook.code_cells().into_iter().enumerate() {
        if cell.is_empty() {
            continue;
        }

        let Some(current) = cell.execution_count else {
            return Err(OrderError::CellNotRun {
                index,
                previous,
                cell: cell.clone(),
            });
        };

        if current != previous + 1 {
            return Err(OrderError::RunOutOfOrder {
                index,
                expected: previous + 1,
                actual: current,
                cell: cell.clone(),
            });
        }

        previous = current;
    }

    tracing::debug!(last_count = previous, "execution order is sequential");
    Ok(())
}
