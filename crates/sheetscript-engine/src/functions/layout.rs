use sheetscript_core::{CellCoord, CellRange};

use crate::context::{Context, Deferred};
use crate::data;
use crate::error::RenderError;
use crate::parser::{has_command, parse_cell, Argument};

/// Row argument as a 0-indexed grid row; template authors write
/// 1-based spreadsheet row numbers
fn arg_row(arg: Option<&Argument>) -> Option<u32> {
    let n = arg?.as_number()?;
    if n < 1.0 {
        return None;
    }
    Some(n as u32 - 1)
}

/// Loop a template row block over the groups of the active dataset.
///
/// Groups the dataset by the expression's column key, defers one
/// duplication of the `[start, end]` block per group after the first,
/// and schedules dataset swaps so each block renders against its
/// group's subset, restoring the original dataset past the last
/// block. Remaining expressions in this cell are skipped.
pub fn for_loop(ctx: &mut Context, args: &[Argument]) -> Result<(), RenderError> {
    let start = arg_row(args.first()).unwrap_or(ctx.coord.row);
    let end = arg_row(args.get(1)).unwrap_or(ctx.coord.row).max(start);

    let key = ctx.column_key();
    let groups = data::group_by(&ctx.data.active, &key);
    let original = ctx.data.active.clone();

    tracing::debug!(key = %key, groups = groups.len(), "for: scheduling row blocks");
    ctx.deferred.push(Deferred::ForBlocks {
        start,
        end,
        anchor: ctx.coord,
        groups,
        original,
    });
    ctx.revisit = true;
    ctx.halt = true;
    Ok(())
}

/// Fill the current row once per record of the active dataset.
///
/// With mode "group", the dataset is first deduplicated by the set of
/// type-less column keys found on this row. Duplication and cell
/// writes are deferred until this cell's value is finalized.
pub fn fill(ctx: &mut Context, args: &[Argument]) -> Result<(), RenderError> {
    let grouped = matches!(args.first(), Some(Argument::Text(m)) if m == "group");

    let records = if grouped {
        let mut keys: Vec<String> = Vec::new();
        for col in 0..ctx.sheet.row_len(ctx.coord.row) {
            let text = ctx.sheet.cell_text(CellCoord::new(ctx.coord.row, col));
            if !has_command(&text) {
                continue;
            }
            let parsed = parse_cell(&text)?;
            for expr in parsed.expressions.iter().filter(|e| e.marker.is_none()) {
                if !expr.column_key.is_empty() {
                    keys.push(expr.column_key.clone());
                }
            }
        }
        data::distinct_by(&ctx.data.active, &keys)
    } else {
        data::records(&ctx.data.active).to_vec()
    };

    tracing::debug!(records = records.len(), grouped, "fill: scheduling rows");
    ctx.deferred.push(Deferred::FillRows {
        anchor: ctx.coord,
        records,
    });
    ctx.revisit = true;
    ctx.halt = true;
    Ok(())
}

/// Re-merge a rectangle anchored at the current cell, spanning
/// `extra_height + 1` rows by `extra_width + 1` columns. Post-process
/// only: injected `{@.merge(w,h)}` directives reconstruct regions
/// captured before the pre-render unmerge.
pub fn merge(ctx: &mut Context, args: &[Argument]) -> Result<(), RenderError> {
    let extra_width = args.first().and_then(|a| a.as_number()).unwrap_or(0.0) as u32;
    let extra_height = args.get(1).and_then(|a| a.as_number()).unwrap_or(0.0) as u32;
    let anchor = ctx.coord;
    let range = CellRange::new(
        anchor,
        CellCoord::new(anchor.row + extra_height, anchor.col + extra_width),
    );
    ctx.sheet.merge_range(range);
    Ok(())
}
