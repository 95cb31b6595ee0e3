use serde_json::Value;

use crate::context::Context;
use crate::data;
use crate::error::RenderError;
use crate::parser::Argument;

fn arg_text(arg: Option<&Argument>) -> Option<String> {
    arg.map(|a| a.as_text())
}

/// Column name argument, defaulting to the expression's column key
fn column_arg(ctx: &Context, args: &[Argument]) -> String {
    match arg_text(args.first()) {
        Some(name) if !name.is_empty() => name,
        _ => ctx.column_key(),
    }
}

/// Replace the active dataset with the records whose value at the
/// column equals the dataset-wide maximum
pub fn filter_max(ctx: &mut Context, args: &[Argument]) -> Result<(), RenderError> {
    filter_extreme(ctx, args, true, "filterMax")
}

/// Replace the active dataset with the records whose value at the
/// column equals the dataset-wide minimum
pub fn filter_min(ctx: &mut Context, args: &[Argument]) -> Result<(), RenderError> {
    filter_extreme(ctx, args, false, "filterMin")
}

fn filter_extreme(
    ctx: &mut Context,
    args: &[Argument],
    want_max: bool,
    function: &'static str,
) -> Result<(), RenderError> {
    let column = column_arg(ctx, args);
    let extreme = data::column_extreme(&ctx.data.active, &column, want_max)
        .ok_or(RenderError::EmptyDataset { function })?;
    let filtered: Vec<Value> = data::records(&ctx.data.active)
        .iter()
        .filter(|r| data::values_equal(data::field(r, &column), &extreme))
        .cloned()
        .collect();
    ctx.data.active = Value::Array(filtered);
    Ok(())
}

/// Push the active dataset and navigate to a `/`-delimited path.
/// A leading empty segment restarts from the root dataset; a missing
/// key anywhere resolves to an undefined (Null) dataset.
pub fn select(ctx: &mut Context, args: &[Argument]) -> Result<(), RenderError> {
    let path = arg_text(args.first()).unwrap_or_default();
    ctx.data.selection.push(ctx.data.active.clone());

    let mut segments: Vec<&str> = path.split('/').collect();
    let from_root = segments.first() == Some(&"");
    if from_root {
        segments.remove(0);
    }
    let base = if from_root {
        ctx.data.root.clone()
    } else {
        ctx.data.active.clone()
    };
    ctx.data.active = data::navigate(&base, &segments);
    Ok(())
}

/// Pop the selection stack back into the active dataset
pub fn cancel_select(ctx: &mut Context, _args: &[Argument]) -> Result<(), RenderError> {
    ctx.data.active = ctx
        .data
        .selection
        .pop()
        .ok_or(RenderError::SelectStackEmpty)?;
    Ok(())
}

/// Output the named column of the active dataset's first record
pub fn first(ctx: &mut Context, args: &[Argument]) -> Result<(), RenderError> {
    let column = column_arg(ctx, args);
    let record = data::records(&ctx.data.active)
        .first()
        .ok_or(RenderError::EmptyDataset { function: "first" })?;
    ctx.output = data::value_to_cell(data::field(record, &column));
    Ok(())
}

/// Output the maximum value of the named column across the dataset
pub fn max(ctx: &mut Context, args: &[Argument]) -> Result<(), RenderError> {
    extreme(ctx, args, true, "max")
}

/// Output the minimum value of the named column across the dataset
pub fn min(ctx: &mut Context, args: &[Argument]) -> Result<(), RenderError> {
    extreme(ctx, args, false, "min")
}

fn extreme(
    ctx: &mut Context,
    args: &[Argument],
    want_max: bool,
    function: &'static str,
) -> Result<(), RenderError> {
    let column = column_arg(ctx, args);
    let value = data::column_extreme(&ctx.data.active, &column, want_max)
        .ok_or(RenderError::EmptyDataset { function })?;
    ctx.output = data::value_to_cell(&value);
    Ok(())
}

/// Output the literal argument
pub fn print(ctx: &mut Context, args: &[Argument]) -> Result<(), RenderError> {
    ctx.output = match args.first() {
        Some(Argument::Text(s)) => sheetscript_core::CellValue::Text(s.clone()),
        Some(Argument::Number(n)) => sheetscript_core::CellValue::Number(*n),
        Some(Argument::Bool(b)) => sheetscript_core::CellValue::Bool(*b),
        None => sheetscript_core::CellValue::Empty,
    };
    Ok(())
}
