pub mod dataset;
pub mod layout;

use crate::context::Context;
use crate::error::RenderError;
use crate::parser::FunctionCall;

/// Dispatch one function call against the rendering context.
///
/// Unknown names are non-fatal: log a warning and leave the context
/// untouched.
pub fn dispatch(ctx: &mut Context, call: &FunctionCall) -> Result<(), RenderError> {
    match call.name.as_str() {
        "for" => layout::for_loop(ctx, &call.args),
        "fill" => layout::fill(ctx, &call.args),
        "merge" => layout::merge(ctx, &call.args),

        "filterMax" => dataset::filter_max(ctx, &call.args),
        "filterMin" => dataset::filter_min(ctx, &call.args),
        "select" => dataset::select(ctx, &call.args),
        "cancelSelect" => dataset::cancel_select(ctx, &call.args),
        "first" => dataset::first(ctx, &call.args),
        "max" => dataset::max(ctx, &call.args),
        "min" => dataset::min(ctx, &call.args),
        "print" => dataset::print(ctx, &call.args),

        other => {
            tracing::warn!(function = other, "unknown template function, skipping");
            Ok(())
        }
    }
}
