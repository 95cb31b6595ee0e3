use std::collections::VecDeque;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use sheetscript_core::{parse_value_text, CellCoord, CellRange, CellValue, Sheet, Workbook};

use crate::context::{Context, DataRef, Deferred, Event, EventAction, EventPhase};
use crate::data;
use crate::error::RenderError;
use crate::functions;
use crate::parser::{has_command, parse_cell, ParsedCell};
use crate::token::Marker;

/// Name given to the placeholder sheet replacing a grouped worksheet
/// whose key produced no groups
const NO_DATA_SHEET: &str = "No Data";

/// Extract the group key from a worksheet name containing `{#key}`.
///
/// This marker grammar is independent of the cell DSL even though it
/// shares the `#` character.
fn sheet_group_key(name: &str) -> Option<String> {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    let re = MARKER.get_or_init(|| Regex::new(r"\{#([^}]+)\}").expect("static pattern"));
    re.captures(name).map(|caps| caps[1].to_string())
}

fn placeholder_name(workbook: &Workbook) -> String {
    if workbook.sheet_index(NO_DATA_SHEET).is_none() {
        return NO_DATA_SHEET.to_string();
    }
    let mut i = 2;
    loop {
        let name = format!("{} {}", NO_DATA_SHEET, i);
        if workbook.sheet_index(&name).is_none() {
            return name;
        }
        i += 1;
    }
}

/// Render every worksheet of the workbook against the dataset.
///
/// Worksheets named with a `{#key}` marker are instantiated once per
/// distinct key value; sheets added during rendering are not
/// revisited.
pub fn render_workbook(workbook: &mut Workbook, dataset: &Value) -> Result<(), RenderError> {
    let names = workbook.sheet_names();
    for name in names {
        let Some(index) = workbook.sheet_index(&name) else {
            continue;
        };
        match sheet_group_key(&name) {
            None => {
                if let Some(sheet) = workbook.sheet_mut(index) {
                    SheetRenderer::new(sheet, dataset.clone()).render()?;
                }
            }
            Some(key) => render_group_sheets(workbook, index, &key, dataset)?,
        }
    }
    Ok(())
}

/// Instantiate a `{#key}` template sheet once per group and render
/// each instance against its group's subset
fn render_group_sheets(
    workbook: &mut Workbook,
    index: usize,
    key: &str,
    dataset: &Value,
) -> Result<(), RenderError> {
    let groups = data::group_by(dataset, key);
    tracing::debug!(key, groups = groups.len(), "instantiating grouped worksheet");

    if groups.is_empty() {
        let name = placeholder_name(workbook);
        workbook.remove_sheet(index)?;
        workbook.insert_sheet(index, name)?;
        return Ok(());
    }

    // The template itself becomes the first instance; the rest are
    // pristine copies placed after it, in group order.
    workbook.rename_sheet(index, groups[0].0.clone())?;
    let mut indices = vec![index];
    let mut prev = index;
    for (group_name, _) in groups.iter().skip(1) {
        prev = workbook.duplicate_sheet(prev, group_name.clone())?;
        indices.push(prev);
    }

    for (i, (_, subset)) in groups.iter().enumerate() {
        if let Some(sheet) = workbook.sheet_mut(indices[i]) {
            SheetRenderer::new(sheet, subset.clone()).render()?;
        }
    }
    Ok(())
}

/// Renders one worksheet: walks the grid in row-major order over two
/// passes, dispatching expressions and scheduling structural changes.
///
/// The event queue and the dataset reference live for exactly one
/// worksheet render; matched events are consumed, so a coordinate
/// visited twice cannot re-fire a stale dataset swap.
pub struct SheetRenderer<'s> {
    sheet: &'s mut Sheet,
    data: DataRef,
    events: VecDeque<Event>,
}

impl<'s> SheetRenderer<'s> {
    pub fn new(sheet: &'s mut Sheet, dataset: Value) -> Self {
        SheetRenderer {
            sheet,
            data: DataRef::new(dataset),
            events: VecDeque::new(),
        }
    }

    pub fn render(mut self) -> Result<(), RenderError> {
        self.capture_merges();
        self.run_pass(false)?;
        self.run_pass(true)?;
        Ok(())
    }

    /// Unmerge every pre-existing region and append a `{@.merge(w,h)}`
    /// directive to its top-left cell. Merging up front would misalign
    /// with rows duplicated during the primary pass; the post-process
    /// pass rebuilds each region at its final position.
    fn capture_merges(&mut self) {
        let merges: Vec<CellRange> = self.sheet.merges().to_vec();
        for range in merges {
            let anchor = range.top_left();
            self.sheet.unmerge_at(anchor);
            let directive = format!(
                "{}{{@.merge({},{})}}",
                self.sheet.cell_text(anchor),
                range.width() - 1,
                range.height() - 1
            );
            self.sheet.set_cell_text(anchor, directive);
        }
    }

    fn run_pass(&mut self, post: bool) -> Result<(), RenderError> {
        let mut row = 0;
        while row < self.sheet.row_count() {
            let mut col = 0;
            while col < self.sheet.row_len(row) {
                let revisit = self.visit_cell(CellCoord::new(row, col), post)?;
                if !revisit {
                    col += 1;
                }
            }
            row += 1;
        }
        Ok(())
    }

    fn visit_cell(&mut self, coord: CellCoord, post: bool) -> Result<bool, RenderError> {
        if !post {
            self.fire_events(coord);
        }
        let text = self.sheet.cell_text(coord);
        if !has_command(&text) {
            return Ok(false);
        }
        let parsed = parse_cell(&text)?;
        self.render_cell(coord, &parsed, post)
    }

    /// Run and consume every queued beforeRender event targeting the
    /// cursor
    fn fire_events(&mut self, coord: CellCoord) {
        let mut i = 0;
        while i < self.events.len() {
            if self.events[i].target != coord {
                i += 1;
                continue;
            }
            if let Some(event) = self.events.remove(i) {
                match event.action {
                    EventAction::SetActiveDataset(value) => {
                        tracing::debug!(target = %coord, "swapping active dataset");
                        self.data.active = value;
                    }
                }
            }
        }
    }

    /// Evaluate a parsed cell's expressions under the phase rule,
    /// write the reassembled value back, then run deferred actions.
    /// Returns whether the cursor should revisit this cell.
    fn render_cell(
        &mut self,
        coord: CellCoord,
        parsed: &ParsedCell,
        post: bool,
    ) -> Result<bool, RenderError> {
        let mut outputs: Vec<String> = Vec::with_capacity(parsed.expressions.len());
        let mut ctx = Context {
            sheet: &mut *self.sheet,
            data: &mut self.data,
            expression: None,
            coord,
            output: CellValue::Empty,
            deferred: Vec::new(),
            halt: false,
            revisit: false,
            post_process: post,
        };
        for expr in &parsed.expressions {
            // Marker-less expressions never execute; marked ones only
            // in their phase; a halt echoes everything that remains.
            let runs_now = expr
                .marker
                .map(|m| (m == Marker::At) == post)
                .unwrap_or(false);
            if ctx.halt || !runs_now {
                outputs.push(expr.source_text.clone());
                continue;
            }
            ctx.expression = Some(expr);
            ctx.output = CellValue::Empty;
            for call in &expr.calls {
                functions::dispatch(&mut ctx, call)?;
            }
            outputs.push(ctx.output.as_text());
        }
        let revisit = ctx.revisit;
        let deferred = std::mem::take(&mut ctx.deferred);
        drop(ctx);

        let assembled = parsed.assemble(&outputs);
        self.sheet.set_cell_value(coord, parse_value_text(&assembled));

        for action in deferred {
            self.run_deferred(action)?;
        }
        Ok(revisit)
    }

    fn run_deferred(&mut self, action: Deferred) -> Result<(), RenderError> {
        match action {
            Deferred::ForBlocks {
                start,
                end,
                anchor,
                groups,
                original,
            } => {
                let row_count = end - start + 1;
                let count = groups.len() as u32;
                for (i, (key, subset)) in groups.into_iter().enumerate() {
                    let i = i as u32;
                    if i > 0 {
                        self.copy_rows(start, end, start + row_count * i)?;
                    }
                    let target = CellCoord::new(anchor.row + row_count * i, anchor.col);
                    tracing::debug!(group = %key, target = %target, "for: dataset swap scheduled");
                    self.events.push_back(Event {
                        target,
                        phase: EventPhase::BeforeRender,
                        action: EventAction::SetActiveDataset(subset),
                    });
                }
                // Restore the original dataset once the cursor moves
                // past the last block.
                self.events.push_front(Event {
                    target: CellCoord::new(start + row_count * count, 0),
                    phase: EventPhase::BeforeRender,
                    action: EventAction::SetActiveDataset(original),
                });
            }
            Deferred::FillRows { anchor, records } => self.fill_rows(anchor, &records)?,
        }
        Ok(())
    }

    fn fill_rows(&mut self, anchor: CellCoord, records: &[Value]) -> Result<(), RenderError> {
        // Columns on the anchor row still carrying type-less
        // expressions; the command cell itself was finalized before
        // this runs and drops out of the map.
        let mut mapped: Vec<(u32, ParsedCell)> = Vec::new();
        for col in 0..self.sheet.row_len(anchor.row) {
            let text = self.sheet.cell_text(CellCoord::new(anchor.row, col));
            if !has_command(&text) {
                continue;
            }
            let parsed = parse_cell(&text)?;
            if parsed.expressions.iter().any(|e| e.marker.is_none()) {
                mapped.push((col, parsed));
            }
        }

        for (i, record) in records.iter().enumerate() {
            let i = i as u32;
            if i > 0 {
                self.copy_rows(anchor.row, anchor.row, anchor.row + i)?;
            }
            for (col, parsed) in &mapped {
                let outputs: Vec<String> = parsed
                    .expressions
                    .iter()
                    .map(|expr| {
                        if expr.marker.is_none() {
                            data::field_text(record, &expr.column_key)
                        } else {
                            expr.source_text.clone()
                        }
                    })
                    .collect();
                let text = parsed.assemble(&outputs);
                self.sheet
                    .set_cell_value(CellCoord::new(anchor.row + i, *col), parse_value_text(&text));
            }
        }
        Ok(())
    }

    /// Duplicate template rows and atomically shift every queued event
    /// whose target sits at or below the insertion point
    fn copy_rows(&mut self, template_start: u32, template_end: u32, at: u32) -> Result<(), RenderError> {
        let count = self.sheet.insert_copied_rows(template_start, template_end, at)?;
        for event in self.events.iter_mut() {
            if event.target.row >= at {
                event.target.row += count;
            }
        }
        tracing::debug!(template_start, template_end, at, count, "inserted copied rows");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sheet_group_key() {
        assert_eq!(
            sheet_group_key("Sales {#region}").as_deref(),
            Some("region")
        );
        assert_eq!(sheet_group_key("Sales"), None);
        // The cell DSL's other markers are not sheet markers
        assert_eq!(sheet_group_key("Sales {$region}"), None);
    }

    #[test]
    fn test_copy_rows_shifts_queued_events() {
        let mut sheet = Sheet::new("Test");
        sheet.set_cell_text(CellCoord::new(0, 0), "template");
        sheet.set_cell_text(CellCoord::new(3, 0), "below");
        let mut renderer = SheetRenderer::new(&mut sheet, json!([]));
        renderer.events.push_back(Event {
            target: CellCoord::new(3, 0),
            phase: EventPhase::BeforeRender,
            action: EventAction::SetActiveDataset(json!([])),
        });
        renderer.events.push_back(Event {
            target: CellCoord::new(0, 0),
            phase: EventPhase::BeforeRender,
            action: EventAction::SetActiveDataset(json!([])),
        });

        renderer.copy_rows(0, 0, 1).unwrap();
        assert_eq!(renderer.events[0].target, CellCoord::new(4, 0));
        assert_eq!(renderer.events[1].target, CellCoord::new(0, 0));
    }

    #[test]
    fn test_events_are_consumed_on_match() {
        let mut sheet = Sheet::new("Test");
        let mut renderer = SheetRenderer::new(&mut sheet, json!([{"v": 1}]));
        renderer.events.push_back(Event {
            target: CellCoord::new(0, 0),
            phase: EventPhase::BeforeRender,
            action: EventAction::SetActiveDataset(json!([{"v": 2}])),
        });

        renderer.fire_events(CellCoord::new(0, 0));
        assert_eq!(renderer.data.active, json!([{"v": 2}]));
        assert!(renderer.events.is_empty());
    }

    #[test]
    fn test_capture_merges_injects_directive() {
        let mut sheet = Sheet::new("Test");
        sheet.set_cell_text(CellCoord::new(0, 0), "Title");
        sheet.merge_range(CellRange::new(CellCoord::new(0, 0), CellCoord::new(2, 1)));

        let mut renderer = SheetRenderer::new(&mut sheet, json!([]));
        renderer.capture_merges();
        assert!(renderer.sheet.merges().is_empty());
        assert_eq!(
            renderer.sheet.cell_text(CellCoord::new(0, 0)),
            "Title{@.merge(1,2)}"
        );
    }

    #[test]
    fn test_placeholder_name_avoids_collisions() {
        let mut wb = Workbook::new("book");
        assert_eq!(placeholder_name(&wb), "No Data");
        wb.add_sheet("No Data").unwrap();
        assert_eq!(placeholder_name(&wb), "No Data 2");
    }
}
