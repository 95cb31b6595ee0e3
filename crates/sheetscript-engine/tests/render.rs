use serde_json::json;
use sheetscript_core::{CellCoord, CellRange, CellValue, Workbook};
use sheetscript_engine::render;

fn workbook_with_sheet(name: &str) -> Workbook {
    let mut wb = Workbook::new("book");
    wb.add_sheet(name).unwrap();
    wb
}

fn text(wb: &Workbook, sheet: usize, row: u32, col: u32) -> String {
    wb.sheet(sheet).unwrap().cell_text(CellCoord::new(row, col))
}

fn value(wb: &Workbook, sheet: usize, row: u32, col: u32) -> CellValue {
    wb.sheet(sheet)
        .unwrap()
        .cell_value(CellCoord::new(row, col))
}

#[test]
fn fill_substitutes_typeless_expressions_on_the_row() {
    let mut wb = workbook_with_sheet("Data");
    {
        let sheet = wb.sheet_mut(0).unwrap();
        sheet.set_cell_text(CellCoord::new(0, 0), "Hello {name}");
        sheet.set_cell_text(CellCoord::new(0, 1), "{$.fill()}");
    }

    render(&mut wb, &json!([{"name": "World"}])).unwrap();

    assert_eq!(text(&wb, 0, 0, 0), "Hello World");
    assert_eq!(text(&wb, 0, 0, 1), "");
    assert_eq!(wb.sheet(0).unwrap().row_count(), 1);
}

#[test]
fn fill_duplicates_one_row_per_record() {
    let mut wb = workbook_with_sheet("Data");
    {
        let sheet = wb.sheet_mut(0).unwrap();
        sheet.set_cell_text(CellCoord::new(0, 0), "{name}");
        sheet.set_cell_text(CellCoord::new(0, 1), "{rank}");
        sheet.set_cell_text(CellCoord::new(0, 2), "{$.fill()}");
    }

    render(
        &mut wb,
        &json!([
            {"name": "Alice", "rank": 1},
            {"name": "Bob", "rank": 2},
            {"name": "Cara", "rank": 3},
        ]),
    )
    .unwrap();

    let sheet = wb.sheet(0).unwrap();
    assert_eq!(sheet.row_count(), 3);
    assert_eq!(text(&wb, 0, 0, 0), "Alice");
    assert_eq!(text(&wb, 0, 1, 0), "Bob");
    assert_eq!(text(&wb, 0, 2, 0), "Cara");
    // Numeric text is stored as numbers
    assert_eq!(value(&wb, 0, 0, 1), CellValue::Number(1.0));
    assert_eq!(value(&wb, 0, 2, 1), CellValue::Number(3.0));
}

#[test]
fn for_loop_renders_one_block_per_group_and_restores_dataset() {
    let mut wb = workbook_with_sheet("Report");
    {
        let sheet = wb.sheet_mut(0).unwrap();
        sheet.set_cell_text(CellCoord::new(0, 0), "Report");
        sheet.set_cell_text(CellCoord::new(1, 0), "{$region.for()}");
        sheet.set_cell_text(CellCoord::new(1, 1), "{$region.first()}");
        sheet.set_cell_text(CellCoord::new(1, 2), "{$v.min()}");
        sheet.set_cell_text(CellCoord::new(2, 0), "{$v.min()}");
    }

    render(
        &mut wb,
        &json!([
            {"region": "south", "v": 1},
            {"region": "north", "v": 5},
        ]),
    )
    .unwrap();

    let sheet = wb.sheet(0).unwrap();
    assert_eq!(sheet.row_count(), 4);

    // One block per group, each rendered against its subset
    assert_eq!(text(&wb, 0, 1, 1), "south");
    assert_eq!(value(&wb, 0, 1, 2), CellValue::Number(1.0));
    assert_eq!(text(&wb, 0, 2, 1), "north");
    assert_eq!(value(&wb, 0, 2, 2), CellValue::Number(5.0));

    // The row just past the last block sees the full dataset again:
    // min over both regions, not over the north subset
    assert_eq!(value(&wb, 0, 3, 0), CellValue::Number(1.0));
}

#[test]
fn grouped_sheet_marker_instantiates_one_sheet_per_group() {
    let mut wb = workbook_with_sheet("Sales {#region}");
    wb.sheet_mut(0)
        .unwrap()
        .set_cell_text(CellCoord::new(0, 0), "{$region.first()}");

    render(
        &mut wb,
        &json!([
            {"region": "south"},
            {"region": "north"},
            {"region": "south"},
        ]),
    )
    .unwrap();

    assert_eq!(wb.sheet_names(), vec!["south", "north"]);
    assert_eq!(text(&wb, 0, 0, 0), "south");
    assert_eq!(text(&wb, 1, 0, 0), "north");
}

#[test]
fn grouped_sheet_with_no_groups_becomes_placeholder() {
    let mut wb = workbook_with_sheet("Sales {#region}");
    wb.sheet_mut(0)
        .unwrap()
        .set_cell_text(CellCoord::new(0, 0), "{$region.first()}");

    render(&mut wb, &json!([])).unwrap();

    assert_eq!(wb.sheet_names(), vec!["No Data"]);
    assert_eq!(wb.sheet(0).unwrap().row_count(), 0);
}

#[test]
fn merged_region_survives_row_insertion_above_it() {
    let mut wb = workbook_with_sheet("Data");
    {
        let sheet = wb.sheet_mut(0).unwrap();
        sheet.set_cell_text(CellCoord::new(0, 0), "{name}");
        sheet.set_cell_text(CellCoord::new(0, 1), "{$.fill()}");
        sheet.set_cell_text(CellCoord::new(1, 0), "Total");
        sheet.merge_range(CellRange::new(CellCoord::new(1, 0), CellCoord::new(1, 1)));
    }

    render(
        &mut wb,
        &json!([{"name": "Alice"}, {"name": "Bob"}, {"name": "Cara"}]),
    )
    .unwrap();

    // Two inserted rows pushed the merged row from 1 to 3; the region
    // was rebuilt there and the directive text cleaned up
    let sheet = wb.sheet(0).unwrap();
    assert_eq!(sheet.row_count(), 4);
    assert_eq!(text(&wb, 0, 3, 0), "Total");
    assert_eq!(
        sheet.merges(),
        &[CellRange::new(CellCoord::new(3, 0), CellCoord::new(3, 1))]
    );
}

#[test]
fn select_navigates_and_cancel_restores() {
    let mut wb = workbook_with_sheet("Data");
    wb.sheet_mut(0).unwrap().set_cell_text(
        CellCoord::new(0, 0),
        "{$.select(\"summary\").first(\"title\").cancelSelect()}",
    );

    render(&mut wb, &json!({"summary": [{"title": "Q1"}]})).unwrap();

    assert_eq!(text(&wb, 0, 0, 0), "Q1");
}

#[test]
fn escaped_braces_render_literally() {
    let mut wb = workbook_with_sheet("Data");
    wb.sheet_mut(0)
        .unwrap()
        .set_cell_text(CellCoord::new(0, 0), "\\{name\\}");

    render(&mut wb, &json!([])).unwrap();

    assert_eq!(text(&wb, 0, 0, 0), "{name}");
}

#[test]
fn print_output_follows_the_storage_rule() {
    let mut wb = workbook_with_sheet("Data");
    {
        let sheet = wb.sheet_mut(0).unwrap();
        sheet.set_cell_text(CellCoord::new(0, 0), "{$.print(\"42\")}");
        sheet.set_cell_text(CellCoord::new(0, 1), "{$.print(\"ready\")}");
    }

    render(&mut wb, &json!([])).unwrap();

    assert_eq!(value(&wb, 0, 0, 0), CellValue::Number(42.0));
    assert_eq!(
        value(&wb, 0, 0, 1),
        CellValue::Text("ready".to_string())
    );
}

#[test]
fn typeless_expressions_are_left_untouched_without_fill() {
    let mut wb = workbook_with_sheet("Data");
    wb.sheet_mut(0)
        .unwrap()
        .set_cell_text(CellCoord::new(0, 0), "Hello {name}");

    render(&mut wb, &json!([{"name": "World"}])).unwrap();

    // No fill command on the row, so the block is echoed as-is
    assert_eq!(text(&wb, 0, 0, 0), "Hello {name}");
}

#[test]
fn filter_narrows_dataset_for_later_calls() {
    let mut wb = workbook_with_sheet("Data");
    wb.sheet_mut(0)
        .unwrap()
        .set_cell_text(CellCoord::new(0, 0), "{$amount.filterMax().first(\"name\")}");

    render(
        &mut wb,
        &json!([
            {"name": "low", "amount": 10},
            {"name": "high", "amount": 90},
        ]),
    )
    .unwrap();

    assert_eq!(text(&wb, 0, 0, 0), "high");
}
