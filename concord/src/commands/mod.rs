// concord/src/commands/mod.rs

pub mod clean;
pub mod inspect;
pub mod normalize;
pub mod query;
pub mod report;
pub mod run;

use comfy_table::Table;
use concord_core::application::QueryOutput;

/// Renders a text result set. NULL cells show as `NULL`.
pub(crate) fn render(output: &QueryOutput) -> Table {
    let mut table = Table::new();
    table.set_header(output.columns.clone());
    for row in &output.rows {
        table.add_row(
            row.iter()
                .map(|cell| cell.clone().unwrap_or_else(|| "NULL".to_string())),
        );
    }
    table
}
