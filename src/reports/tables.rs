use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use hiveforge::checkpoint::CheckpointEntry;
use hiveforge::optimizer::{Bee, RunHistory};

/// The last `last_n` iterations of a run.
pub fn history_table(history: &RunHistory, last_n: usize) {
    if history.is_empty() {
        println!("\n(no iterations recorded)");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Iter").add_attribute(Attribute::Bold),
        Cell::new("Best"),
        Cell::new("Mean"),
        Cell::new("Std"),
        Cell::new("Diversity"),
        Cell::new("Emp+"),
        Cell::new("Onl+"),
        Cell::new("Scouts"),
    ]);

    for i in 0..8 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    let records = history.records();
    let start = records.len().saturating_sub(last_n);
    let mut previous_best = start
        .checked_sub(1)
        .map(|i| records[i].best_cost)
        .unwrap_or(f64::INFINITY);

    for r in &records[start..] {
        let best = Cell::new(format!("{:.6e}", r.best_cost));
        let best = if r.best_cost < previous_best {
            best.fg(Color::Green)
        } else {
            best
        };
        previous_best = r.best_cost;

        table.add_row(vec![
            Cell::new(r.iteration).add_attribute(Attribute::Bold),
            best,
            Cell::new(format!("{:.4e}", r.mean_cost)),
            Cell::new(format!("{:.3e}", r.std_cost)),
            Cell::new(format!("{:.4}", r.diversity)),
            Cell::new(r.employed_accepted),
            Cell::new(r.onlooker_accepted),
            Cell::new(r.scout_count),
        ]);
    }
    println!("\n{}", table);
}

/// Coordinates and auxiliary metrics of the best solution.
pub fn best_table(best: &Bee) {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.set_header(vec![
        Cell::new("Best solution").add_attribute(Attribute::Bold),
        Cell::new(format!("cost {:.6e}", best.cost)).fg(Color::Green),
    ]);

    for (dim, value) in best.position.iter().enumerate() {
        table.add_row(vec![
            Cell::new(format!("x[{}]", dim)),
            Cell::new(format!("{:.8}", value)).set_alignment(CellAlignment::Right),
        ]);
    }
    for (name, value) in &best.aux {
        table.add_row(vec![
            Cell::new(name).add_attribute(Attribute::Italic),
            Cell::new(format!("{:.6e}", value)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("\n{}", table);
}

pub fn checkpoint_table(entries: &[CheckpointEntry]) {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.set_header(vec!["Seq", "Iteration", "File"]);

    for e in entries {
        let file = e
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(e.sequence).set_alignment(CellAlignment::Right),
            Cell::new(e.iteration).set_alignment(CellAlignment::Right),
            Cell::new(file),
        ]);
    }
    println!("\n{}", table);
}
