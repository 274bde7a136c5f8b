use hiveforge::optimizer::RunHistory;
use hiveforge::HiveResult;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct HistoryRow<'a> {
    iteration: usize,
    best_cost: f64,
    mean_cost: f64,
    std_cost: f64,
    diversity: f64,
    employed_accepted: usize,
    onlooker_accepted: usize,
    scout_count: usize,
    /// Best position, coordinates joined with ';'
    best_parameters: &'a str,
}

pub fn write_history_csv(path: &Path, history: &RunHistory) -> HiveResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in history.records() {
        let params = r
            .best_parameters
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(";");
        wtr.serialize(HistoryRow {
            iteration: r.iteration,
            best_cost: r.best_cost,
            mean_cost: r.mean_cost,
            std_cost: r.std_cost,
            diversity: r.diversity,
            employed_accepted: r.employed_accepted,
            onlooker_accepted: r.onlooker_accepted,
            scout_count: r.scout_count,
            best_parameters: &params,
        })?;
    }
    wtr.flush()?;
    Ok(())
}
