use std::io::Read;
use std::path::Path;

use anyhow::Context;
use chrono::NaiveDate;
use tracing::warn;

use crate::error::DataError;
use crate::models::ProjectWeekRecord;

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    project_id: String,
    project_name: String,
    week_ending: NaiveDate,
    planned_end_date: NaiveDate,
    forecast_end_date: NaiveDate,
    planned_percent_complete: f64,
    actual_percent_complete: f64,
    backlog_items_added_last_4w: u32,
    backlog_items_closed_last_4w: u32,
    requirements_changed_last_4w: u32,
    defect_escape_rate_last_4w: f64,
    defects_open_critical: u32,
    team_size: u32,
    team_churn_last_4w: u32,
    blocked_days_last_2w: u32,
    unplanned_work_ratio_last_4w: f64,
    dependency_count: u32,
    #[serde(default)]
    planned_cost_to_date: Option<f64>,
    #[serde(default)]
    actual_cost_to_date: Option<f64>,
    #[serde(default)]
    milestones_planned_to_date: Option<u32>,
    #[serde(default)]
    milestones_hit: Option<u32>,
}

fn validate(row: CsvRow, line: u64) -> Result<ProjectWeekRecord, DataError> {
    let invalid = |reason: String| DataError::Invalid { row: line, reason };

    if row.project_id.trim().is_empty() {
        return Err(invalid("project_id is empty".to_string()));
    }
    for (name, value) in [
        ("planned_percent_complete", row.planned_percent_complete),
        ("actual_percent_complete", row.actual_percent_complete),
    ] {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(invalid(format!("{name} = {value} not in 0.0..=1.0")));
        }
    }
    for (name, value) in [
        ("defect_escape_rate_last_4w", row.defect_escape_rate_last_4w),
        ("unplanned_work_ratio_last_4w", row.unplanned_work_ratio_last_4w),
    ] {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(invalid(format!("{name} = {value} not in 0.0..=1.0")));
        }
    }
    for (name, value) in [
        ("planned_cost_to_date", row.planned_cost_to_date),
        ("actual_cost_to_date", row.actual_cost_to_date),
    ] {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(invalid(format!("{name} = {v} is negative")));
            }
        }
    }

    Ok(ProjectWeekRecord {
        project_id: row.project_id,
        project_name: row.project_name,
        week_ending: row.week_ending,
        planned_end_date: row.planned_end_date,
        forecast_end_date: row.forecast_end_date,
        planned_percent_complete: row.planned_percent_complete,
        actual_percent_complete: row.actual_percent_complete,
        backlog_items_added_last_4w: row.backlog_items_added_last_4w,
        backlog_items_closed_last_4w: row.backlog_items_closed_last_4w,
        requirements_changed_last_4w: row.requirements_changed_last_4w,
        defect_escape_rate_last_4w: row.defect_escape_rate_last_4w,
        defects_open_critical: row.defects_open_critical,
        team_size: row.team_size,
        team_churn_last_4w: row.team_churn_last_4w,
        blocked_days_last_2w: row.blocked_days_last_2w,
        unplanned_work_ratio_last_4w: row.unplanned_work_ratio_last_4w,
        dependency_count: row.dependency_count,
        planned_cost_to_date: row.planned_cost_to_date,
        actual_cost_to_date: row.actual_cost_to_date,
        milestones_planned_to_date: row.milestones_planned_to_date,
        milestones_hit: row.milestones_hit,
    })
}

/// Read weekly records from any CSV source. Rows that fail to parse or
/// validate are logged and skipped; the rest of the batch proceeds.
pub fn read_records<R: Read>(reader: R) -> Vec<ProjectWeekRecord> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (idx, row) in csv_reader.deserialize::<CsvRow>().enumerate() {
        // Line 1 is the header.
        let line = idx as u64 + 2;
        let parsed = row
            .map_err(|source| DataError::Unparseable { row: line, source })
            .and_then(|r| validate(r, line));
        match parsed {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(error = %err, "skipping row");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, kept = records.len(), "some rows were rejected");
    }
    records
}

/// Load a portfolio CSV from disk.
pub fn load_csv(path: &Path) -> anyhow::Result<Vec<ProjectWeekRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    Ok(read_records(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "project_id,project_name,week_ending,planned_end_date,forecast_end_date,\
planned_percent_complete,actual_percent_complete,backlog_items_added_last_4w,\
backlog_items_closed_last_4w,requirements_changed_last_4w,defect_escape_rate_last_4w,\
defects_open_critical,team_size,team_churn_last_4w,blocked_days_last_2w,\
unplanned_work_ratio_last_4w,dependency_count,planned_cost_to_date,actual_cost_to_date,\
milestones_planned_to_date,milestones_hit";

    fn csv_with(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn parses_full_and_optional_columns() {
        let data = csv_with(&[
            "PRJ-001,Phoenix,2026-03-06,2026-09-30,2026-10-03,0.75,0.74,12,12,2,0.03,2,10,1,2,0.15,6,600000,640000,8,6",
            "PRJ-002,Atlas,2026-03-06,2026-12-31,2026-12-31,0.40,0.42,5,9,1,0.02,0,6,0,0,0.10,3,,,,",
        ]);
        let records = read_records(data.as_bytes());
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].project_id, "PRJ-001");
        assert_eq!(records[0].planned_cost_to_date, Some(600_000.0));
        assert_eq!(records[0].milestones_hit, Some(6));

        assert_eq!(records[1].project_name, "Atlas");
        assert!(records[1].planned_cost_to_date.is_none());
        assert!(records[1].milestones_planned_to_date.is_none());
        assert_eq!(records[1].net_backlog(), -4);
    }

    #[test]
    fn bad_rows_are_skipped_and_rest_proceed() {
        let data = csv_with(&[
            "PRJ-001,Phoenix,2026-03-06,2026-09-30,2026-10-03,0.75,0.74,12,12,2,0.03,2,10,1,2,0.15,6,,,,",
            // unparseable date
            "PRJ-002,Atlas,not-a-date,2026-12-31,2026-12-31,0.40,0.42,5,9,1,0.02,0,6,0,0,0.10,3,,,,",
            // percent complete out of range
            "PRJ-003,Borealis,2026-03-06,2026-12-31,2026-12-31,1.40,0.42,5,9,1,0.02,0,6,0,0,0.10,3,,,,",
            "PRJ-004,Cascade,2026-03-06,2026-12-31,2026-12-31,0.40,0.42,5,9,1,0.02,0,6,0,0,0.10,3,,,,",
        ]);
        let records = read_records(data.as_bytes());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].project_id, "PRJ-001");
        assert_eq!(records[1].project_id, "PRJ-004");
    }

    #[test]
    fn empty_project_id_is_rejected() {
        let data = csv_with(&[
            ",Phoenix,2026-03-06,2026-09-30,2026-10-03,0.75,0.74,12,12,2,0.03,2,10,1,2,0.15,6,,,,",
        ]);
        assert!(read_records(data.as_bytes()).is_empty());
    }

    #[test]
    fn zero_slip_is_a_value_not_an_absence() {
        let data = csv_with(&[
            "PRJ-001,Phoenix,2026-03-06,2026-09-30,2026-09-30,0.75,0.74,0,0,0,0.0,0,10,0,0,0.0,0,,,,",
        ]);
        let records = read_records(data.as_bytes());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].slip_days(), 0);
    }
}
