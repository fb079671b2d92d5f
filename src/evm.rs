use crate::models::ProjectWeekRecord;

/// Earned-value quantities for one week. Only produced when the cost basis
/// and planned completion allow a well-defined EV.
#[derive(Debug, Clone, Copy)]
pub struct EvmIndices {
    pub earned_value: f64,
    pub cpi: f64,
    pub spi: f64,
}

/// EV = actual% x PV / planned%, CPI = EV/AC, SPI = EV/PV.
///
/// Returns `None` when either cost column is absent or zero, or when
/// planned percent complete is zero (EV undefined). Callers exclude the
/// whole EVM family for that week and redistribute its weight.
pub fn indices(record: &ProjectWeekRecord) -> Option<EvmIndices> {
    let (pv, ac) = record.cost_basis()?;
    if record.planned_percent_complete <= 0.0 {
        return None;
    }
    let earned_value =
        record.actual_percent_complete * pv / record.planned_percent_complete;
    Some(EvmIndices {
        earned_value,
        cpi: earned_value / ac,
        spi: earned_value / pv,
    })
}
