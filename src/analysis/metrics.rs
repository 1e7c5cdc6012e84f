//! KPI attainment against targets

use std::collections::BTreeMap;

use super::equipment::MetricDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KpiStatus {
    Achieved,
    Missed,
    NoData,
}

impl std::fmt::Display for KpiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KpiStatus::Achieved => write!(f, "achieved"),
            KpiStatus::Missed => write!(f, "missed"),
            KpiStatus::NoData => write!(f, "no data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KpiRow {
    pub name: String,
    pub current: Option<f64>,
    pub target: f64,
    pub direction: MetricDirection,
    /// current − target
    pub gap: Option<f64>,
    pub status: KpiStatus,
}

/// One row per target, in name order
pub fn evaluate_kpis(current: &BTreeMap<String, f64>, targets: &BTreeMap<String, f64>) -> Vec<KpiRow> {
    targets
        .iter()
        .map(|(name, &target)| {
            let direction = MetricDirection::of(name);
            let value = current.get(name).copied();
            let status = match value {
                None => KpiStatus::NoData,
                Some(v) if direction.meets(v, target) => KpiStatus::Achieved,
                Some(_) => KpiStatus::Missed,
            };
            KpiRow {
                name: name.clone(),
                current: value,
                target,
                direction,
                gap: value.map(|v| v - target),
                status,
            }
        })
        .collect()
}
