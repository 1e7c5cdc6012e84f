//! Shift hand-over figures

/// Equipment status words counted as not running
const DOWN_STATUSES: &[&str] = &["down", "pm", "maintenance", "idle", "alarm", "stopped", "error"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductionSummary {
    pub wafer_in: Option<f64>,
    pub wafer_out: Option<f64>,
    pub target: Option<f64>,
    pub yield_pct: Option<f64>,
}

impl ProductionSummary {
    /// wafer_out / target × 100
    pub fn attainment_pct(&self) -> Option<f64> {
        match (self.wafer_out, self.target) {
            (Some(out), Some(target)) if target > 0.0 => Some(out / target * 100.0),
            _ => None,
        }
    }

    /// wafer_in − wafer_out
    pub fn work_in_progress(&self) -> Option<f64> {
        Some(self.wafer_in? - self.wafer_out?)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EquipmentState {
    pub equipment_id: String,
    pub status: String,
    pub issues: Option<String>,
}

impl EquipmentState {
    pub fn is_down(&self) -> bool {
        let status = self.status.trim().to_ascii_lowercase();
        DOWN_STATUSES.iter().any(|s| status.split_whitespace().any(|w| w == *s))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShiftInfo {
    pub shift: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualitySummary {
    pub defect_count: Option<f64>,
    pub major_defects: Vec<String>,
    pub spc_alerts: Option<f64>,
}

impl QualitySummary {
    /// Any defect or SPC alert reported during the shift
    pub fn has_findings(&self) -> bool {
        self.defect_count.is_some_and(|c| c > 0.0)
            || self.spc_alerts.is_some_and(|c| c > 0.0)
            || !self.major_defects.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyEvent {
    pub time: Option<String>,
    pub event: String,
    pub action: Option<String>,
    pub status: Option<String>,
}

/// Everything handed over at the end of a shift
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShiftHandover {
    pub info: ShiftInfo,
    pub production: ProductionSummary,
    pub equipment: Vec<EquipmentState>,
    pub quality: QualitySummary,
    pub events: Vec<KeyEvent>,
    pub pending: Vec<String>,
}

/// Number of units whose status marks them as not running
pub fn down_count(states: &[EquipmentState]) -> usize {
    states.iter().filter(|s| s.is_down()).count()
}
