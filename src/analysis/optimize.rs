//! Gap analysis and adjustment ordering for recipe optimization

use std::collections::BTreeMap;

/// How strongly a parameter moves the outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Sensitivity {
    High,
    #[default]
    Medium,
    Low,
}

impl std::str::FromStr for Sensitivity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "h" => Ok(Sensitivity::High),
            "medium" | "med" | "m" => Ok(Sensitivity::Medium),
            "low" | "l" => Ok(Sensitivity::Low),
            other => Err(format!("unknown sensitivity '{}'", other)),
        }
    }
}

impl std::fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sensitivity::High => write!(f, "HIGH"),
            Sensitivity::Medium => write!(f, "MEDIUM"),
            Sensitivity::Low => write!(f, "LOW"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Constraint {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimizeInput {
    pub recipe: BTreeMap<String, f64>,
    pub current: BTreeMap<String, f64>,
    pub target: BTreeMap<String, f64>,
    pub sensitivity: BTreeMap<String, Sensitivity>,
    pub constraints: BTreeMap<String, Constraint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceGap {
    pub metric: String,
    /// Absent current values count as 0
    pub current: f64,
    pub target: f64,
    /// target − current
    pub gap: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustDirection {
    Increase,
    DecreaseOrOptimize,
}

impl std::fmt::Display for AdjustDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdjustDirection::Increase => write!(f, "increase"),
            AdjustDirection::DecreaseOrOptimize => write!(f, "decrease / optimise"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    pub parameter: String,
    pub value: f64,
    pub sensitivity: Sensitivity,
    pub direction: AdjustDirection,
    pub constraint: Constraint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizePlan {
    pub gaps: Vec<PerformanceGap>,
    /// HIGH sensitivity first, then by name
    pub adjustments: Vec<Adjustment>,
}

pub fn plan_direction(input: &OptimizeInput) -> OptimizePlan {
    let gaps: Vec<PerformanceGap> = input
        .target
        .iter()
        .map(|(metric, &target)| {
            let current = input.current.get(metric).copied().unwrap_or(0.0);
            PerformanceGap {
                metric: metric.clone(),
                current,
                target,
                gap: target - current,
            }
        })
        .collect();

    let direction = if gaps.iter().any(|g| g.gap > 0.0) {
        AdjustDirection::Increase
    } else {
        AdjustDirection::DecreaseOrOptimize
    };

    let mut adjustments: Vec<Adjustment> = input
        .recipe
        .iter()
        .map(|(parameter, &value)| Adjustment {
            parameter: parameter.clone(),
            value,
            sensitivity: input.sensitivity.get(parameter).copied().unwrap_or_default(),
            direction,
            constraint: input.constraints.get(parameter).copied().unwrap_or_default(),
        })
        .collect();
    adjustments.sort_by_key(|a| a.sensitivity);

    OptimizePlan { gaps, adjustments }
}
