//! Linear yield sensitivity model

use super::recipe::pct_change;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterChange {
    pub parameter: String,
    pub from: Option<f64>,
    pub to: Option<f64>,
    /// Yield points per percent of parameter change
    pub sensitivity: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionEffect {
    pub parameters: Vec<String>,
    /// Yield points added directly
    pub effect: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeImpact {
    pub change: ParameterChange,
    /// Percent change of the parameter; 0 when it cannot be computed
    pub delta_pct: f64,
    pub impact: f64,
    /// `from` was missing or zero, or `to` was missing
    pub undefined: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YieldImpact {
    pub baseline: f64,
    pub changes: Vec<ChangeImpact>,
    pub interaction_total: f64,
    pub total_delta: f64,
    pub predicted: f64,
}

pub fn yield_impact(
    baseline: f64,
    changes: &[ParameterChange],
    interactions: &[InteractionEffect],
) -> YieldImpact {
    let changes: Vec<ChangeImpact> = changes
        .iter()
        .map(|c| {
            let (delta_pct, undefined) = match (c.from, c.to) {
                (Some(from), Some(to)) if from != 0.0 => (pct_change(from, to), false),
                _ => (0.0, true),
            };
            ChangeImpact {
                change: c.clone(),
                delta_pct,
                impact: delta_pct * c.sensitivity,
                undefined,
            }
        })
        .collect();
    let interaction_total: f64 = interactions.iter().map(|i| i.effect).sum();
    let total_delta = changes.iter().map(|c| c.impact).sum::<f64>() + interaction_total;

    YieldImpact {
        baseline,
        changes,
        interaction_total,
        total_delta,
        predicted: baseline + total_delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yield_impact() {
        let changes = vec![
            ParameterChange {
                parameter: "rf_power".into(),
                from: Some(600.0),
                to: Some(630.0),
                sensitivity: -0.1,
            },
            ParameterChange {
                parameter: "pressure".into(),
                from: Some(0.0),
                to: Some(5.0),
                sensitivity: 1.0,
            },
        ];
        let interactions = vec![InteractionEffect {
            parameters: vec!["rf_power".into(), "pressure".into()],
            effect: -0.2,
        }];
        let r = yield_impact(95.0, &changes, &interactions);
        // +5% × −0.1 = −0.5
        assert!((r.changes[0].impact + 0.5).abs() < 1e-12);
        assert!(!r.changes[0].undefined);
        assert!(r.changes[1].undefined);
        assert_eq!(r.changes[1].impact, 0.0);
        assert!((r.total_delta + 0.7).abs() < 1e-12);
        assert!((r.predicted - 94.3).abs() < 1e-12);
    }

    #[test]
    fn test_no_changes() {
        let r = yield_impact(90.0, &[], &[]);
        assert_eq!(r.predicted, 90.0);
        assert_eq!(r.total_delta, 0.0);
    }
}
