//! Additive what-if model for recipe changes

use std::collections::BTreeMap;

use super::window::ProcessWindow;

/// One impact rule: metric deltas applied when the change set is adopted
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImpactRule {
    pub description: Option<String>,
    pub impact: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationInput {
    pub recipe: BTreeMap<String, f64>,
    pub performance: BTreeMap<String, f64>,
    pub proposed: BTreeMap<String, f64>,
    pub rules: Vec<ImpactRule>,
    pub window: Option<ProcessWindow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub name: String,
    pub before: Option<f64>,
    pub after: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowBreach {
    pub parameter: String,
    pub value: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub recipe: Vec<Transition>,
    pub performance: Vec<Transition>,
    pub breaches: Vec<WindowBreach>,
}

pub fn simulate(input: &SimulationInput) -> SimulationResult {
    let mut after_recipe = input.recipe.clone();
    after_recipe.extend(input.proposed.iter().map(|(k, v)| (k.clone(), *v)));

    let mut predicted = input.performance.clone();
    for rule in &input.rules {
        for (metric, delta) in &rule.impact {
            *predicted.entry(metric.clone()).or_insert(0.0) += delta;
        }
    }

    let breaches = input
        .window
        .as_ref()
        .map(|window| {
            after_recipe
                .iter()
                .filter_map(|(p, &v)| {
                    let bounds = window.get(p)?;
                    (!bounds.contains(v)).then(|| WindowBreach {
                        parameter: p.clone(),
                        value: v,
                        min: bounds.min,
                        max: bounds.max,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    SimulationResult {
        recipe: after_recipe
            .iter()
            .map(|(k, &v)| Transition {
                name: k.clone(),
                before: input.recipe.get(k).copied(),
                after: Some(v),
            })
            .collect(),
        performance: predicted
            .iter()
            .map(|(k, &v)| Transition {
                name: k.clone(),
                before: input.performance.get(k).copied(),
                after: Some(v),
            })
            .collect(),
        breaches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::window::WindowBounds;

    fn map(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_simulation() {
        let mut window = ProcessWindow::new();
        window.insert("rf_power".into(), WindowBounds::new(500.0, 650.0));
        let input = SimulationInput {
            recipe: map(&[("rf_power", 600.0), ("pressure", 10.0)]),
            performance: map(&[("etch_rate", 300.0)]),
            proposed: map(&[("rf_power", 680.0), ("bias", 50.0)]),
            rules: vec![
                ImpactRule {
                    description: None,
                    impact: map(&[("etch_rate", 25.0), ("uniformity", -0.5)]),
                },
                ImpactRule {
                    description: Some("bias".into()),
                    impact: map(&[("etch_rate", 5.0)]),
                },
            ],
            window: Some(window),
        };
        let r = simulate(&input);

        let rf = r.recipe.iter().find(|t| t.name == "rf_power").unwrap();
        assert_eq!((rf.before, rf.after), (Some(600.0), Some(680.0)));
        let bias = r.recipe.iter().find(|t| t.name == "bias").unwrap();
        assert_eq!(bias.before, None);

        let er = r.performance.iter().find(|t| t.name == "etch_rate").unwrap();
        assert_eq!(er.after, Some(330.0));
        let un = r.performance.iter().find(|t| t.name == "uniformity").unwrap();
        assert_eq!((un.before, un.after), (None, Some(-0.5)));

        assert_eq!(r.breaches.len(), 1);
        assert_eq!(r.breaches[0].parameter, "rf_power");
    }
}
