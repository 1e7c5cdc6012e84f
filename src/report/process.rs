//! Reports for measurement analysis: SPC, trend, FMEA risk and window checks

use super::{metric, num, opt_num, opt_plain, plain, range, signed, with_unit, Report, NOT_GIVEN};
use crate::analysis::fmea::{ActionPriority, RiskAssessment};
use crate::analysis::spc::{SpcAdvisory, SpcResult, SpecLimits, TREND_RUN_LENGTH};
use crate::analysis::trend::TrendResult;
use crate::analysis::window::{WindowStatus, WindowValidation};
use crate::analysis::Metric;

/// Violations listed individually; the count always covers all of them
pub const MAX_LISTED_VIOLATIONS: usize = 5;

/// Risk factors listed in the ranking section
pub const MAX_RANKED_FACTORS: usize = 5;

/// Conventional reading of a Cpk/Ppk value
pub fn capability_label(index: &Metric) -> &'static str {
    match index.value() {
        None => "not assessable",
        Some(v) if v >= 1.67 => "excellent",
        Some(v) if v >= 1.33 => "capable",
        Some(v) if v >= 1.0 => "marginal",
        Some(_) => "not capable",
    }
}

fn advisory_text(advisory: &SpcAdvisory) -> String {
    match advisory {
        SpcAdvisory::SmallSample { n } => format!(
            "Only {} samples; capability indices are unreliable below 25",
            n
        ),
        SpcAdvisory::NormalityConcern => {
            "Distribution looks non-normal; treat Cp/Cpk with caution".to_string()
        }
        SpcAdvisory::MonotonicRun { length } => format!(
            "{} consecutive points moving in one direction (trend rule: {} or more)",
            length, TREND_RUN_LENGTH
        ),
        SpcAdvisory::IncompleteSubgroup { discarded } => format!(
            "{} trailing sample(s) did not fill a subgroup and were left out of the limits",
            discarded
        ),
    }
}

pub struct SpcContext<'a> {
    pub parameter: Option<&'a str>,
    pub equipment: Option<&'a str>,
    pub spec: &'a SpecLimits,
}

pub fn spc(result: &SpcResult, ctx: &SpcContext<'_>) -> Report {
    let mut r = Report::new("📊 SPC analysis");
    r.field("Parameter", ctx.parameter.unwrap_or(NOT_GIVEN))
        .field("Equipment", ctx.equipment.unwrap_or(NOT_GIVEN))
        .field("Samples", result.n);

    r.section("Summary statistics").table(
        &["Statistic", "Value"],
        vec![
            vec!["Mean".into(), num(result.mean, 4)],
            vec!["Min / Max".into(), format!("{} / {}", num(result.min, 4), num(result.max, 4))],
            vec!["σ overall (population)".into(), num(result.sigma_overall, 4)],
            vec!["σ within".into(), num(result.sigma_within, 4)],
            vec!["USL / LSL".into(), format!("{} / {}", opt_plain(ctx.spec.usl), opt_plain(ctx.spec.lsl))],
            vec!["Target".into(), opt_plain(ctx.spec.target)],
        ],
    );

    r.section(&format!("Control limits ({})", result.limits_source))
        .field("UCL", num(result.limits.ucl, 4))
        .field("CL", num(result.limits.cl, 4))
        .field("LCL", num(result.limits.lcl, 4));

    r.section("Process capability").table(
        &["Index", "Value", "Sigma", "Reading"],
        vec![
            vec!["Cp".into(), metric(&result.cp, 2), "within".into(), "-".into()],
            vec![
                "Cpk".into(),
                metric(&result.cpk, 2),
                "within".into(),
                capability_label(&result.cpk).into(),
            ],
            vec!["Pp".into(), metric(&result.pp, 2), "overall".into(), "-".into()],
            vec![
                "Ppk".into(),
                metric(&result.ppk, 2),
                "overall".into(),
                capability_label(&result.ppk).into(),
            ],
        ],
    );

    r.section("Control status");
    if result.violations.is_empty() {
        r.bullet("No samples outside the control limits");
    } else {
        r.bullet(format!(
            "{} sample(s) outside the control limits",
            result.violations.len()
        ));
        for v in result.violations.iter().take(MAX_LISTED_VIOLATIONS) {
            r.text(format!(
                "  - sample #{}: {} ({})",
                v.position,
                plain(v.value),
                if v.above { "above UCL" } else { "below LCL" }
            ));
        }
        if result.violations.len() > MAX_LISTED_VIOLATIONS {
            r.text(format!(
                "  - … {} more",
                result.violations.len() - MAX_LISTED_VIOLATIONS
            ));
        }
    }
    r.bullet(format!("Longest monotonic run: {} point(s)", result.longest_run));

    r.section("Normality check");
    if result.normality.checked() {
        r.field("Skewness", opt_num(result.normality.skewness, 3))
            .field("Excess kurtosis", opt_num(result.normality.excess_kurtosis, 3))
            .field(
                "Verdict",
                if result.normality.concern() {
                    "normality concern"
                } else {
                    "no concern"
                },
            );
    } else {
        r.bullet("Not enough samples to assess skewness or kurtosis");
    }

    if !result.advisories.is_empty() {
        r.section("Advisories");
        for a in &result.advisories {
            r.bullet(advisory_text(a));
        }
    }

    r.section("Recommendations")
        .bullet("Trace back any out-of-control interval and re-measure")
        .bullet("Cross-check outlying samples against equipment, material and recipe history")
        .bullet("Capability indices assume a stable, normally distributed process");
    r
}

pub fn trend(result: &TrendResult, parameter: &str) -> Report {
    let mut r = Report::new(&format!("📈 Trend analysis: {}", parameter));
    r.field("Samples", result.n)
        .field("Mean", num(result.mean, 4))
        .field("Std dev (sample)", num(result.std_dev, 4))
        .field("Range", format!("{} – {}", num(result.min, 4), num(result.max, 4)));
    if let Some(count) = result.spec_violations {
        r.field("Spec violations", count);
    }

    if let Some(reg) = &result.regression {
        r.section("Linear regression")
            .field("Slope (per point)", signed(reg.fit.slope, 4))
            .field("Intercept", num(reg.fit.intercept, 4))
            .field("R²", num(reg.fit.r_squared, 4))
            .field(
                "t-statistic",
                format!("{} (critical {})", num(reg.t_statistic, 2), reg.critical_t),
            )
            .field("Significant", if reg.significant { "yes" } else { "no" });
    }

    if let Some(mk) = &result.mann_kendall {
        r.section("Mann-Kendall test")
            .field("S", mk.s)
            .field("Var(S)", num(mk.variance, 2))
            .field("Z", num(mk.z, 3))
            .field("Direction", mk.direction());
    }

    if let Some(shift) = &result.shift {
        r.section("Mean shift")
            .field("First half mean", opt_num(shift.first_mean, 4))
            .field("Second half mean", opt_num(shift.second_mean, 4))
            .field(
                "Shift size",
                shift
                    .size
                    .map_or_else(|| "N/A (zero standard deviation)".to_string(), |s| {
                        format!("{}σ", signed(s, 2))
                    }),
            )
            .field("Classification", shift.class);
    }

    r.section("Forecast");
    if result.forecast.is_empty() {
        r.bullet("Forecast not requested");
    } else {
        r.table(
            &["Index", "Predicted"],
            result
                .forecast
                .iter()
                .map(|(i, v)| vec![i.to_string(), num(*v, 4)])
                .collect(),
        );
    }

    r.section("Conclusion")
        .field("Assessment", result.conclusion.label())
        .field("Recommendation", result.conclusion.recommendation())
        .bullet("Regression, Mann-Kendall and shift are independent signals");
    r
}

pub fn risk(assessment: &RiskAssessment) -> Report {
    let mut r = Report::new("🔮 Defect risk assessment (FMEA)");
    r.field(
        "Overall",
        format!(
            "{}, {}",
            assessment.overall.label(),
            assessment.overall.action()
        ),
    )
    .field(
        "Max RPN",
        assessment
            .max_rpn()
            .map_or_else(|| "-".to_string(), |v| v.to_string()),
    )
    .field(
        "Action priority",
        format!(
            "H {} / M {} / L {}",
            assessment.count(ActionPriority::High),
            assessment.count(ActionPriority::Medium),
            assessment.count(ActionPriority::Low)
        ),
    );

    let rows = assessment
        .factors
        .iter()
        .map(|f| {
            let mut notes = Vec::new();
            if f.critical {
                notes.push("critical".to_string());
            }
            if let Some(c) = f.correlation {
                notes.push(format!("history {}", c));
            }
            vec![
                f.parameter.clone(),
                with_unit(plain(f.value), f.unit.as_deref()),
                range(Some(f.min), Some(f.max)),
                f.severity.to_string(),
                f.occurrence.to_string(),
                f.detection.to_string(),
                f.rpn.to_string(),
                f.priority.to_string(),
                f.basis.to_string(),
                if notes.is_empty() { "-".into() } else { notes.join(", ") },
            ]
        })
        .collect();
    r.section("Risk table").table(
        &["Parameter", "Current", "Window", "S", "O", "D", "RPN", "AP", "Occurrence basis", "Notes"],
        rows,
    );

    if !assessment.skipped.is_empty() {
        r.section("Not scored");
        for (p, reason) in &assessment.skipped {
            r.bullet(format!("{}: {}", p, reason));
        }
    }

    r.section("Risk ranking");
    r.numbered(
        assessment
            .ranked()
            .into_iter()
            .take(MAX_RANKED_FACTORS)
            .map(|f| format!("{}: RPN {} (AP {})", f.parameter, f.rpn, f.priority)),
    );
    if assessment.factors.is_empty() {
        r.bullet("No parameter could be scored");
    }

    r.section("Preventive actions")
        .bullet("Adjust AP H parameters first, then the highest RPN")
        .bullet("Keep critical parameters well inside the window and monitor them closely")
        .bullet("Ratings default to 5 where none were given; supply S/O/D for a sharper ranking");
    r
}

pub fn window(validation: &WindowValidation) -> Report {
    let mut r = Report::new("✔️ Process window validation");
    r.field(
        "Result",
        if validation.all_pass() {
            "all parameters PASS"
        } else {
            "some parameters FAIL"
        },
    );

    let rows = validation
        .checks
        .iter()
        .map(|c| {
            let unit = c.bounds.unit.as_deref();
            vec![
                if c.critical {
                    format!("{} (critical)", c.parameter)
                } else {
                    c.parameter.clone()
                },
                c.value
                    .map_or_else(|| "-".to_string(), |v| with_unit(plain(v), unit)),
                with_unit(range(c.bounds.min, c.bounds.max), unit),
                num(c.margin, 2),
                c.status.to_string(),
            ]
        })
        .collect();
    r.table(&["Parameter", "Value", "Allowed range", "Margin", "Result"], rows);

    r.section("At-risk parameters");
    let mut alerts: Vec<String> = validation
        .critical_alerts()
        .map(|c| match c.value {
            Some(v) => format!(
                "Critical parameter {}: {} (range {})",
                c.parameter,
                plain(v),
                range(c.bounds.min, c.bounds.max)
            ),
            None => format!("Critical parameter {}: value not provided", c.parameter),
        })
        .collect();
    alerts.extend(
        validation
            .checks
            .iter()
            .filter(|c| !c.critical && c.status == WindowStatus::NotProvided)
            .map(|c| format!("{}: value not provided", c.parameter)),
    );
    r.bullets(alerts, "No deviations");

    r.section("Recommendations")
        .bullet("Adjust FAIL parameters and validate again")
        .bullet("Bring critical parameters back first");
    r
}
