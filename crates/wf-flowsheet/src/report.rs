//! Fixed-width unit reports.
//!
//! Layout follows the established report format of the toolkit: a
//! performance table (key, value, fixed flag, bounds) and a stream table of
//! volumetric flow and mass concentrations per port. Numbers use five
//! significant figures with trailing zeros kept.

use std::fmt::Write as _;

use wf_model::{Handle, Model};

use crate::case::Case;
use crate::costing::CostingSummary;
use crate::error::FlowsheetResult;
use crate::stream::StreamState;
use crate::unit::Unit;

const WIDTH: usize = 84;
const TAB: &str = "    ";

/// Format with `digits` significant figures, keeping trailing zeros and
/// switching to exponent notation outside `1e-4 <= |v| < 10^digits`.
pub fn format_significant(v: f64, digits: usize) -> String {
    let digits = digits.max(1);
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if v == 0.0 {
        return format!("{:.*}", digits - 1, v);
    }

    let sci = format!("{:.*e}", digits - 1, v);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((&sci, "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    if exp < -4 || exp >= digits as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exp.abs());
    }
    let decimals = (digits as i32 - 1 - exp) as usize;
    let fixed = format!("{v:.decimals$}");
    if decimals == 0 { fixed + "." } else { fixed }
}

/// Shortest round-trip rendering of a bound; integral values print bare.
fn format_bound(bound: Option<f64>) -> String {
    let Some(v) = bound else {
        return "None".to_string();
    };
    if v.fract() == 0.0 && v.abs() < 1e16 {
        return format!("{}", v as i64);
    }
    let a = v.abs();
    if (1e-4..1e16).contains(&a) {
        return format!("{v}");
    }
    let sci = format!("{v:e}");
    match sci.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        None => sci,
    }
}

/// Center `s` in `width` columns; odd padding goes right unless the
/// width is odd.
fn center(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        return s.to_string();
    }
    let pad = width - len;
    let left = pad / 2 + (pad & width & 1);
    format!("{}{}{}", " ".repeat(left), s, " ".repeat(pad - left))
}

fn title_case(name: &str) -> String {
    name.split('_')
        .map(|w| {
            let mut c = w.chars();
            match c.next() {
                Some(first) => first.to_uppercase().chain(c).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn performance_table(unit: &Unit, model: &Model) -> Vec<String> {
    let mut rows: Vec<[String; 4]> = unit
        .performance
        .iter()
        .map(|p| {
            let var = model.var(p.var);
            [
                p.label.clone(),
                var.value
                    .map(|v| format_significant(v, 5))
                    .unwrap_or_else(|| "None".to_string()),
                if var.fixed { "True" } else { "False" }.to_string(),
                format!("({}, {})", format_bound(var.lower), format_bound(var.upper)),
            ]
        })
        .collect();
    rows.sort_by(|a, b| a[0].cmp(&b[0]));

    let header = ["Key", "Value", "Fixed", "Bounds"];
    let width = |i: usize| {
        rows.iter()
            .map(|r| r[i].len())
            .chain(std::iter::once(header[i].len()))
            .max()
            .unwrap_or(0)
    };
    let (wk, wv, wf) = (width(0), width(1), width(2));

    let mut lines = vec![format!(
        "{:<wk$} : {:<wv$} : {:<wf$} : {}",
        header[0], header[1], header[2], header[3]
    )];
    for r in &rows {
        lines.push(format!(
            "{:>wk$} : {:>wv$} : {:>wf$} : {}",
            r[0], r[1], r[2], r[3]
        ));
    }
    lines
}

fn stream_value(model: &Model, handle: Handle) -> String {
    model
        .eval_handle(handle)
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| format_significant(v, 5))
        .unwrap_or_else(|| "-".to_string())
}

/// Stream table with labels left-aligned and one column per port.
///
/// Cells are right-aligned to the widest cell of their column, then the
/// column (header prefixed by a space) is centered on its final width.
fn stream_table(case: &Case, unit: &Unit) -> Vec<String> {
    let model = case.model();
    let mut labels = vec!["Volumetric Flowrate".to_string()];
    labels.extend(
        case.components()
            .names()
            .map(|j| format!("Mass Concentration {j}")),
    );

    let column = |state: &StreamState| -> Vec<String> {
        std::iter::once(Handle::Expr(state.flow_vol))
            .chain(state.conc_mass_comp.iter().map(|&e| Handle::Expr(e)))
            .map(|h| stream_value(model, h))
            .collect()
    };

    let mut columns: Vec<(String, Vec<String>)> = Vec::new();
    for port in &unit.ports {
        let cells = column(&port.state);
        let cell_width = cells.iter().map(String::len).max().unwrap_or(0);
        let header = format!(" {}", title_case(&port.name));
        let width = cell_width.max(header.len());
        let cells = cells
            .iter()
            .map(|c| center(&format!("{c:>cell_width$}"), width))
            .collect();
        columns.push((center(&header, width), cells));
    }

    let label_width = labels.iter().map(String::len).max().unwrap_or(0);
    let mut header = " ".repeat(label_width);
    for (h, _) in &columns {
        header.push(' ');
        header.push_str(h);
    }
    let mut lines = vec![header];
    for (i, label) in labels.iter().enumerate() {
        let mut line = format!("{label:<label_width$}");
        for (_, cells) in &columns {
            line.push(' ');
            line.push_str(&cells[i]);
        }
        lines.push(line);
    }
    lines
}

/// Render the report of one unit.
pub fn unit_report(case: &Case, unit: &str) -> FlowsheetResult<String> {
    let unit = case.unit(unit)?;
    let model = case.model();
    let mut out = String::new();

    let lead = format!("Unit : {}", unit.path());
    let trail = "Time: 0.0";
    let pad = WIDTH.saturating_sub(lead.len() + trail.len()).max(1);
    let _ = write!(out, "\n{}\n{lead}{}{trail}", "=".repeat(WIDTH), " ".repeat(pad));
    let _ = write!(out, "\n{}\n{TAB}Unit Performance\n\n", "-".repeat(WIDTH));
    if !unit.performance.is_empty() {
        let _ = write!(out, "{TAB}Variables: \n\n");
        for line in performance_table(unit, model) {
            let _ = writeln!(out, "{TAB}{line}");
        }
    }
    let _ = write!(out, "\n{}\n{TAB}Stream Table\n", "-".repeat(WIDTH));
    let table: Vec<String> = stream_table(case, unit)
        .into_iter()
        .map(|l| format!("{TAB}{l}"))
        .collect();
    out.push_str(&table.join("\n"));
    let _ = writeln!(out, "\n{}", "=".repeat(WIDTH));
    Ok(out)
}

/// Key/value listing of the system costing indicators.
pub fn costing_report(summary: &CostingSummary) -> String {
    let rows = [
        ("Capital Cost Total [USD]", summary.capital_cost_total),
        ("Investment Cost Total [USD]", summary.investment_cost_total),
        ("Operating Cost MLC [USD/yr]", summary.operating_cost_mlc),
        ("Operating Cost Total [USD/yr]", summary.operating_cost_total),
        ("Electricity [kW]", summary.electricity_total),
        ("Annual Water Production [m3/yr]", summary.annual_water_production),
        ("LCOW [USD/m3]", summary.lcow),
        ("Specific Energy [kWh/m3]", summary.specific_energy_consumption),
        ("System Recovery", summary.system_recovery),
    ];
    let wk = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let mut out = format!("{}\nSystem Costing\n{}\n", "=".repeat(WIDTH), "-".repeat(WIDTH));
    for (k, v) in rows {
        let _ = writeln!(out, "{TAB}{k:>wk$} : {}", format_significant(v, 5));
    }
    out.push_str(&"=".repeat(WIDTH));
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn significant_figures_keep_trailing_zeros() {
        assert_eq!(format_significant(11.65979, 5), "11.660");
        assert_eq!(format_significant(0.23134, 5), "0.23134");
        assert_eq!(format_significant(0.9999, 5), "0.99990");
        assert_eq!(format_significant(0.014, 5), "0.014000");
        assert_eq!(format_significant(0.0030699, 5), "0.0030699");
        assert_eq!(format_significant(714.2857, 5), "714.29");
        assert_eq!(format_significant(0.0, 5), "0.0000");
        assert_eq!(format_significant(2.60595e-7, 5), "2.6059e-07");
        assert_eq!(format_significant(123456.7, 5), "1.2346e+05");
        assert_eq!(format_significant(12345.6, 5), "12346.");
        assert_eq!(format_significant(-0.5, 5), "-0.50000");
    }

    #[test]
    fn bounds_render_like_literals() {
        assert_eq!(format_bound(None), "None");
        assert_eq!(format_bound(Some(0.0)), "0");
        assert_eq!(format_bound(Some(1e-8)), "1e-08");
        assert_eq!(format_bound(Some(1.0000001)), "1.0000001");
        assert_eq!(format_bound(Some(2.5e20)), "2.5e+20");
    }

    #[test]
    fn centering_matches_column_layout() {
        assert_eq!(center(" Inlet", 8), "  Inlet ");
        assert_eq!(center(" Treated", 9), "  Treated");
        assert_eq!(center("0.0030699", 10), "0.0030699 ");
        assert_eq!(center("wide", 2), "wide");
    }

    #[test]
    fn port_titles() {
        assert_eq!(title_case("byproduct"), "Byproduct");
        assert_eq!(title_case("waste_mixer"), "Waste Mixer");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn significant_figures_parse_back(v in 1e-8_f64..1e12) {
            let text = format_significant(v, 5);
            let parsed: f64 = text.parse().unwrap();
            prop_assert!(((parsed - v) / v).abs() <= 6e-5);
        }
    }
}
