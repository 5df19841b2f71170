//! Zero-order ultrafiltration unit: solved state, conservation and report.

use wf_flowsheet::{Case, ComponentList, Database, InitializeOptions, UnitKind, initialize, unit_report};
use wf_solver::SolverOptions;

fn uf_case(solutes: &[&str], use_default_removal: bool) -> Case {
    let db = Database::embedded().unwrap();
    let mut case = Case::new("uf", ComponentList::new(solutes.iter().copied()).unwrap());
    case.add_unit("feed", UnitKind::Feed).unwrap();
    case.add_unit(
        "unit",
        UnitKind::Separator {
            tech: "ultra_filtration".into(),
        },
    )
    .unwrap();
    case.add_unit("product", UnitKind::Product).unwrap();
    case.add_unit("waste", UnitKind::Product).unwrap();
    case.connect("feed", "outlet", "unit", "inlet").unwrap();
    case.connect("unit", "treated", "product", "inlet").unwrap();
    case.connect("unit", "byproduct", "waste", "inlet").unwrap();
    case.seal().unwrap();

    case.load_parameters_from_database("unit", &db, use_default_removal)
        .unwrap();
    let mut feed = vec![("H2O".to_string(), 10.0)];
    feed.extend(solutes.iter().map(|s| (s.to_string(), 1.0)));
    case.fix_feed("feed", &feed, 101_325.0).unwrap();
    assert_eq!(case.degrees_of_freedom(), 0);

    initialize(&mut case, &InitializeOptions::default()).unwrap();
    case.calculate_scaling_factors(1e-7).unwrap();
    let status = case.solve(&SolverOptions::default(), true).unwrap();
    assert!(status.is_optimal());
    case
}

fn value(case: &Case, name: &str) -> f64 {
    case.model().eval_named(name).unwrap()
}

fn assert_close(actual: f64, expected: f64, rel: f64) {
    assert!(
        (actual - expected).abs() <= rel * expected.abs().max(1e-12),
        "expected {expected}, got {actual}"
    );
}

#[test]
fn solved_state_matches_database_performance() {
    let case = uf_case(&["eeq", "toc", "tss", "cryptosporidium"], false);

    assert_close(value(&case, "fs.unit.inlet.flow_vol"), 0.014, 1e-6);
    assert_close(value(&case, "fs.unit.treated.flow_vol"), 0.0109301, 1e-5);
    assert_close(value(&case, "fs.unit.byproduct.flow_vol"), 0.0030699, 1e-5);

    assert_close(value(&case, "fs.unit.inlet.conc_mass_comp[H2O]"), 714.2857, 1e-5);
    assert_close(value(&case, "fs.unit.treated.conc_mass_comp[eeq]"), 64.0434, 1e-5);
    assert_close(value(&case, "fs.unit.treated.conc_mass_comp[tss]"), 2.74471, 1e-5);
    assert_close(
        value(&case, "fs.unit.treated.conc_mass_comp[cryptosporidium]"),
        9.1490e-3,
        1e-4,
    );
    assert_close(value(&case, "fs.unit.byproduct.conc_mass_comp[tss]"), 315.971, 1e-5);
    assert_close(value(&case, "fs.unit.electricity"), 11.65954, 1e-5);
}

#[test]
fn mass_and_pressure_are_conserved() {
    let case = uf_case(&["eeq", "toc", "tss", "cryptosporidium"], false);
    for j in ["H2O", "eeq", "toc", "tss", "cryptosporidium"] {
        let inlet = value(&case, &format!("fs.unit.inlet.flow_mass_comp[{j}]"));
        let out = value(&case, &format!("fs.unit.treated.flow_mass_comp[{j}]"))
            + value(&case, &format!("fs.unit.byproduct.flow_mass_comp[{j}]"));
        assert!((inlet - out).abs() <= 1e-6, "{j}: {inlet} vs {out}");
    }
    let p = value(&case, "fs.unit.inlet.pressure");
    assert!((value(&case, "fs.unit.treated.pressure") - p).abs() < 1e-6);
    assert!((value(&case, "fs.unit.byproduct.pressure") - p).abs() < 1e-6);
}

#[test]
fn unit_report_layout() {
    let case = uf_case(&["eeq", "toc", "tss", "cryptosporidium"], false);
    let report = unit_report(&case, "unit").unwrap();
    // trailing spaces are part of the layout
    let expected = [
        "",
        "====================================================================================",
        "Unit : fs.unit                                                             Time: 0.0",
        "------------------------------------------------------------------------------------",
        "    Unit Performance",
        "",
        "    Variables: ",
        "",
        "    Key                              : Value   : Fixed : Bounds",
        "                  Electricity Demand :  11.660 : False : (0, None)",
        "               Electricity Intensity : 0.23134 :  True : (None, None)",
        "    Solute Removal [cryptosporidium] : 0.99990 :  True : (0, None)",
        "                Solute Removal [eeq] : 0.30000 :  True : (0, None)",
        "                Solute Removal [toc] : 0.30000 :  True : (0, None)",
        "                Solute Removal [tss] : 0.97000 :  True : (0, None)",
        "                      Water Recovery : 0.95000 :  True : (1e-08, 1.0000001)",
        "",
        "------------------------------------------------------------------------------------",
        "    Stream Table",
        "                                         Inlet    Treated  Byproduct",
        "    Volumetric Flowrate                0.014000  0.010930 0.0030699 ",
        "    Mass Concentration H2O               714.29    869.16    162.87 ",
        "    Mass Concentration eeq               71.429    64.043    97.723 ",
        "    Mass Concentration toc               71.429    64.043    97.723 ",
        "    Mass Concentration tss               71.429    2.7447    315.97 ",
        "    Mass Concentration cryptosporidium   71.429 0.0091490    325.71 ",
        "====================================================================================",
        "",
    ]
    .join("\n");
    assert_eq!(report, expected);
}

#[test]
fn default_removal_covers_unlisted_solutes() {
    let case = uf_case(&["eeq", "toc", "tss", "cryptosporidium", "foo"], true);

    assert_close(value(&case, "fs.unit.inlet.flow_vol"), 0.015, 1e-6);
    assert_close(value(&case, "fs.unit.treated.flow_vol"), 0.01193, 1e-4);
    assert_close(value(&case, "fs.unit.inlet.conc_mass_comp[H2O]"), 666.667, 1e-5);
    assert_close(value(&case, "fs.unit.treated.conc_mass_comp[eeq]"), 58.6751, 1e-4);
    assert_close(value(&case, "fs.unit.treated.conc_mass_comp[tss]"), 2.51465, 1e-4);
    assert_close(
        value(&case, "fs.unit.treated.conc_mass_comp[cryptosporidium]"),
        8.3822e-3,
        1e-4,
    );
    assert_close(value(&case, "fs.unit.treated.conc_mass_comp[foo]"), 83.8216, 1e-4);
    assert_close(value(&case, "fs.unit.electricity"), 12.49236, 1e-5);
    assert_eq!(
        case.model()
            .value(case.model().var_id("fs.unit.removal_frac_mass_solute[foo]").unwrap()),
        Some(0.0)
    );

    let report = unit_report(&case, "unit").unwrap();
    assert!(report.contains("Solute Removal [foo] :  0.0000 :  True : (0, None)"));
    assert!(report.contains("Mass Concentration foo"));
}
