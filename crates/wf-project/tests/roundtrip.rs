use wf_flowsheet::CostingParameters;
use wf_project::schema::*;
use wf_project::{load_json, load_yaml, save_json, save_yaml, validate_study};
use wf_sweep::{Sampling, SweepSpec};

fn full_study() -> Study {
    let mut study = Study::new(
        "Full Train",
        FeedDef::new(10.0).solute("tds", 0.03).solute("tss", 0.01),
    );
    study.train = TrainDef {
        pretreatment: true,
        adsorption: false,
        dewatering: true,
        recycle_fraction: Some(0.25),
        use_default_removal: true,
        pump: PumpDef {
            outlet_pressure_pa: 15e5,
            efficiency: 0.75,
        },
    };
    study.costing = Some(CostingParameters::default());
    study.sweep = Some(SweepDef {
        spec: SweepSpec::default()
            .input("eff", "fs.pump.efficiency_pump", Sampling::linear(0.6, 0.9, 4))
            .output("work", "fs.pump.work_mechanical"),
        reinitialize: true,
    });
    study
}

#[test]
fn roundtrip_yaml_minimal_study() {
    let study = Study::new("Minimal", FeedDef::new(1.0).solute("tss", 0.1));
    validate_study(&study).unwrap();

    let path = std::env::temp_dir().join("wf_project_roundtrip_minimal.yaml");
    save_yaml(&path, &study).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(study, loaded);
}

#[test]
fn roundtrip_yaml_full_study() {
    let study = full_study();
    let path = std::env::temp_dir().join("wf_project_roundtrip_full.yaml");
    save_yaml(&path, &study).unwrap();
    assert_eq!(study, load_yaml(&path).unwrap());
}

#[test]
fn roundtrip_json_full_study() {
    let study = full_study();
    let path = std::env::temp_dir().join("wf_project_roundtrip_full.json");
    save_json(&path, &study).unwrap();
    assert_eq!(study, load_json(&path).unwrap());
}

#[test]
fn save_refuses_invalid_study() {
    let mut study = full_study();
    study.train.dewatering = false;
    let path = std::env::temp_dir().join("wf_project_invalid.yaml");
    assert!(save_yaml(&path, &study).is_err());
}

#[test]
fn defaults_fill_omitted_sections() {
    let yaml = "version: 1\nname: short\nfeed:\n  water_kg_s: 5.0\n  solutes:\n    - {name: tds, flow_kg_s: 0.1}\n";
    let study: Study = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(study.feed.pressure_pa, 101_325.0);
    assert_eq!(study.train, TrainDef::default());
    assert_eq!(study.train.pump.efficiency, 0.8);
    assert!(study.costing.is_none());
    assert!(study.sweep.is_none());
    validate_study(&study).unwrap();
}
