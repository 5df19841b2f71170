use std::path::Path;

#[test]
fn studies_load_and_validate() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../studies");
    let studies = [
        "treatment_train.yaml",
        "ro_pressure_sweep.yaml",
        "ro_monte_carlo.yaml",
    ];

    for name in studies {
        let path = root.join(name);
        let study = wf_project::load(&path)
            .unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
        wf_project::validate_study(&study)
            .unwrap_or_else(|e| panic!("Failed to validate {}: {}", name, e));
    }
}

#[test]
fn sweep_study_counts_samples() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../studies/ro_pressure_sweep.yaml");
    let study = wf_project::load_yaml(&path).unwrap();
    let sweep = study.sweep.expect("study declares a sweep");
    assert_eq!(sweep.spec.sample_count().unwrap(), 10);
    assert!(sweep.spec.interpolate);
    assert!(!sweep.reinitialize);
}

#[test]
fn monte_carlo_study_is_seeded_and_paired() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../studies/ro_monte_carlo.yaml");
    let study = wf_project::load_yaml(&path).unwrap();
    let sweep = study.sweep.expect("study declares a sweep");
    assert_eq!(sweep.spec.seed, Some(1));
    assert_eq!(sweep.spec.mode, wf_sweep::SampleMode::Paired);
    assert!(sweep.spec.inputs.iter().all(|f| f.sampling.is_random()));
    assert_eq!(sweep.spec.sample_count().unwrap(), 20);
    assert_eq!(sweep.spec.grid().unwrap(), sweep.spec.grid().unwrap());
}
