//! Case database: default performance and costing parameters per technology.
//!
//! Entries ship embedded in the crate (`data/techs/<tech>.yaml`); a directory
//! of YAML files with the same layout can replace them.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FlowsheetError, FlowsheetResult};

const EMBEDDED: &[(&str, &str)] = &[
    ("centrifuge", include_str!("../data/techs/centrifuge.yaml")),
    ("gac", include_str!("../data/techs/gac.yaml")),
    (
        "media_filtration",
        include_str!("../data/techs/media_filtration.yaml"),
    ),
    (
        "reverse_osmosis",
        include_str!("../data/techs/reverse_osmosis.yaml"),
    ),
    (
        "ultra_filtration",
        include_str!("../data/techs/ultra_filtration.yaml"),
    ),
];

/// A parameter value with its unit label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamEntry {
    pub value: f64,
    pub units: String,
}

/// Power-law capital cost `a * (Q / Q_ref)^b`, with Q in m^3/hr.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalCostParameters {
    pub capital_a_parameter: ParamEntry,
    pub capital_b_parameter: ParamEntry,
    pub reference_state: ParamEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechParameters {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "recovery_frac_mass_H2O")]
    pub recovery_frac_mass_h2o: ParamEntry,
    pub energy_electric_flow_vol_inlet: ParamEntry,
    #[serde(default)]
    pub removal_frac_mass_solute: BTreeMap<String, ParamEntry>,
    #[serde(default)]
    pub default_removal_frac_mass_solute: Option<ParamEntry>,
    #[serde(default)]
    pub capital_cost: Option<CapitalCostParameters>,
    /// Design permeate flux for membrane technologies.
    #[serde(default)]
    pub flux_vol_permeate: Option<ParamEntry>,
}

impl TechParameters {
    /// Removal fraction for `solute`.
    ///
    /// Solutes without an entry fall back to the default removal fraction
    /// only when `use_default_removal` is set.
    pub fn removal_for(&self, solute: &str, use_default_removal: bool) -> FlowsheetResult<f64> {
        if let Some(entry) = self.removal_frac_mass_solute.get(solute) {
            return Ok(entry.value);
        }
        if !use_default_removal {
            return Err(FlowsheetError::MissingSolute {
                tech: self.name.clone(),
                solute: solute.to_string(),
            });
        }
        self.default_removal_frac_mass_solute
            .as_ref()
            .map(|e| e.value)
            .ok_or_else(|| FlowsheetError::MissingParameter {
                tech: self.name.clone(),
                param: "default_removal_frac_mass_solute".to_string(),
            })
    }

    /// Flat `name -> {value, units}` view, indexed names as `param[index]`.
    pub fn entries(&self) -> BTreeMap<String, ParamEntry> {
        let mut out = BTreeMap::new();
        out.insert(
            "recovery_frac_mass_H2O".to_string(),
            self.recovery_frac_mass_h2o.clone(),
        );
        out.insert(
            "energy_electric_flow_vol_inlet".to_string(),
            self.energy_electric_flow_vol_inlet.clone(),
        );
        for (solute, entry) in &self.removal_frac_mass_solute {
            out.insert(format!("removal_frac_mass_solute[{solute}]"), entry.clone());
        }
        if let Some(entry) = &self.default_removal_frac_mass_solute {
            out.insert("default_removal_frac_mass_solute".to_string(), entry.clone());
        }
        if let Some(cost) = &self.capital_cost {
            out.insert("capital_a_parameter".to_string(), cost.capital_a_parameter.clone());
            out.insert("capital_b_parameter".to_string(), cost.capital_b_parameter.clone());
            out.insert("reference_state".to_string(), cost.reference_state.clone());
        }
        if let Some(entry) = &self.flux_vol_permeate {
            out.insert("flux_vol_permeate".to_string(), entry.clone());
        }
        out
    }
}

/// Read-only parameter store keyed by technology name.
///
/// Serializes deterministically (technologies in name order), which run ids
/// rely on.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Database {
    techs: BTreeMap<String, TechParameters>,
}

impl Database {
    /// The parameter set bundled with the crate.
    pub fn embedded() -> FlowsheetResult<Self> {
        let mut db = Self::default();
        for (tech, text) in EMBEDDED {
            db.techs.insert(tech.to_string(), parse_entry(tech, text)?);
        }
        Ok(db)
    }

    /// Load every `*.yaml` file in `dir`; the file stem is the technology name.
    pub fn from_dir(dir: &Path) -> FlowsheetResult<Self> {
        let io_err = |e: std::io::Error| FlowsheetError::DatabaseIo {
            path: dir.display().to_string(),
            message: e.to_string(),
        };
        let mut db = Self::default();
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let Some(tech) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let text = fs::read_to_string(&path).map_err(io_err)?;
            db.techs.insert(tech.to_string(), parse_entry(tech, &text)?);
        }
        Ok(db)
    }

    pub fn insert(&mut self, tech: impl Into<String>, mut params: TechParameters) {
        let tech = tech.into();
        params.name = tech.clone();
        self.techs.insert(tech, params);
    }

    pub fn technologies(&self) -> impl Iterator<Item = &str> {
        self.techs.keys().map(String::as_str)
    }

    pub fn get_unit_operation_parameters(&self, tech: &str) -> FlowsheetResult<&TechParameters> {
        self.techs
            .get(tech)
            .ok_or_else(|| FlowsheetError::UnknownTechnology {
                tech: tech.to_string(),
            })
    }
}

fn parse_entry(tech: &str, text: &str) -> FlowsheetResult<TechParameters> {
    let mut params: TechParameters =
        serde_yaml::from_str(text).map_err(|e| FlowsheetError::DatabaseParse {
            tech: tech.to_string(),
            message: e.to_string(),
        })?;
    params.name = tech.to_string();
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_entries_parse() {
        let db = Database::embedded().unwrap();
        let techs: Vec<_> = db.technologies().collect();
        assert_eq!(
            techs,
            vec![
                "centrifuge",
                "gac",
                "media_filtration",
                "reverse_osmosis",
                "ultra_filtration"
            ]
        );
    }

    #[test]
    fn ultra_filtration_defaults() {
        let db = Database::embedded().unwrap();
        let uf = db.get_unit_operation_parameters("ultra_filtration").unwrap();
        assert_eq!(uf.recovery_frac_mass_h2o.value, 0.95);
        assert_eq!(uf.energy_electric_flow_vol_inlet.value, 0.23134);
        assert_eq!(uf.removal_for("cryptosporidium", false).unwrap(), 0.9999);

        let entries = uf.entries();
        assert_eq!(entries["removal_frac_mass_solute[tss]"].value, 0.97);
        assert_eq!(entries["energy_electric_flow_vol_inlet"].units, "kWh/m^3");
    }

    #[test]
    fn missing_solute_requires_default_mode() {
        let db = Database::embedded().unwrap();
        let uf = db.get_unit_operation_parameters("ultra_filtration").unwrap();
        assert_eq!(
            uf.removal_for("foo", false).unwrap_err(),
            FlowsheetError::MissingSolute {
                tech: "ultra_filtration".into(),
                solute: "foo".into()
            }
        );
        assert_eq!(uf.removal_for("foo", true).unwrap(), 0.0);
    }

    #[test]
    fn unknown_technology() {
        let db = Database::embedded().unwrap();
        assert!(matches!(
            db.get_unit_operation_parameters("ozonation"),
            Err(FlowsheetError::UnknownTechnology { .. })
        ));
    }

    #[test]
    fn loads_directory() {
        let dir = std::env::temp_dir().join("wf_flowsheet_db_test");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("screen.yaml"),
            "recovery_frac_mass_H2O: {value: 1.0, units: dimensionless}\n\
             energy_electric_flow_vol_inlet: {value: 0.01, units: kWh/m^3}\n",
        )
        .unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let db = Database::from_dir(&dir).unwrap();
        let screen = db.get_unit_operation_parameters("screen").unwrap();
        assert_eq!(screen.name, "screen");
        assert!(screen.removal_frac_mass_solute.is_empty());
        assert_eq!(db.technologies().count(), 1);

        let _ = fs::remove_dir_all(&dir);
    }
}
