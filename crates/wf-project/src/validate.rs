//! Study validation logic.

use std::collections::HashSet;

use wf_flowsheet::WATER;

use crate::schema::{FeedDef, Study, TrainDef};

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid sweep: {reason}")]
    InvalidSweep { reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(field, value, "must be finite and non-negative"));
    }
    Ok(())
}

pub fn validate_study(study: &Study) -> Result<(), ValidationError> {
    if study.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: study.version,
        });
    }
    if study.name.trim().is_empty() {
        return Err(invalid("name", "", "study name must not be empty"));
    }

    validate_feed(&study.feed)?;
    validate_train(&study.train)?;

    if let Some(costing) = &study.costing {
        if !(costing.load_factor > 0.0 && costing.load_factor <= 1.0) {
            return Err(invalid(
                "costing.load_factor",
                costing.load_factor,
                "must be in (0, 1]",
            ));
        }
        non_negative("costing.factor_total_investment", costing.factor_total_investment)?;
        non_negative("costing.factor_MLC", costing.factor_mlc)?;
        non_negative(
            "costing.factor_capital_annualization",
            costing.factor_capital_annualization,
        )?;
        non_negative(
            "costing.factor_membrane_replacement",
            costing.factor_membrane_replacement,
        )?;
        non_negative("costing.electricity_cost", costing.electricity_cost)?;
        non_negative("costing.RO_mem_cost", costing.ro_mem_cost)?;
        non_negative("costing.hp_pump_cost", costing.hp_pump_cost)?;
    }

    if study.solver.max_iterations == 0 {
        return Err(invalid("solver.max_iterations", 0, "must be at least 1"));
    }
    if !(study.solver.tolerance > 0.0 && study.solver.tolerance.is_finite()) {
        return Err(invalid(
            "solver.tolerance",
            study.solver.tolerance,
            "must be positive",
        ));
    }

    if let Some(sweep) = &study.sweep {
        sweep
            .spec
            .grid()
            .map_err(|e| ValidationError::InvalidSweep {
                reason: e.to_string(),
            })?;
    }

    Ok(())
}

fn validate_feed(feed: &FeedDef) -> Result<(), ValidationError> {
    non_negative("feed.water_kg_s", feed.water_kg_s)?;
    if !(feed.pressure_pa > 0.0 && feed.pressure_pa.is_finite()) {
        return Err(invalid("feed.pressure_pa", feed.pressure_pa, "must be positive"));
    }
    if feed.solutes.is_empty() {
        return Err(invalid("feed.solutes", "[]", "at least one solute is required"));
    }

    let mut names = HashSet::new();
    for solute in &feed.solutes {
        if solute.name.is_empty() || solute.name == WATER {
            return Err(invalid(
                "feed.solutes.name",
                &solute.name,
                "solute names must be non-empty and not the solvent",
            ));
        }
        if !names.insert(&solute.name) {
            return Err(ValidationError::DuplicateId {
                id: solute.name.clone(),
                context: "feed solutes".to_string(),
            });
        }
        non_negative(&format!("feed.solutes[{}].flow_kg_s", solute.name), solute.flow_kg_s)?;
    }
    Ok(())
}

fn validate_train(train: &TrainDef) -> Result<(), ValidationError> {
    if let Some(r) = train.recycle_fraction {
        if !train.dewatering {
            return Err(invalid(
                "train.recycle_fraction",
                r,
                "recycle needs the dewatering stage",
            ));
        }
        if !(0.0..=1.0).contains(&r) {
            return Err(invalid("train.recycle_fraction", r, "must be in [0, 1]"));
        }
    }
    let pump = &train.pump;
    if !(pump.efficiency > 0.0 && pump.efficiency <= 1.0) {
        return Err(invalid("train.pump.efficiency", pump.efficiency, "must be in (0, 1]"));
    }
    if !(pump.outlet_pressure_pa > 0.0 && pump.outlet_pressure_pa.is_finite()) {
        return Err(invalid(
            "train.pump.outlet_pressure_pa",
            pump.outlet_pressure_pa,
            "must be positive",
        ));
    }
    Ok(())
}
