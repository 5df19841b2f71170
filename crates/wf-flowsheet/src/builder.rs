//! Treatment-train builder.
//!
//! Assembles the standard train
//!
//! ```text
//! feed -> [feed_mixer] -> [pretreatment] -> ultrafiltration -> [adsorption]
//!      -> pump -> ro -> product
//!                    \-> brine
//! byproducts -> waste_mixer -> [dewatering -> sludge
//!                                          \-> [recycle_splitter -> feed_mixer]
//!                                                                -> centrate]
//!                           \-> waste
//! ```
//!
//! and specifies it to zero degrees of freedom: separator performance from
//! the database, feed state, pump outlet pressure and efficiency, and the
//! recycle split fraction.

use tracing::info;
use wf_core::{MassRate, Pressure};

use crate::case::Case;
use crate::database::Database;
use crate::error::{FlowsheetError, FlowsheetResult};
use crate::stream::{ComponentList, WATER};
use crate::unit::UnitKind;

pub const FEED: &str = "feed";
pub const FEED_MIXER: &str = "feed_mixer";
pub const PRETREATMENT: &str = "pretreatment";
pub const ULTRAFILTRATION: &str = "ultrafiltration";
pub const ADSORPTION: &str = "adsorption";
pub const PUMP: &str = "pump";
pub const RO: &str = "ro";
pub const PRODUCT: &str = "product";
pub const BRINE: &str = "brine";
pub const WASTE_MIXER: &str = "waste_mixer";
pub const DEWATERING: &str = "dewatering";
pub const SLUDGE: &str = "sludge";
pub const RECYCLE_SPLITTER: &str = "recycle_splitter";
pub const CENTRATE: &str = "centrate";
pub const WASTE: &str = "waste";

#[derive(Debug, Clone, PartialEq)]
pub struct FeedSpec {
    /// Mass flow per component, water included.
    pub flow_mass_comp: Vec<(String, MassRate)>,
    pub pressure: Pressure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PumpSpec {
    pub outlet_pressure: Pressure,
    pub efficiency: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub feed: FeedSpec,
    pub pump: PumpSpec,
    /// Media filtration ahead of ultrafiltration.
    pub pretreatment: bool,
    /// GAC after ultrafiltration.
    pub adsorption: bool,
    /// Centrifuge on the combined byproduct stream.
    pub dewatering: bool,
    /// Fraction of centrate returned to the feed; needs `dewatering`.
    pub recycle: Option<f64>,
    pub use_default_removal: bool,
}

impl TrainConfig {
    pub fn validate(&self) -> FlowsheetResult<()> {
        let config = |what: String| Err(FlowsheetError::Config { what });
        if let Some(r) = self.recycle {
            if !self.dewatering {
                return config("recycle needs the dewatering stage".to_string());
            }
            if !(0.0..=1.0).contains(&r) {
                return config(format!("recycle fraction {r} is outside [0, 1]"));
            }
        }
        if !(self.pump.efficiency > 0.0 && self.pump.efficiency <= 1.0) {
            return config(format!(
                "pump efficiency {} is outside (0, 1]",
                self.pump.efficiency
            ));
        }
        for (name, flow) in &self.feed.flow_mass_comp {
            if !flow.value.is_finite() || flow.value < 0.0 {
                return config(format!("feed flow of '{name}' must be non-negative"));
            }
        }
        Ok(())
    }

    /// Solutes named by the feed, in feed order.
    pub fn components(&self) -> FlowsheetResult<ComponentList> {
        ComponentList::new(
            self.feed
                .flow_mass_comp
                .iter()
                .map(|(name, _)| name.as_str())
                .filter(|name| *name != WATER),
        )
    }
}

/// Separators of the train with their technology, in flow order.
fn separators(config: &TrainConfig) -> Vec<(&'static str, &'static str)> {
    let mut list = Vec::new();
    if config.pretreatment {
        list.push((PRETREATMENT, "media_filtration"));
    }
    list.push((ULTRAFILTRATION, "ultra_filtration"));
    if config.adsorption {
        list.push((ADSORPTION, "gac"));
    }
    list.push((RO, "reverse_osmosis"));
    if config.dewatering {
        list.push((DEWATERING, "centrifuge"));
    }
    list
}

/// Build a sealed, fully specified case for `config`.
pub fn build_case(name: &str, config: &TrainConfig, db: &Database) -> FlowsheetResult<Case> {
    let mut case = Case::new(name, config.components()?);
    build_flowsheet(&mut case, config, db)?;
    Ok(case)
}

/// Add the train to an empty, unsealed case, seal it and specify it.
pub fn build_flowsheet(case: &mut Case, config: &TrainConfig, db: &Database) -> FlowsheetResult<()> {
    config.validate()?;
    let separator = |tech: &str| UnitKind::Separator {
        tech: tech.to_string(),
    };

    // main line
    case.add_unit(FEED, UnitKind::Feed)?;
    let mut upstream = FEED;
    if config.recycle.is_some() {
        case.add_unit(
            FEED_MIXER,
            UnitKind::Mixer {
                inlets: vec!["feed".to_string(), "recycle".to_string()],
            },
        )?;
        case.connect(FEED, "outlet", FEED_MIXER, "feed")?;
        upstream = FEED_MIXER;
    }
    let mut upstream_port = "outlet";
    let mut byproducts = Vec::new();
    for (unit, tech) in separators(config)
        .into_iter()
        .filter(|(u, _)| *u != RO && *u != DEWATERING)
    {
        case.add_unit(unit, separator(tech))?;
        case.connect(upstream, upstream_port, unit, "inlet")?;
        byproducts.push(unit);
        upstream = unit;
        upstream_port = "treated";
    }
    case.add_unit(PUMP, UnitKind::Pump)?;
    case.connect(upstream, upstream_port, PUMP, "inlet")?;
    case.add_unit(RO, separator("reverse_osmosis"))?;
    case.connect(PUMP, "outlet", RO, "inlet")?;
    case.add_unit(PRODUCT, UnitKind::Product)?;
    case.connect(RO, "treated", PRODUCT, "inlet")?;
    case.add_unit(BRINE, UnitKind::Product)?;
    case.connect(RO, "byproduct", BRINE, "inlet")?;

    // waste line
    case.add_unit(
        WASTE_MIXER,
        UnitKind::Mixer {
            inlets: byproducts.iter().map(|u| u.to_string()).collect(),
        },
    )?;
    for unit in &byproducts {
        case.connect(unit, "byproduct", WASTE_MIXER, unit)?;
    }
    if config.dewatering {
        case.add_unit(DEWATERING, separator("centrifuge"))?;
        case.connect(WASTE_MIXER, "outlet", DEWATERING, "inlet")?;
        case.add_unit(SLUDGE, UnitKind::Product)?;
        case.connect(DEWATERING, "byproduct", SLUDGE, "inlet")?;
        case.add_unit(CENTRATE, UnitKind::Product)?;
        if config.recycle.is_some() {
            case.add_unit(
                RECYCLE_SPLITTER,
                UnitKind::Splitter {
                    outlets: vec!["recycle".to_string(), "purge".to_string()],
                },
            )?;
            case.connect(DEWATERING, "treated", RECYCLE_SPLITTER, "inlet")?;
            case.connect(RECYCLE_SPLITTER, "purge", CENTRATE, "inlet")?;
            case.connect_tear(RECYCLE_SPLITTER, "recycle", FEED_MIXER, "recycle")?;
        } else {
            case.connect(DEWATERING, "treated", CENTRATE, "inlet")?;
        }
    } else {
        case.add_unit(WASTE, UnitKind::Product)?;
        case.connect(WASTE_MIXER, "outlet", WASTE, "inlet")?;
    }
    case.seal()?;

    // specification
    for (unit, _) in separators(config) {
        case.load_parameters_from_database(unit, db, config.use_default_removal)?;
    }
    let feed: Vec<(String, f64)> = config
        .feed
        .flow_mass_comp
        .iter()
        .map(|(name, flow)| (name.clone(), flow.value))
        .collect();
    case.fix_feed(FEED, &feed, config.feed.pressure.value)?;
    case.fix("fs.pump.outlet.pressure", config.pump.outlet_pressure.value)?;
    case.fix("fs.pump.efficiency_pump", config.pump.efficiency)?;
    if let Some(r) = config.recycle {
        case.fix("fs.recycle_splitter.split_fraction[recycle]", r)?;
    }

    info!(
        case = %case.name(),
        units = case.units().len(),
        dof = case.degrees_of_freedom(),
        "built treatment train"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wf_core::{bar, kgps, pa};

    fn config() -> TrainConfig {
        TrainConfig {
            feed: FeedSpec {
                flow_mass_comp: vec![
                    ("H2O".into(), kgps(10.0)),
                    ("tds".into(), kgps(0.05)),
                    ("tss".into(), kgps(0.01)),
                ],
                pressure: pa(101_325.0),
            },
            pump: PumpSpec {
                outlet_pressure: bar(20.0),
                efficiency: 0.8,
            },
            pretreatment: false,
            adsorption: false,
            dewatering: false,
            recycle: None,
            use_default_removal: false,
        }
    }

    #[test]
    fn minimal_train_is_square() {
        let case = build_case("min", &config(), &Database::embedded().unwrap()).unwrap();
        assert!(case.is_sealed());
        assert_eq!(case.degrees_of_freedom(), 0);
        assert!(case.unit(WASTE).is_ok());
        assert!(case.unit(FEED_MIXER).is_err());
    }

    #[test]
    fn full_train_with_recycle_is_square() {
        let mut cfg = config();
        cfg.pretreatment = true;
        cfg.adsorption = true;
        cfg.dewatering = true;
        cfg.recycle = Some(0.5);
        let case = build_case("full", &cfg, &Database::embedded().unwrap()).unwrap();
        assert_eq!(case.degrees_of_freedom(), 0);
        assert_eq!(case.graph().unwrap().tear_arcs().count(), 1);
        let mixer = case.unit(WASTE_MIXER).unwrap();
        assert_eq!(mixer.inlets().count(), 3);
    }

    #[test]
    fn recycle_needs_dewatering() {
        let mut cfg = config();
        cfg.recycle = Some(0.5);
        assert!(matches!(cfg.validate(), Err(FlowsheetError::Config { .. })));
        cfg.dewatering = true;
        cfg.recycle = Some(1.5);
        assert!(matches!(cfg.validate(), Err(FlowsheetError::Config { .. })));
    }

    #[test]
    fn missing_solute_without_default() {
        let mut cfg = config();
        cfg.feed.flow_mass_comp.push(("foo".into(), kgps(0.01)));
        let err = build_case("foo", &cfg, &Database::embedded().unwrap()).unwrap_err();
        assert_eq!(
            err,
            FlowsheetError::MissingSolute {
                tech: "ultra_filtration".into(),
                solute: "foo".into()
            }
        );
    }
}
