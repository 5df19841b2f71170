//! wf-flowsheet: water-treatment flowsheets on top of the case model.
//!
//! Provides:
//! - a parameter database of zero-order treatment technologies
//! - unit blocks (feed, separator, pump, mixer, splitter, product)
//! - the [`Case`] tying units, arcs and the model together
//! - sequential initialization with tear convergence
//! - costing expressions and fixed-width unit reports
//!
//! # Example
//!
//! ```no_run
//! use wf_flowsheet::{Case, ComponentList, Database, UnitKind, initialize, InitializeOptions};
//! use wf_solver::SolverOptions;
//!
//! let db = Database::embedded().unwrap();
//! let mut case = Case::new("uf", ComponentList::new(["tss"]).unwrap());
//! case.add_unit("feed", UnitKind::Feed).unwrap();
//! case.add_unit("unit", UnitKind::Separator { tech: "ultra_filtration".into() }).unwrap();
//! case.add_unit("product", UnitKind::Product).unwrap();
//! case.add_unit("waste", UnitKind::Product).unwrap();
//! case.connect("feed", "outlet", "unit", "inlet").unwrap();
//! case.connect("unit", "treated", "product", "inlet").unwrap();
//! case.connect("unit", "byproduct", "waste", "inlet").unwrap();
//! case.seal().unwrap();
//!
//! case.load_parameters_from_database("unit", &db, false).unwrap();
//! case.fix_feed("feed", &[("H2O".into(), 10.0), ("tss".into(), 1.0)], 101_325.0).unwrap();
//! initialize(&mut case, &InitializeOptions::default()).unwrap();
//! let status = case.solve(&SolverOptions::default(), true).unwrap();
//! println!("{}", status.termination);
//! ```

pub mod builder;
pub mod case;
pub mod costing;
pub mod database;
pub mod error;
pub mod initialize;
mod mixing;
mod pump;
pub mod report;
mod separator;
pub mod stream;
pub mod unit;

pub use builder::{FeedSpec, PumpSpec, TrainConfig, build_case, build_flowsheet};
pub use case::{Case, Link};
pub use costing::{Costing, CostingParameters, CostingSummary, UnitCosting, add_costing};
pub use database::{CapitalCostParameters, Database, ParamEntry, TechParameters};
pub use error::{FlowsheetError, FlowsheetResult};
pub use initialize::{InitializeOptions, InitializeReport, initialize};
pub use report::{costing_report, format_significant, unit_report};
pub use stream::{ComponentList, StreamState, WATER};
pub use unit::{Capabilities, PerfVar, Unit, UnitKind, UnitPort};
