//! # Orchid Planner
//!
//! Intent parsing and plan generation for the Orchid engine.
//!
//! The [`IntentParser`] turns raw user inputs plus a task template into a
//! populated [`orchid_core::Intent`]; the [`Planner`] expands an intent into
//! an ordered step list, either through registered planning templates
//! (first match wins) or dynamic synthesis per intent kind. A stored task
//! template's declared steps register as a [`DeclaredPlan`].

pub mod declared;
pub mod dynamic;
pub mod parser;
pub mod planner;

pub use declared::DeclaredPlan;
pub use dynamic::{ENV_SENSING_STEP_ID, TRANSACTION_RISK_THRESHOLD};
pub use parser::{IntentParser, ParseOptions, ParserConfig, FALLBACK_ACTION};
pub use planner::{Planner, PlannerConfig, PlanningTemplate};
