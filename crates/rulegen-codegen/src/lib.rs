//! Rulegen group unit generator.
//!
//! Rule methods of a parser type contain fragments (actions, variable
//! initializers) that run detached from the rule method's frame. This crate
//! turns each such fragment, already carved out as an
//! [`rulegen_insn::InsnGroup`], into a standalone unit: a small final type
//! whose fields hold the captured locals and whose single generated method
//! runs the fragment.
//!
//! # Architecture
//!
//! - [`passes`] - Rewrite passes: context switch bracketing, context
//!   installation on calls, captured load conversion
//! - [`strategy`] - Per-kind variation points ([`ActionUnits`], [`VarInitUnits`])
//! - [`synth`] - [`UnitSynthesizer`], building a [`UnitDefinition`] per group
//! - [`unit`] - Unit definitions and their binary form [`UnitCode`]
//! - [`sizing`] - Operand stack and locals sizing of generated methods
//! - [`loader`] - [`LoaderScope`] and the define-once protocol
//! - [`generator`] - [`GroupUnitGenerator::process`], the preparation entry point
//! - [`config`] - [`GeneratorConfig`] and the runtime [`Types`]
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```
//! use rulegen_codegen::{ActionUnits, GeneratorConfig, GroupUnitGenerator, LoaderScope};
//! use rulegen_insn::{Insn, InsnGroup, NodeRole, OwnerType, RootKind, RuleMethod};
//!
//! let mut builder = InsnGroup::builder("Action$Ab12");
//! let ctx = builder.push(Insn::Load(1));
//! let call = builder.push_node(
//!     Insn::invoke_interface("rulegen/runtime/Context", "hasError", "()Z"),
//!     NodeRole::Plain,
//!     &[ctx],
//! );
//! builder.mark_root(call, RootKind::Action);
//! let mut method = RuleMethod::new("Expression", vec![builder.build().unwrap()]);
//!
//! let owner = OwnerType::new("org/demo/CalcParser", Some("CalcParser.java"));
//! let scope = LoaderScope::new();
//! let generator = GroupUnitGenerator::new(ActionUnits, GeneratorConfig::default());
//!
//! let report = generator.process(&owner, &mut method, &scope).unwrap();
//! assert_eq!(report.installed(), 1);
//! assert!(scope.is_defined(&"org/demo/Action$Ab12".into()));
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod loader;
pub mod passes;
pub mod sizing;
pub mod strategy;
pub mod synth;
pub mod unit;

pub use config::{GeneratorConfig, Types};
pub use error::{Error, Result};
pub use generator::{ActionUnitGenerator, GroupUnitGenerator, ProcessReport, VarInitUnitGenerator};
pub use loader::{DefineOutcome, LoadedUnit, LoaderScope, OriginId, ensure_defined};
pub use sizing::{Frame, SizingError};
pub use strategy::{ActionUnits, UnitStrategy, VarInitUnits};
pub use synth::UnitSynthesizer;
pub use unit::{Access, FieldDef, MethodDef, UnitCode, UnitDefinition};
