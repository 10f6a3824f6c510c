//! Preparation driver.
//!
//! [`GroupUnitGenerator::process`] is what a parser type's preparation
//! phase calls per rule method: every group whose root the strategy
//! applies to ends up with a unit defined in the owner's loader scope.

use rulegen_insn::{OwnerType, RuleMethod, TypeName};
use tracing::{instrument, trace};

use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::loader::{DefineOutcome, LoaderScope, ensure_defined};
use crate::strategy::{ActionUnits, UnitStrategy, VarInitUnits};
use crate::synth::UnitSynthesizer;

/// Generator for parser actions.
pub type ActionUnitGenerator = GroupUnitGenerator<ActionUnits>;

/// Generator for action variable initializers.
pub type VarInitUnitGenerator = GroupUnitGenerator<VarInitUnits>;

/// Per-group results of one [`GroupUnitGenerator::process`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Unit name and outcome for each handled group, in group order.
    pub units: Vec<(TypeName, DefineOutcome)>,
}

impl ProcessReport {
    /// Number of units newly installed by this call.
    pub fn installed(&self) -> usize {
        self.count(DefineOutcome::Installed)
    }

    pub fn count(&self, outcome: DefineOutcome) -> usize {
        self.units.iter().filter(|(_, o)| *o == outcome).count()
    }
}

/// Synthesizes and loads group units for one extraction strategy.
#[derive(Debug, Clone, Default)]
pub struct GroupUnitGenerator<S> {
    strategy: S,
    config: GeneratorConfig,
}

impl<S: UnitStrategy> GroupUnitGenerator<S> {
    pub fn new(strategy: S, config: GeneratorConfig) -> Self {
        Self { strategy, config }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Ensure a unit is defined in `scope` for every applicable group of
    /// `method`.
    ///
    /// Groups are handled in order. The first error aborts the call; units
    /// installed for earlier groups stay installed, and no unit is
    /// installed for the failing group.
    #[instrument(skip_all, fields(owner = %owner.name(), method = method.name()))]
    pub fn process(
        &self,
        owner: &OwnerType,
        method: &mut RuleMethod,
        scope: &LoaderScope,
    ) -> Result<ProcessReport> {
        let synthesizer = UnitSynthesizer::new(&self.strategy, &self.config.types);
        let mut report = ProcessReport::default();

        for group in method.groups_mut() {
            if !self.strategy.applies_to(group.root()) {
                trace!(group = group.name(), "group skipped");
                continue;
            }
            let outcome = ensure_defined(
                &synthesizer,
                owner,
                group,
                scope,
                self.config.force_rebuild,
            )?;
            if let Some(name) = group.unit_type() {
                report.units.push((name.clone(), outcome));
            }
        }

        Ok(report)
    }
}
