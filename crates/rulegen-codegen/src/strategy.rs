//! Extraction strategies: the per-kind variation points of unit synthesis.
//!
//! The synthesizer emits everything that is the same for every unit (header,
//! fields, constructor). A strategy supplies the rest: which groups it
//! handles, the supertype its units extend, which rewrite passes the group
//! body needs, and the generated method wrapping that body.

use rulegen_insn::{Insn, InsnGraphNode, InsnGroup, ReturnKind, TypeName};

use crate::config::Types;
use crate::error::Result;
use crate::passes::{convert_captured_loads, fix_context_switches, insert_set_context_calls};
use crate::unit::{Access, MethodDef};

/// Variation points of group unit synthesis.
pub trait UnitStrategy: Send + Sync {
    /// Whether groups rooted at `root` are extracted by this strategy.
    fn applies_to(&self, root: &InsnGraphNode) -> bool;

    /// Supertype of the generated units.
    fn base_type<'t>(&self, types: &'t Types) -> &'t TypeName;

    /// Rewrite the group body in place. Runs once, before the group freezes.
    fn rewrite(&self, group: &mut InsnGroup, types: &Types) -> Result<()>;

    /// Build the unit's generated method from the (rewritten) group body.
    fn generate_method(&self, unit: &TypeName, group: &InsnGroup, types: &Types)
    -> Result<MethodDef>;
}

/// Parser actions: `boolean run(Context)`.
///
/// Slot 1 holds the context, which context switches hand off and
/// context-aware targets receive.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionUnits;

impl UnitStrategy for ActionUnits {
    fn applies_to(&self, root: &InsnGraphNode) -> bool {
        root.is_action_root()
    }

    fn base_type<'t>(&self, types: &'t Types) -> &'t TypeName {
        &types.action_base
    }

    fn rewrite(&self, group: &mut InsnGroup, types: &Types) -> Result<()> {
        fix_context_switches(group, self.base_type(types), types)?;
        insert_set_context_calls(group, types, 1)?;
        convert_captured_loads(group)?;
        Ok(())
    }

    fn generate_method(
        &self,
        unit: &TypeName,
        group: &InsnGroup,
        types: &Types,
    ) -> Result<MethodDef> {
        let mut code = group.instructions().to_vec();
        code.push(Insn::Return(ReturnKind::Int));
        MethodDef::assemble(
            unit,
            Access::PUBLIC,
            "run",
            &format!("({})Z", types.context_desc()),
            code,
        )
    }
}

/// Action variable initializers: `Object create()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VarInitUnits;

impl UnitStrategy for VarInitUnits {
    fn applies_to(&self, root: &InsnGraphNode) -> bool {
        root.is_var_init_root()
    }

    fn base_type<'t>(&self, types: &'t Types) -> &'t TypeName {
        &types.var_init_base
    }

    fn rewrite(&self, group: &mut InsnGroup, _types: &Types) -> Result<()> {
        convert_captured_loads(group)?;
        Ok(())
    }

    fn generate_method(
        &self,
        unit: &TypeName,
        group: &InsnGroup,
        _types: &Types,
    ) -> Result<MethodDef> {
        let mut code = group.instructions().to_vec();
        code.push(Insn::Return(ReturnKind::Reference));
        MethodDef::assemble(unit, Access::PUBLIC, "create", "()Ljava/lang/Object;", code)
    }
}
