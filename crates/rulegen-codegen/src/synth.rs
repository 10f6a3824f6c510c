//! Unit synthesis.
//!
//! Turns one group into a complete [`UnitDefinition`] and its [`UnitCode`]:
//!
//! 1. Name the unit after the owner's namespace and the group's short name
//! 2. Declare it public and final, extending the strategy's base type, with
//!    the owner's source file attached
//! 3. Declare one public synthetic field per captured variable, in slot order
//! 4. Emit the fixed single-argument constructor delegating to the base type
//! 5. Rewrite the body (first synthesis only) and let the strategy emit the
//!    generated method
//!
//! Synthesis never installs anything, see [`crate::loader`].

use rulegen_insn::{Insn, InsnGroup, InvokeKind, OwnerType, ReturnKind, TypeName};
use tracing::{debug, instrument};

use crate::config::Types;
use crate::error::{Error, Result};
use crate::strategy::UnitStrategy;
use crate::unit::{Access, CONSTRUCTOR, FieldDef, MethodDef, UnitCode, UnitDefinition};

/// Builds unit definitions for one strategy.
#[derive(Debug)]
pub struct UnitSynthesizer<'a, S> {
    strategy: &'a S,
    types: &'a Types,
}

impl<'a, S: UnitStrategy> UnitSynthesizer<'a, S> {
    pub fn new(strategy: &'a S, types: &'a Types) -> Self {
        Self { strategy, types }
    }

    pub fn types(&self) -> &Types {
        self.types
    }

    /// Fully qualified unit name: the owner's namespace plus the group name.
    ///
    /// # Errors
    ///
    /// [`Error::MissingNamespace`] when the owner has no namespace separator.
    pub fn unit_type(&self, owner: &OwnerType, group: &InsnGroup) -> Result<TypeName> {
        owner
            .name()
            .sibling(group.name())
            .ok_or_else(|| Error::MissingNamespace(owner.name().clone()))
    }

    /// Synthesize the group's unit and return its binary form.
    ///
    /// Names the group, runs the strategy's rewrite passes if the group is
    /// still open, freezes it and encodes the definition. Synthesizing a
    /// frozen group again yields identical code. A failed rewrite restores
    /// the instructions and leaves the group open.
    #[instrument(level = "debug", skip_all, fields(group = group.name()))]
    pub fn synthesize(&self, owner: &OwnerType, group: &mut InsnGroup) -> Result<UnitCode> {
        let name = self.unit_type(owner, group)?;
        group.set_unit_type(name.clone());

        if !group.is_frozen() {
            let original = group.instructions().clone();
            if let Err(err) = self.strategy.rewrite(group, self.types) {
                *group.instructions_mut()? = original;
                return Err(err);
            }
            group.freeze();
        }

        let definition = self.definition(&name, owner, group)?;
        let code = UnitCode::encode(&definition)?;
        debug!(unit = %name, fields = definition.fields.len(), bytes = code.len(), "unit synthesized");
        Ok(code)
    }

    /// Assemble the definition of an already named and rewritten group.
    pub fn definition(
        &self,
        name: &TypeName,
        owner: &OwnerType,
        group: &InsnGroup,
    ) -> Result<UnitDefinition> {
        let super_type = self.strategy.base_type(self.types).clone();
        let constructor = self.constructor(name, &super_type)?;
        let method = self.strategy.generate_method(name, group, self.types)?;

        Ok(UnitDefinition {
            name: name.clone(),
            access: Access::PUBLIC | Access::FINAL,
            super_type,
            source_file: owner.source_file().map(str::to_string),
            fields: self.fields(group),
            methods: vec![constructor, method],
        })
    }

    fn fields(&self, group: &InsnGroup) -> Vec<FieldDef> {
        group
            .captures()
            .iter()
            .map(|capture| FieldDef {
                access: Access::PUBLIC | Access::SYNTHETIC,
                name: capture.name.clone(),
                desc: capture.desc.clone(),
            })
            .collect()
    }

    /// `this` and the single argument, forwarded to the base constructor.
    fn constructor(&self, name: &TypeName, super_type: &TypeName) -> Result<MethodDef> {
        let desc = self.types.constructor_desc();
        let code = vec![
            Insn::Load(0),
            Insn::Load(1),
            Insn::invoke(InvokeKind::Special, super_type.clone(), CONSTRUCTOR, &desc),
            Insn::Return(ReturnKind::Void),
        ];
        MethodDef::assemble(name, Access::PUBLIC, CONSTRUCTOR, &desc, code)
    }
}
