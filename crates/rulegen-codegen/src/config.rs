//! Generator configuration.
//!
//! Both structs deserialize with `#[serde(default)]`, so a host only spells
//! out what it changes:
//!
//! ```
//! use rulegen_codegen::GeneratorConfig;
//!
//! let config: GeneratorConfig = serde_json::from_str(r#"{ "force_rebuild": true }"#).unwrap();
//! assert!(config.force_rebuild);
//! assert_eq!(config.types.set_context, "setContext");
//! ```

use rulegen_insn::TypeName;
use serde::{Deserialize, Serialize};

/// Runtime library types the generated code links against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Types {
    /// Supertype of action units.
    pub action_base: TypeName,
    /// Supertype of var-init units.
    pub var_init_base: TypeName,
    /// The parse context passed to `run`.
    pub context: TypeName,
    /// Interface of objects that accept a context before being called.
    pub context_aware: TypeName,
    /// Method name on [`Types::context_aware`] installing the context.
    pub set_context: String,
    /// Descriptor of the single constructor argument.
    pub constructor_arg: String,
}

impl Default for Types {
    fn default() -> Self {
        Self {
            action_base: TypeName::new("rulegen/runtime/BaseAction"),
            var_init_base: TypeName::new("rulegen/runtime/BaseVarInit"),
            context: TypeName::new("rulegen/runtime/Context"),
            context_aware: TypeName::new("rulegen/runtime/ContextAware"),
            set_context: "setContext".to_string(),
            constructor_arg: "Ljava/lang/String;".to_string(),
        }
    }
}

impl Types {
    /// `Lrulegen/runtime/Context;`
    pub fn context_desc(&self) -> String {
        self.context.descriptor()
    }

    /// Descriptor of the hand-off methods on the base types: context in,
    /// context out.
    pub fn context_switch_desc(&self) -> String {
        let ctx = self.context_desc();
        format!("({ctx}){ctx}")
    }

    /// Descriptor of the set-context method.
    pub fn set_context_desc(&self) -> String {
        format!("({})V", self.context_desc())
    }

    /// Descriptor shared by every unit constructor and the base constructor.
    pub fn constructor_desc(&self) -> String {
        format!("({})V", self.constructor_arg)
    }
}

/// Settings for [`crate::GroupUnitGenerator`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Regenerate unit code even when the unit is already defined.
    ///
    /// The existing definition stays installed, only the group's recorded
    /// code is refreshed.
    pub force_rebuild: bool,
    /// Runtime types to link against.
    pub types: Types,
}

impl GeneratorConfig {
    pub fn with_force_rebuild(mut self, force_rebuild: bool) -> Self {
        self.force_rebuild = force_rebuild;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptors() {
        let types = Types::default();
        assert_eq!(types.context_desc(), "Lrulegen/runtime/Context;");
        assert_eq!(
            types.context_switch_desc(),
            "(Lrulegen/runtime/Context;)Lrulegen/runtime/Context;"
        );
        assert_eq!(types.set_context_desc(), "(Lrulegen/runtime/Context;)V");
        assert_eq!(types.constructor_desc(), "(Ljava/lang/String;)V");
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{ "types": { "context": "org/demo/Ctx" } }"#).unwrap();
        assert!(!config.force_rebuild);
        assert_eq!(config.types.context.as_str(), "org/demo/Ctx");
        assert_eq!(config.types.action_base, Types::default().action_base);
    }

    #[test]
    fn test_round_trip() {
        let config = GeneratorConfig::default().with_force_rebuild(true);
        let json = serde_json::to_string(&config).unwrap();
        let back: GeneratorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
