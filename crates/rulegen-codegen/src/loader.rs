//! Runtime loader scopes and the define-once protocol.
//!
//! A [`LoaderScope`] is the namespace generated units are installed into,
//! one per code origin. Unit names are unique within a scope and a name is
//! never defined twice.
//!
//! [`ensure_defined`] is the only path through which the generator installs
//! units. It runs its whole check-synthesize-install sequence under a single
//! process-wide lock, shared by every scope and every thread, so two
//! preparations racing on the same unit name cannot both define it. The lock
//! is held only while units are prepared, never while they run.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use rulegen_insn::{InsnGroup, OwnerType, TypeName};
use tracing::{debug, info, instrument};

use crate::error::{Error, Result};
use crate::strategy::UnitStrategy;
use crate::synth::UnitSynthesizer;
use crate::unit::{UnitCode, UnitDefinition};

/// Serializes every check-and-define sequence in the process.
static DEFINE_LOCK: Mutex<()> = Mutex::new(());

static NEXT_ORIGIN: AtomicU64 = AtomicU64::new(1);

/// Identity of a code origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OriginId(u64);

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "origin#{}", self.0)
    }
}

/// A unit installed into a scope.
#[derive(Debug)]
pub struct LoadedUnit {
    pub definition: UnitDefinition,
    pub code: UnitCode,
}

/// Definition namespace of one code origin.
#[derive(Debug)]
pub struct LoaderScope {
    origin: OriginId,
    units: Mutex<IndexMap<TypeName, Arc<LoadedUnit>>>,
}

impl Default for LoaderScope {
    fn default() -> Self {
        Self::new()
    }
}

impl LoaderScope {
    /// Create an empty scope with a fresh origin id.
    pub fn new() -> Self {
        Self {
            origin: OriginId(NEXT_ORIGIN.fetch_add(1, Ordering::Relaxed)),
            units: Mutex::new(IndexMap::new()),
        }
    }

    pub fn origin(&self) -> OriginId {
        self.origin
    }

    /// Look up an installed unit.
    pub fn find(&self, name: &TypeName) -> Option<Arc<LoadedUnit>> {
        self.units().get(name).cloned()
    }

    pub fn is_defined(&self, name: &TypeName) -> bool {
        self.units().contains_key(name)
    }

    /// Install `code` under `name`.
    ///
    /// The code is decoded first and must define `name`. Installation is
    /// all or nothing: on error the scope is left unchanged.
    ///
    /// # Errors
    ///
    /// - [`Error::Decode`] if the code is not a valid unit
    /// - [`Error::NameMismatch`] if the code defines another name
    /// - [`Error::DuplicateDefinition`] if `name` is already defined
    pub fn define(&self, name: &TypeName, code: UnitCode) -> Result<Arc<LoadedUnit>> {
        let definition = code.decode()?;
        if &definition.name != name {
            return Err(Error::NameMismatch {
                expected: name.clone(),
                found: definition.name,
            });
        }

        let mut units = self.units();
        if units.contains_key(name) {
            return Err(Error::DuplicateDefinition(name.clone()));
        }
        let unit = Arc::new(LoadedUnit { definition, code });
        units.insert(name.clone(), Arc::clone(&unit));
        Ok(unit)
    }

    /// Names of installed units, in installation order.
    pub fn names(&self) -> Vec<TypeName> {
        self.units().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.units().len()
    }

    pub fn is_empty(&self) -> bool {
        self.units().is_empty()
    }

    fn units(&self) -> MutexGuard<'_, IndexMap<TypeName, Arc<LoadedUnit>>> {
        // Entries are inserted whole, a poisoned map is still consistent.
        self.units.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// What [`ensure_defined`] did for a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefineOutcome {
    /// The unit was synthesized and installed.
    Installed,
    /// The unit already existed; nothing was synthesized.
    Reused,
    /// The unit already existed; its code was regenerated for the group
    /// but not installed again.
    Rebuilt,
}

/// Make sure the group's unit is defined in `scope`, exactly once.
///
/// Under the global define lock: look the unit up; if it is missing, or
/// `force_rebuild` is set, synthesize it and record the code on the group;
/// install it only if it was missing.
#[instrument(skip_all, fields(group = group.name(), origin = %scope.origin()))]
pub fn ensure_defined<S: UnitStrategy>(
    synthesizer: &UnitSynthesizer<'_, S>,
    owner: &OwnerType,
    group: &mut InsnGroup,
    scope: &LoaderScope,
    force_rebuild: bool,
) -> Result<DefineOutcome> {
    let name = synthesizer.unit_type(owner, group)?;
    group.set_unit_type(name.clone());

    let _guard = DEFINE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

    let existing = scope.is_defined(&name);
    if existing && !force_rebuild {
        debug!(unit = %name, "unit already defined");
        return Ok(DefineOutcome::Reused);
    }

    let code = synthesizer.synthesize(owner, group)?;
    group.set_unit_code(code.as_bytes().to_vec());

    if existing {
        debug!(unit = %name, "unit code rebuilt");
        return Ok(DefineOutcome::Rebuilt);
    }

    scope.define(&name, code)?;
    info!(unit = %name, "unit installed");
    Ok(DefineOutcome::Installed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::Access;

    fn code_for(name: &str) -> UnitCode {
        UnitCode::encode(&UnitDefinition {
            name: TypeName::new(name),
            access: Access::PUBLIC | Access::FINAL,
            super_type: TypeName::new("rulegen/runtime/BaseAction"),
            source_file: None,
            fields: Vec::new(),
            methods: Vec::new(),
        })
        .unwrap()
    }

    #[test]
    fn test_define_and_find() {
        let scope = LoaderScope::new();
        let name = TypeName::new("org/demo/Action$1");
        assert!(scope.find(&name).is_none());

        scope.define(&name, code_for("org/demo/Action$1")).unwrap();
        assert!(scope.is_defined(&name));
        assert_eq!(scope.find(&name).unwrap().definition.name, name);
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn test_second_definition_conflicts() {
        let scope = LoaderScope::new();
        let name = TypeName::new("org/demo/Action$1");
        scope.define(&name, code_for("org/demo/Action$1")).unwrap();

        let err = scope.define(&name, code_for("org/demo/Action$1")).unwrap_err();
        assert!(matches!(err, Error::DuplicateDefinition(ref n) if *n == name));
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn test_rejects_mismatched_or_garbage_code() {
        let scope = LoaderScope::new();
        let name = TypeName::new("org/demo/Action$1");

        assert!(matches!(
            scope.define(&name, code_for("org/demo/Action$2")),
            Err(Error::NameMismatch { .. })
        ));
        assert!(matches!(
            scope.define(&name, UnitCode::from_bytes(vec![1, 2, 3])),
            Err(Error::Decode(_))
        ));
        assert!(scope.is_empty());
    }

    #[test]
    fn test_scopes_are_independent() {
        let a = LoaderScope::new();
        let b = LoaderScope::new();
        assert_ne!(a.origin(), b.origin());

        let name = TypeName::new("org/demo/Action$1");
        a.define(&name, code_for("org/demo/Action$1")).unwrap();
        b.define(&name, code_for("org/demo/Action$1")).unwrap();
        assert_eq!(a.names(), b.names());
    }
}
