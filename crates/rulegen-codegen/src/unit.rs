//! Synthesized unit definitions and their binary form.
//!
//! A [`UnitDefinition`] is the complete, self-contained description of one
//! generated unit. [`UnitCode`] is its binary form: a short header followed
//! by the bincode encoding of the definition. Loader scopes install unit
//! code, and tooling decodes it back for inspection.

use std::ops::BitOr;

use rulegen_insn::{Insn, MethodDesc, TypeName};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sizing::{Frame, SizingError, compute_frame};

/// Access and property flags of units, fields and methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Access(u16);

impl Access {
    pub const PUBLIC: Access = Access(0x0001);
    pub const FINAL: Access = Access(0x0010);
    /// Compiler generated, not visible to user code.
    pub const SYNTHETIC: Access = Access(0x1000);

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn contains(self, other: Access) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Access {
    type Output = Access;

    fn bitor(self, rhs: Access) -> Access {
        Access(self.0 | rhs.0)
    }
}

/// A field declared by a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub access: Access,
    pub name: String,
    pub desc: String,
}

/// A method declared by a unit, with its sized body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDef {
    pub access: Access,
    pub name: String,
    pub desc: String,
    pub code: Vec<Insn>,
    pub max_stack: u16,
    pub max_locals: u16,
}

impl MethodDef {
    /// Build an instance method, computing its frame from the body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sizing`] when the descriptor is malformed or the body
    /// is inconsistent (stack underflow, mismatched joins, missing return).
    pub fn assemble(
        unit: &TypeName,
        access: Access,
        name: &str,
        desc: &str,
        code: Vec<Insn>,
    ) -> Result<Self> {
        let sizing_error = |source: SizingError| Error::Sizing {
            unit: unit.clone(),
            method: name.to_string(),
            source,
        };
        let params = MethodDesc::parse(desc)
            .map_err(|source| sizing_error(SizingError::Malformed { index: 0, source }))?;
        let Frame {
            max_stack,
            max_locals,
        } = params
            .param_slots()
            .checked_add(1)
            .ok_or(SizingError::TooManyLocals { index: 0 })
            .and_then(|param_slots| compute_frame(&code, param_slots))
            .map_err(sizing_error)?;

        tracing::trace!(%unit, method = name, max_stack, max_locals, "method sized");

        Ok(Self {
            access,
            name: name.to_string(),
            desc: desc.to_string(),
            code,
            max_stack,
            max_locals,
        })
    }
}

/// A complete unit definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDefinition {
    pub name: TypeName,
    pub access: Access,
    pub super_type: TypeName,
    /// Source file of the owner, for debuggers and stack traces.
    pub source_file: Option<String>,
    /// Fields in declaration order.
    pub fields: Vec<FieldDef>,
    /// Methods in declaration order, constructor first.
    pub methods: Vec<MethodDef>,
}

impl UnitDefinition {
    pub fn method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|method| method.name == name)
    }

    pub fn constructors(&self) -> impl Iterator<Item = &MethodDef> {
        self.methods.iter().filter(|method| method.name == CONSTRUCTOR)
    }
}

/// Method name of constructors.
pub const CONSTRUCTOR: &str = "<init>";

const MAGIC: [u8; 4] = *b"RGU\0";
const FORMAT_VERSION: u16 = 1;
const HEADER_LEN: usize = MAGIC.len() + 2;

/// Binary form of a [`UnitDefinition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitCode(Vec<u8>);

impl UnitCode {
    /// Encode a definition.
    pub fn encode(definition: &UnitDefinition) -> Result<Self> {
        let payload = bincode::serialize(definition).map_err(|err| Error::Encode {
            unit: definition.name.clone(),
            message: err.to_string(),
        })?;
        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&payload);
        Ok(Self(bytes))
    }

    /// Decode the definition back.
    pub fn decode(&self) -> Result<UnitDefinition> {
        Self::decode_bytes(&self.0)
    }

    /// Decode a definition from raw bytes, e.g. a group's recorded code.
    pub fn decode_bytes(bytes: &[u8]) -> Result<UnitDefinition> {
        if bytes.len() < HEADER_LEN || bytes[..MAGIC.len()] != MAGIC {
            return Err(Error::Decode("missing unit header".to_string()));
        }
        let version = u16::from_le_bytes([bytes[MAGIC.len()], bytes[MAGIC.len() + 1]]);
        if version != FORMAT_VERSION {
            return Err(Error::Decode(format!("unsupported format version {version}")));
        }
        bincode::deserialize(&bytes[HEADER_LEN..]).map_err(|err| Error::Decode(err.to_string()))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
