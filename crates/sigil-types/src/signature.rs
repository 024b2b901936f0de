use smol_str::SmolStr;

use crate::field::{FieldSpec, ProcedureOutputs};
use crate::field_type::FieldType;
use crate::mode::Mode;
use crate::name::QualifiedName;

/// Declared shape of a custom procedure.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProcedureSignature {
    pub name: QualifiedName,
    pub inputs: Vec<FieldSpec>,
    pub outputs: ProcedureOutputs,
    pub mode: Mode,
    pub description: Option<SmolStr>,
}

/// Declared shape of a custom function.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionSignature {
    pub name: QualifiedName,
    pub inputs: Vec<FieldSpec>,
    pub output: FieldType,
    pub description: Option<SmolStr>,
}

/// A persisted procedure definition: signature plus the statement that
/// backs it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcedureDescriptor {
    pub signature: ProcedureSignature,
    pub statement: SmolStr,
}

/// A persisted function definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionDescriptor {
    pub signature: FunctionSignature,
    pub statement: SmolStr,
    /// Return only the first result row instead of collecting a list.
    pub force_single: bool,
    /// Declared via the MAPRESULT pseudo-type: a MAP return is the raw
    /// row, not a wrapped single column.
    pub map_result: bool,
}

/// Kind discriminator used by the store and the admin surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum CustomKind {
    Function,
    Procedure,
}

impl CustomKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Procedure => "procedure",
        }
    }
}

/// Either kind of persisted definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CustomDescriptor {
    Procedure(ProcedureDescriptor),
    Function(FunctionDescriptor),
}

impl CustomDescriptor {
    pub fn name(&self) -> &QualifiedName {
        match self {
            Self::Procedure(p) => &p.signature.name,
            Self::Function(f) => &f.signature.name,
        }
    }

    pub fn kind(&self) -> CustomKind {
        match self {
            Self::Procedure(_) => CustomKind::Procedure,
            Self::Function(_) => CustomKind::Function,
        }
    }

    pub fn statement(&self) -> &str {
        match self {
            Self::Procedure(p) => &p.statement,
            Self::Function(f) => &f.statement,
        }
    }

    pub fn as_procedure(&self) -> Option<&ProcedureDescriptor> {
        match self {
            Self::Procedure(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionDescriptor> {
        match self {
            Self::Function(f) => Some(f),
            _ => None,
        }
    }
}
