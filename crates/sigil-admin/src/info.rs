//! Display form of a custom definition, as returned by the listing
//! operations.

use smol_str::SmolStr;

use sigil_types::{CustomDescriptor, FieldSpec, ProcedureOutputs};

/// Rendered outputs of one definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputsInfo {
    /// Procedure output fields as `[name, type]` pairs; empty for VOID.
    Fields(Vec<Vec<String>>),
    /// Function return type.
    Single(String),
}

/// One listing row: the persisted definition with its signature
/// re-rendered as display strings.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomProcedureInfo {
    pub kind: SmolStr,
    /// Dotted name without the root prefix, as users invoke it.
    pub name: String,
    pub description: Option<SmolStr>,
    pub mode: Option<SmolStr>,
    pub statement: SmolStr,
    /// Input fields as `[name, type]` or `[name, type, default]` rows.
    pub inputs: Vec<Vec<String>>,
    pub outputs: OutputsInfo,
    pub force_single: Option<bool>,
}

impl CustomProcedureInfo {
    pub fn from_descriptor(descriptor: &CustomDescriptor) -> Self {
        match descriptor {
            CustomDescriptor::Procedure(p) => Self {
                kind: SmolStr::new("procedure"),
                name: p.signature.name.user_name(),
                description: p.signature.description.clone(),
                mode: Some(SmolStr::new(p.signature.mode.as_str().to_lowercase())),
                statement: p.statement.clone(),
                inputs: field_rows(&p.signature.inputs),
                outputs: match &p.signature.outputs {
                    ProcedureOutputs::Void => OutputsInfo::Fields(Vec::new()),
                    ProcedureOutputs::Fields(fields) => OutputsInfo::Fields(field_rows(fields)),
                },
                force_single: None,
            },
            CustomDescriptor::Function(f) => Self {
                kind: SmolStr::new("function"),
                name: f.signature.name.user_name(),
                description: f.signature.description.clone(),
                mode: None,
                statement: f.statement.clone(),
                inputs: field_rows(&f.signature.inputs),
                outputs: OutputsInfo::Single(f.signature.output.pretty_name()),
                force_single: Some(f.force_single),
            },
        }
    }
}

fn field_rows(fields: &[FieldSpec]) -> Vec<Vec<String>> {
    fields
        .iter()
        .map(|field| {
            let mut row = vec![field.name.to_string(), field.field_type.pretty_name()];
            if let Some(default) = &field.default {
                row.push(default.to_json().to_string());
            }
            row
        })
        .collect()
}
