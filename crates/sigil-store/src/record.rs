use smol_str::SmolStr;

use sigil_common::{SigilError, SigilResult};
use sigil_types::{
    deserialize_fields, deserialize_outputs, serialize_fields, type_of, CustomDescriptor,
    CustomKind, FunctionDescriptor, FunctionSignature, Mode, ProcedureDescriptor,
    ProcedureSignature, QualifiedName,
};

/// One persisted definition, laid out exactly as stored: field lists as
/// JSON strings, the function return type as its rendered name, and the
/// kind-specific properties optional.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StoredRecord {
    pub database: SmolStr,
    pub kind: CustomKind,
    /// Leaf name of the qualified name.
    pub name: SmolStr,
    /// Namespace segments, root prefix included.
    pub prefix: Vec<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<SmolStr>,
    pub statement: SmolStr,
    /// Serialized input field list.
    pub inputs: String,
    /// Serialized output field list; procedures only. Empty list means
    /// VOID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<String>,
    /// Rendered return type; functions only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_single: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_result: Option<bool>,
}

impl StoredRecord {
    pub fn from_procedure(database: &str, descriptor: &ProcedureDescriptor) -> Self {
        let signature = &descriptor.signature;
        Self {
            database: SmolStr::new(database),
            kind: CustomKind::Procedure,
            name: signature.name.name.clone(),
            prefix: signature.name.namespace.clone(),
            description: signature.description.clone(),
            statement: descriptor.statement.clone(),
            inputs: serialize_fields(&signature.inputs),
            outputs: Some(serialize_fields(signature.outputs.fields())),
            output: None,
            mode: Some(SmolStr::new(signature.mode.as_str())),
            force_single: None,
            map_result: None,
        }
    }

    pub fn from_function(database: &str, descriptor: &FunctionDescriptor) -> Self {
        let signature = &descriptor.signature;
        Self {
            database: SmolStr::new(database),
            kind: CustomKind::Function,
            name: signature.name.name.clone(),
            prefix: signature.name.namespace.clone(),
            description: signature.description.clone(),
            statement: descriptor.statement.clone(),
            inputs: serialize_fields(&signature.inputs),
            outputs: None,
            output: Some(signature.output.type_name().to_string()),
            mode: None,
            force_single: Some(descriptor.force_single),
            map_result: Some(descriptor.map_result),
        }
    }

    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedName::new(self.prefix.clone(), self.name.as_str())
    }

    /// Rebuild the typed descriptor from the persisted properties.
    pub fn to_descriptor(&self) -> SigilResult<CustomDescriptor> {
        let name = self.qualified_name();
        let inputs = deserialize_fields(&self.inputs)?;
        match self.kind {
            CustomKind::Procedure => {
                let outputs_text = self.outputs.as_deref().ok_or_else(|| {
                    SigilError::Store(format!("procedure record {name} has no outputs"))
                })?;
                let outputs = deserialize_outputs(outputs_text)?;
                let mode = Mode::parse(self.mode.as_deref())?;
                Ok(CustomDescriptor::Procedure(ProcedureDescriptor {
                    signature: ProcedureSignature {
                        name,
                        inputs,
                        outputs,
                        mode,
                        description: self.description.clone(),
                    },
                    statement: self.statement.clone(),
                }))
            }
            CustomKind::Function => {
                let output_text = self.output.as_deref().ok_or_else(|| {
                    SigilError::Store(format!("function record {name} has no return type"))
                })?;
                Ok(CustomDescriptor::Function(FunctionDescriptor {
                    signature: FunctionSignature {
                        name,
                        inputs,
                        output: type_of(output_text),
                        description: self.description.clone(),
                    },
                    statement: self.statement.clone(),
                    force_single: self.force_single.unwrap_or(false),
                    map_result: self.map_result.unwrap_or(false),
                }))
            }
        }
    }
}
