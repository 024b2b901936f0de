//! sigil-types: the data model for custom procedures and functions.
//!
//! Field types and their lenient name mapper, runtime values, field
//! specs with their persisted JSON form, qualified names, execution
//! modes, and the signature/descriptor types shared by the store, the
//! registration engine, and the admin surface.

pub mod field;
pub mod field_type;
pub mod mode;
pub mod name;
pub mod signature;
pub mod value;

pub use field::{
    default_inputs, default_map_output, deserialize_fields, deserialize_outputs,
    serialize_fields, FieldSpec, ProcedureOutputs,
};
pub use field_type::{is_wrapped, type_of, FieldType};
pub use mode::Mode;
pub use name::{QualifiedName, ROOT_PREFIX};
pub use signature::{
    CustomDescriptor, CustomKind, FunctionDescriptor, FunctionSignature, ProcedureDescriptor,
    ProcedureSignature,
};
pub use value::Value;
