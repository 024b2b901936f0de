use smol_str::SmolStr;

use sigil_common::{SigilError, SigilResult};

use crate::field_type::{type_of, FieldType};
use crate::value::Value;

/// One declared input or output field of a custom procedure/function.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    pub name: SmolStr,
    pub field_type: FieldType,
    /// Default for input fields. `None` means no default was declared;
    /// a declared `null` default is `Some(Value::Null)`.
    pub default: Option<Value>,
}

impl FieldSpec {
    pub fn new(name: impl AsRef<str>, field_type: FieldType) -> Self {
        Self {
            name: SmolStr::new(name.as_ref()),
            field_type,
            default: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Declared outputs of a procedure. `Void` is the sentinel for a
/// procedure that yields no rows; it persists as an empty field list.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ProcedureOutputs {
    Void,
    Fields(Vec<FieldSpec>),
}

impl ProcedureOutputs {
    pub fn fields(&self) -> &[FieldSpec] {
        match self {
            Self::Void => &[],
            Self::Fields(fields) => fields,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// True when the outputs are exactly the reserved `(row :: MAP)`
    /// shape, which makes every result row wrap into a single map column.
    pub fn is_default_map_output(&self) -> bool {
        self.fields() == default_map_output()
    }
}

/// Reserved input shape `(params :: MAP = {})`: the caller passes one
/// map whose entries become the statement parameters.
pub fn default_inputs() -> Vec<FieldSpec> {
    vec![FieldSpec::new("params", FieldType::Map).with_default(Value::empty_map())]
}

/// Reserved output shape `(row :: MAP)`.
pub fn default_map_output() -> Vec<FieldSpec> {
    vec![FieldSpec::new("row", FieldType::Map)]
}

/// Serialize a field list to its persisted JSON form: an array of
/// `{name, type}` objects, with a `default` key only when a default was
/// declared.
pub fn serialize_fields(fields: &[FieldSpec]) -> String {
    let array: Vec<serde_json::Value> = fields
        .iter()
        .map(|field| {
            let mut obj = serde_json::Map::new();
            obj.insert("name".into(), field.name.to_string().into());
            obj.insert("type".into(), field.field_type.type_name().to_string().into());
            if let Some(default) = &field.default {
                obj.insert("default".into(), default.to_json());
            }
            serde_json::Value::Object(obj)
        })
        .collect();
    serde_json::Value::Array(array).to_string()
}

/// Deserialize a persisted field list.
pub fn deserialize_fields(text: &str) -> SigilResult<Vec<FieldSpec>> {
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| SigilError::Store(format!("malformed field list: {e}")))?;
    let array = json
        .as_array()
        .ok_or_else(|| SigilError::Store(format!("field list is not an array: {text}")))?;

    let mut fields = Vec::with_capacity(array.len());
    for entry in array {
        let obj = entry
            .as_object()
            .ok_or_else(|| SigilError::Store(format!("field entry is not an object: {entry}")))?;
        let name = obj
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SigilError::Store(format!("field entry missing name: {entry}")))?;
        let type_name = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SigilError::Store(format!("field entry missing type: {entry}")))?;
        let mut field = FieldSpec::new(name, type_of(type_name));
        if let Some(default) = obj.get("default") {
            field.default = Some(Value::from_json(default));
        }
        fields.push(field);
    }
    Ok(fields)
}

/// Deserialize persisted procedure outputs. An empty list is the `Void`
/// sentinel.
pub fn deserialize_outputs(text: &str) -> SigilResult<ProcedureOutputs> {
    let fields = deserialize_fields(text)?;
    if fields.is_empty() {
        Ok(ProcedureOutputs::Void)
    } else {
        Ok(ProcedureOutputs::Fields(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_omits_absent_default() {
        let fields = vec![
            FieldSpec::new("name", FieldType::String),
            FieldSpec::new("age", FieldType::Integer).with_default(Value::Integer(42)),
        ];
        let text = serialize_fields(&fields);
        assert!(text.contains(r#""name":"name""#));
        assert!(text.contains(r#""default":42"#));
        // Exactly one default key: the one that was declared.
        assert_eq!(text.matches("default").count(), 1);
    }

    #[test]
    fn round_trip_with_defaults() {
        let fields = vec![
            FieldSpec::new("params", FieldType::Map).with_default(Value::empty_map()),
            FieldSpec::new("scores", FieldType::List(Box::new(FieldType::Float)))
                .with_default(Value::List(vec![Value::Float(1.5), Value::Float(2.5)])),
            FieldSpec::new("note", FieldType::String).with_default(Value::Null),
        ];
        let text = serialize_fields(&fields);
        let back = deserialize_fields(&text).unwrap();
        assert_eq!(back, fields);
    }

    #[test]
    fn null_default_distinct_from_no_default() {
        let with_null = vec![FieldSpec::new("xx", FieldType::Any).with_default(Value::Null)];
        let without = vec![FieldSpec::new("xx", FieldType::Any)];
        let back_null = deserialize_fields(&serialize_fields(&with_null)).unwrap();
        let back_none = deserialize_fields(&serialize_fields(&without)).unwrap();
        assert_eq!(back_null[0].default, Some(Value::Null));
        assert_eq!(back_none[0].default, None);
    }

    #[test]
    fn empty_output_list_is_void() {
        assert_eq!(deserialize_outputs("[]").unwrap(), ProcedureOutputs::Void);
        let outputs =
            deserialize_outputs(r#"[{"name":"answer","type":"INTEGER"}]"#).unwrap();
        assert_eq!(
            outputs,
            ProcedureOutputs::Fields(vec![FieldSpec::new("answer", FieldType::Integer)])
        );
    }

    #[test]
    fn lenient_type_on_deserialize() {
        let fields =
            deserialize_fields(r#"[{"name":"xx","type":"LIST? OF WIDGET?"}]"#).unwrap();
        assert_eq!(
            fields[0].field_type,
            FieldType::List(Box::new(FieldType::String))
        );
    }

    #[test]
    fn malformed_text_errors() {
        assert!(deserialize_fields("not json").is_err());
        assert!(deserialize_fields(r#"{"name":"xx"}"#).is_err());
        assert!(deserialize_fields(r#"[{"type":"MAP"}]"#).is_err());
    }

    #[test]
    fn default_shapes() {
        let inputs = default_inputs();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].name, "params");
        assert_eq!(inputs[0].default, Some(Value::empty_map()));

        let outputs = ProcedureOutputs::Fields(default_map_output());
        assert!(outputs.is_default_map_output());
        assert!(!ProcedureOutputs::Void.is_default_map_output());
    }
}
