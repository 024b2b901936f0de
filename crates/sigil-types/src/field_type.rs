use std::borrow::Cow;
use std::fmt;

/// Declared type of a procedure/function field. Closed scalar set plus
/// arbitrarily nested lists. The wire/persisted rendering is the
/// canonical upper-case name from `type_name`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum FieldType {
    Any,
    Map,
    Node,
    Relationship,
    Path,
    Number,
    Integer,
    Float,
    Boolean,
    String,
    Date,
    Time,
    LocalTime,
    DateTime,
    LocalDateTime,
    Duration,
    Point,
    Geometry,
    List(Box<FieldType>),
}

impl FieldType {
    /// Canonical upper-case type name used in persisted signatures and
    /// error messages.
    pub fn type_name(&self) -> Cow<'static, str> {
        match self {
            Self::Any => "ANY".into(),
            Self::Map => "MAP".into(),
            Self::Node => "NODE".into(),
            Self::Relationship => "RELATIONSHIP".into(),
            Self::Path => "PATH".into(),
            Self::Number => "NUMBER".into(),
            Self::Integer => "INTEGER".into(),
            Self::Float => "FLOAT".into(),
            Self::Boolean => "BOOLEAN".into(),
            Self::String => "STRING".into(),
            Self::Date => "DATE".into(),
            Self::Time => "TIME".into(),
            Self::LocalTime => "LOCALTIME".into(),
            Self::DateTime => "DATETIME".into(),
            Self::LocalDateTime => "LOCALDATETIME".into(),
            Self::Duration => "DURATION".into(),
            Self::Point => "POINT".into(),
            Self::Geometry => "GEOMETRY".into(),
            Self::List(inner) => format!("LIST OF {}", inner.type_name()).into(),
        }
    }

    /// Lower-case rendering used when listing definitions back to users.
    pub fn pretty_name(&self) -> String {
        self.type_name().to_lowercase()
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Element type for lists, `None` otherwise.
    pub fn element_type(&self) -> Option<&FieldType> {
        match self {
            Self::List(inner) => Some(inner),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Map a declared type name onto a `FieldType`.
///
/// Deliberately lenient: matching is case-insensitive, a trailing `?`
/// (nullability marker) is ignored, and an unrecognized base name falls
/// back to `STRING` rather than failing. Lists are accepted in all three
/// spellings `LIST OF x`, `LIST<x>`, and `LIST x`.
pub fn type_of(name: &str) -> FieldType {
    let cleaned = name.replace('?', "");
    let upper = cleaned.trim().to_uppercase();
    type_of_inner(&upper)
}

fn type_of_inner(s: &str) -> FieldType {
    if let Some(inner) = s.strip_prefix("LIST OF ") {
        return FieldType::List(Box::new(type_of_inner(inner.trim())));
    }
    if let Some(inner) = s.strip_prefix("LIST<") {
        if let Some(inner) = inner.strip_suffix('>') {
            return FieldType::List(Box::new(type_of_inner(inner.trim())));
        }
    }
    if let Some(inner) = s.strip_prefix("LIST ") {
        return FieldType::List(Box::new(type_of_inner(inner.trim())));
    }

    match s {
        "ANY" => FieldType::Any,
        // MAPRESULT is the pseudo-type a function may declare to return
        // raw row maps; the type itself is plain MAP.
        "MAP" | "MAPRESULT" => FieldType::Map,
        "NODE" => FieldType::Node,
        "REL" | "RELATIONSHIP" | "EDGE" => FieldType::Relationship,
        "PATH" => FieldType::Path,
        "NUMBER" => FieldType::Number,
        "INT" | "LONG" | "INTEGER" => FieldType::Integer,
        "FLOAT" | "DOUBLE" => FieldType::Float,
        "BOOL" | "BOOLEAN" => FieldType::Boolean,
        "DATE" => FieldType::Date,
        "TIME" => FieldType::Time,
        "LOCALTIME" => FieldType::LocalTime,
        "DATETIME" => FieldType::DateTime,
        "LOCALDATETIME" => FieldType::LocalDateTime,
        "DURATION" => FieldType::Duration,
        "POINT" => FieldType::Point,
        "GEO" | "GEOMETRY" => FieldType::Geometry,
        // STRING, TEXT, and everything unrecognized.
        _ => FieldType::String,
    }
}

/// True when a value of this declared type should be returned as the raw
/// row map instead of being unwrapped to a single column. Only an exact
/// MAP qualifies, and the `map_result` hint turns wrapping off.
pub fn is_wrapped(ty: &FieldType, map_result: bool) -> bool {
    !map_result && *ty == FieldType::Map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_names() {
        assert_eq!(type_of("ANY"), FieldType::Any);
        assert_eq!(type_of("MAP"), FieldType::Map);
        assert_eq!(type_of("NODE"), FieldType::Node);
        assert_eq!(type_of("REL"), FieldType::Relationship);
        assert_eq!(type_of("RELATIONSHIP"), FieldType::Relationship);
        assert_eq!(type_of("EDGE"), FieldType::Relationship);
        assert_eq!(type_of("PATH"), FieldType::Path);
        assert_eq!(type_of("NUMBER"), FieldType::Number);
        assert_eq!(type_of("INT"), FieldType::Integer);
        assert_eq!(type_of("LONG"), FieldType::Integer);
        assert_eq!(type_of("INTEGER"), FieldType::Integer);
        assert_eq!(type_of("FLOAT"), FieldType::Float);
        assert_eq!(type_of("DOUBLE"), FieldType::Float);
        assert_eq!(type_of("BOOL"), FieldType::Boolean);
        assert_eq!(type_of("DATE"), FieldType::Date);
        assert_eq!(type_of("LOCALDATETIME"), FieldType::LocalDateTime);
        assert_eq!(type_of("DURATION"), FieldType::Duration);
        assert_eq!(type_of("POINT"), FieldType::Point);
        assert_eq!(type_of("GEO"), FieldType::Geometry);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(type_of("integer"), FieldType::Integer);
        assert_eq!(type_of("Boolean"), FieldType::Boolean);
        assert_eq!(type_of("  string  "), FieldType::String);
    }

    #[test]
    fn nullability_suffix_stripped() {
        assert_eq!(type_of("INTEGER?"), FieldType::Integer);
        assert_eq!(
            type_of("LIST? OF INTEGER?"),
            FieldType::List(Box::new(FieldType::Integer))
        );
    }

    #[test]
    fn list_spellings() {
        let expected = FieldType::List(Box::new(FieldType::Integer));
        assert_eq!(type_of("LIST OF INTEGER"), expected);
        assert_eq!(type_of("LIST<INTEGER>"), expected);
        assert_eq!(type_of("LIST INTEGER"), expected);
        assert_eq!(type_of("list of int"), expected);
    }

    #[test]
    fn nested_lists() {
        assert_eq!(
            type_of("LIST OF LIST OF STRING"),
            FieldType::List(Box::new(FieldType::List(Box::new(FieldType::String))))
        );
    }

    #[test]
    fn unknown_falls_back_to_string() {
        assert_eq!(type_of("FOOBAR"), FieldType::String);
        assert_eq!(type_of("TEXT"), FieldType::String);
        assert_eq!(
            type_of("LIST OF FOOBAR"),
            FieldType::List(Box::new(FieldType::String))
        );
    }

    #[test]
    fn mapresult_is_map() {
        assert_eq!(type_of("MAPRESULT"), FieldType::Map);
    }

    #[test]
    fn type_name_round_trip() {
        let ty = FieldType::List(Box::new(FieldType::Integer));
        assert_eq!(ty.type_name(), "LIST OF INTEGER");
        assert_eq!(type_of(&ty.type_name()), ty);
        assert_eq!(ty.pretty_name(), "list of integer");
    }

    #[test]
    fn wrapped_detection() {
        assert!(is_wrapped(&FieldType::Map, false));
        assert!(!is_wrapped(&FieldType::Map, true));
        assert!(!is_wrapped(&FieldType::Node, false));
        assert!(!is_wrapped(
            &FieldType::List(Box::new(FieldType::Map)),
            false
        ));
    }
}
