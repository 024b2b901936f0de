//! Signature grammar for custom procedures and functions.
//!
//! Procedures: `name(arg = default :: TYPE, ...) :: (out :: TYPE, ...)`
//! with `VOID` (or an empty result list) for procedures that yield no
//! rows. Functions: `name(arg :: TYPE, ...) :: TYPE`. Type annotations
//! accept `::` or `:`, and the default and the annotation of a
//! parameter may appear in either order.
//!
//! Every error found in one signature (lexical, syntactic, name too
//! short, malformed default) is collected and reported in a single
//! combined diagnostic.

use chumsky::prelude::*;
use smol_str::SmolStr;

use sigil_common::{SigilError, SigilResult};
use sigil_types::{
    type_of, FieldSpec, FieldType, FunctionSignature, Mode, ProcedureOutputs,
    ProcedureSignature, QualifiedName, Value, ROOT_PREFIX,
};

use crate::error::{combined_diagnostic, SignatureError};
use crate::lexer::Lexer;
use crate::span::{Span, Spanned};
use crate::token::Token;

type ParserError = Simple<Token>;

// ---------------------------------------------------------------------------
// AST
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct SignatureName {
    namespace: Vec<Spanned<SmolStr>>,
    name: Spanned<SmolStr>,
}

#[derive(Debug, Clone)]
struct TypeAst {
    ty: FieldType,
    /// Set when the raw text used the MAPRESULT pseudo-type.
    map_result: bool,
}

#[derive(Debug, Clone)]
enum ValueAst {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(SmolStr),
    List(Vec<ValueAst>),
    Map(Vec<(SmolStr, ValueAst)>),
}

#[derive(Debug, Clone)]
struct ParamAst {
    name: Spanned<SmolStr>,
    ty: Option<TypeAst>,
    default: Option<Spanned<ValueAst>>,
}

#[derive(Debug, Clone)]
struct FieldAst {
    name: Spanned<SmolStr>,
    ty: Option<TypeAst>,
}

#[derive(Debug, Clone)]
enum ResultsAst {
    Void,
    Fields(Vec<FieldAst>),
}

#[derive(Debug, Clone)]
struct ProcedureAst {
    name: SignatureName,
    params: Vec<ParamAst>,
    results: ResultsAst,
}

#[derive(Debug, Clone)]
struct FunctionAst {
    name: SignatureName,
    params: Vec<ParamAst>,
    output: TypeAst,
}

// ---------------------------------------------------------------------------
// Combinators
// ---------------------------------------------------------------------------

fn ident() -> impl Parser<Token, Spanned<SmolStr>, Error = ParserError> + Clone {
    select! { Token::Ident(name) => name }.map_with_span(|n, s| (n, s))
}

/// Match a specific bare word, case-insensitive.
fn keyword(word: &'static str) -> impl Parser<Token, (), Error = ParserError> + Clone {
    filter_map(move |span, tok| match tok {
        Token::Ident(ref name) if name.eq_ignore_ascii_case(word) => Ok(()),
        tok => Err(Simple::expected_input_found(
            span,
            vec![Some(Token::Ident(SmolStr::new(word)))],
            Some(tok),
        )),
    })
}

fn type_parser() -> impl Parser<Token, TypeAst, Error = ParserError> + Clone {
    recursive(|ty| {
        let base = select! { Token::Ident(name) => name }.map(|name: SmolStr| TypeAst {
            map_result: name.eq_ignore_ascii_case("MAPRESULT"),
            ty: type_of(&name),
        });

        let list = keyword("LIST")
            .ignore_then(keyword("OF").or_not())
            .ignore_then(ty)
            .map(|inner: TypeAst| TypeAst {
                ty: FieldType::List(Box::new(inner.ty)),
                map_result: inner.map_result,
            });

        choice((list, base)).then_ignore(just(Token::Question).or_not())
    })
}

fn value_parser() -> impl Parser<Token, ValueAst, Error = ParserError> + Clone {
    recursive(|value| {
        let literal = select! {
            Token::Null => ValueAst::Null,
            Token::True => ValueAst::Bool(true),
            Token::False => ValueAst::Bool(false),
            Token::Integer(v) => ValueAst::Int(v),
            Token::Float(text) => ValueAst::Float(text.parse().unwrap_or(f64::NAN)),
            Token::Str(s) => ValueAst::Str(s),
            Token::Ident(s) => ValueAst::Str(s),
        };

        let list = value
            .clone()
            .separated_by(just(Token::Comma))
            .delimited_by(just(Token::LeftBracket), just(Token::RightBracket))
            .map(ValueAst::List);

        let key = select! {
            Token::Ident(k) => k,
            Token::Str(k) => k,
        };
        let map = key
            .then_ignore(just(Token::Colon))
            .then(value)
            .separated_by(just(Token::Comma))
            .delimited_by(just(Token::LeftBrace), just(Token::RightBrace))
            .map(ValueAst::Map);

        choice((list, map, literal))
    })
}

/// `name [= default] [:: type]`, with default and annotation accepted in
/// either order.
fn param() -> impl Parser<Token, ParamAst, Error = ParserError> + Clone {
    let annotation = just(Token::ColonColon)
        .or(just(Token::Colon))
        .ignore_then(type_parser());
    let default = just(Token::Eq).ignore_then(value_parser().map_with_span(|v, s| (v, s)));

    let tail = choice((
        annotation
            .clone()
            .then(default.clone().or_not())
            .map(|(ty, default)| (Some(ty), default)),
        default
            .then(annotation.or_not())
            .map(|(default, ty)| (ty, Some(default))),
    ))
    .or_not()
    .map(Option::unwrap_or_default);

    ident()
        .then(tail)
        .map(|(name, (ty, default))| ParamAst { name, ty, default })
}

fn param_list() -> impl Parser<Token, Vec<ParamAst>, Error = ParserError> + Clone {
    param()
        .separated_by(just(Token::Comma))
        .delimited_by(just(Token::LeftParen), just(Token::RightParen))
}

fn results_parser() -> impl Parser<Token, ResultsAst, Error = ParserError> + Clone {
    let annotation = just(Token::ColonColon)
        .or(just(Token::Colon))
        .ignore_then(type_parser());
    let field = ident()
        .then(annotation.or_not())
        .map(|(name, ty)| FieldAst { name, ty });

    let fields = field
        .separated_by(just(Token::Comma))
        .delimited_by(just(Token::LeftParen), just(Token::RightParen))
        .map(|fields| {
            // An empty result list means the procedure yields no rows.
            if fields.is_empty() {
                ResultsAst::Void
            } else {
                ResultsAst::Fields(fields)
            }
        });

    keyword("VOID").to(ResultsAst::Void).or(fields)
}

fn signature_name() -> impl Parser<Token, SignatureName, Error = ParserError> + Clone {
    ident()
        .separated_by(just(Token::Dot))
        .at_least(1)
        .map(|mut parts| {
            let name = parts.pop().unwrap();
            SignatureName {
                namespace: parts,
                name,
            }
        })
}

fn procedure_parser() -> impl Parser<Token, ProcedureAst, Error = ParserError> {
    signature_name()
        .then(param_list())
        .then_ignore(just(Token::ColonColon))
        .then(results_parser())
        .map(|((name, params), results)| ProcedureAst {
            name,
            params,
            results,
        })
        .labelled("procedure signature")
}

fn function_parser() -> impl Parser<Token, FunctionAst, Error = ParserError> {
    signature_name()
        .then(param_list())
        .then_ignore(just(Token::ColonColon))
        .then(type_parser())
        .map(|((name, params), output)| FunctionAst {
            name,
            params,
            output,
        })
        .labelled("function signature")
}

fn run_parser<T>(
    text: &str,
    parser: impl Parser<Token, T, Error = ParserError>,
) -> (Option<T>, Vec<SignatureError>) {
    let (tokens, lex_errors) = Lexer::new(text).lex();
    let mut errors: Vec<SignatureError> = lex_errors
        .into_iter()
        .map(|e| SignatureError::new(e.span, e.message))
        .collect();

    let len = text.len();
    let stream = chumsky::Stream::from_iter(
        len..len + 1,
        tokens
            .into_iter()
            .filter(|(tok, _)| !matches!(tok, Token::Eof)),
    );
    let (ast, parse_errors) = parser.then_ignore(end()).parse_recovery(stream);
    errors.extend(parse_errors.into_iter().map(SignatureError::from_chumsky));
    (ast, errors)
}

// ---------------------------------------------------------------------------
// Default value conversion
// ---------------------------------------------------------------------------

/// Convert a default literal against the declared field type.
///
/// A STRING target stringifies scalar literals (so `xx :: STRING = 1`
/// yields the default `"1"`). Types with no literal form (nodes, paths,
/// temporals, points) silently get no default. A literal that cannot be
/// read as the declared type is an error, collected with the rest.
fn convert_default(ast: &ValueAst, ty: &FieldType) -> Result<Option<Value>, String> {
    if matches!(ast, ValueAst::Null) {
        return Ok(Some(Value::Null));
    }
    match ty {
        FieldType::Any => Ok(Some(convert_any(ast))),
        FieldType::Map => match ast {
            ValueAst::Map(_) => Ok(Some(convert_any(ast))),
            _ => Err(malformed(ast, ty)),
        },
        FieldType::String => match ast {
            ValueAst::Str(text) => Ok(Some(Value::string(text))),
            ValueAst::Int(v) => Ok(Some(Value::string(v.to_string()))),
            ValueAst::Float(v) => Ok(Some(Value::string(v.to_string()))),
            ValueAst::Bool(b) => Ok(Some(Value::string(b.to_string()))),
            _ => Err(malformed(ast, ty)),
        },
        FieldType::Integer => match ast {
            ValueAst::Int(v) => Ok(Some(Value::Integer(*v))),
            _ => Err(malformed(ast, ty)),
        },
        FieldType::Float => match ast {
            ValueAst::Int(v) => Ok(Some(Value::Float(*v as f64))),
            ValueAst::Float(v) => Ok(Some(Value::Float(*v))),
            _ => Err(malformed(ast, ty)),
        },
        FieldType::Number => match ast {
            ValueAst::Int(v) => Ok(Some(Value::Integer(*v))),
            ValueAst::Float(v) => Ok(Some(Value::Float(*v))),
            _ => Err(malformed(ast, ty)),
        },
        FieldType::Boolean => match ast {
            ValueAst::Bool(b) => Ok(Some(Value::Boolean(*b))),
            _ => Err(malformed(ast, ty)),
        },
        FieldType::List(inner) => match ast {
            ValueAst::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    match convert_default(item, inner)? {
                        Some(value) => values.push(value),
                        None => return Err(malformed(ast, ty)),
                    }
                }
                Ok(Some(Value::List(values)))
            }
            _ => Err(malformed(ast, ty)),
        },
        // No literal form for these.
        FieldType::Node
        | FieldType::Relationship
        | FieldType::Path
        | FieldType::Date
        | FieldType::Time
        | FieldType::LocalTime
        | FieldType::DateTime
        | FieldType::LocalDateTime
        | FieldType::Duration
        | FieldType::Point
        | FieldType::Geometry => Ok(None),
    }
}

fn convert_any(ast: &ValueAst) -> Value {
    match ast {
        ValueAst::Null => Value::Null,
        ValueAst::Bool(b) => Value::Boolean(*b),
        ValueAst::Int(v) => Value::Integer(*v),
        ValueAst::Float(v) => Value::Float(*v),
        ValueAst::Str(s) => Value::String(s.clone()),
        ValueAst::List(items) => Value::List(items.iter().map(convert_any).collect()),
        ValueAst::Map(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), convert_any(v)))
                .collect(),
        ),
    }
}

fn malformed(ast: &ValueAst, ty: &FieldType) -> String {
    format!(
        "malformed default value {} for type {}",
        describe_value(ast),
        ty.type_name()
    )
}

fn describe_value(ast: &ValueAst) -> String {
    match ast {
        ValueAst::Null => "null".to_string(),
        ValueAst::Bool(b) => b.to_string(),
        ValueAst::Int(v) => v.to_string(),
        ValueAst::Float(v) => v.to_string(),
        ValueAst::Str(s) => format!("'{s}'"),
        ValueAst::List(_) => "list literal".to_string(),
        ValueAst::Map(_) => "map literal".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Facade
// ---------------------------------------------------------------------------

/// Parses signature definitions under a fixed root namespace prefix.
pub struct Signatures {
    prefix: SmolStr,
}

impl Default for Signatures {
    fn default() -> Self {
        Self::new()
    }
}

impl Signatures {
    pub fn new() -> Self {
        Self::with_prefix(ROOT_PREFIX)
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: SmolStr::new(prefix),
        }
    }

    /// Parse a procedure signature definition.
    pub fn procedure(
        &self,
        text: &str,
        mode: Mode,
        description: Option<&str>,
    ) -> SigilResult<ProcedureSignature> {
        let (ast, mut errors) = run_parser(text, procedure_parser());
        let signature =
            ast.and_then(|ast| self.build_procedure(ast, mode, description, &mut errors));
        match signature {
            Some(signature) if errors.is_empty() => Ok(signature),
            _ => Err(SigilError::Signature(combined_diagnostic(text, &errors))),
        }
    }

    /// Parse a function signature definition. The second value is the
    /// `map_result` hint set by the MAPRESULT pseudo-type.
    pub fn function(
        &self,
        text: &str,
        description: Option<&str>,
    ) -> SigilResult<(FunctionSignature, bool)> {
        let (ast, mut errors) = run_parser(text, function_parser());
        let signature = ast.and_then(|ast| self.build_function(ast, description, &mut errors));
        match signature {
            Some(signature) if errors.is_empty() => Ok(signature),
            _ => Err(SigilError::Signature(combined_diagnostic(text, &errors))),
        }
    }

    fn build_procedure(
        &self,
        ast: ProcedureAst,
        mode: Mode,
        description: Option<&str>,
        errors: &mut Vec<SignatureError>,
    ) -> Option<ProcedureSignature> {
        self.check_signature_name(&ast.name, errors);
        let inputs = build_inputs(&ast.params, errors);
        let outputs = match ast.results {
            ResultsAst::Void => ProcedureOutputs::Void,
            ResultsAst::Fields(fields) => {
                let fields = fields
                    .into_iter()
                    .map(|field| {
                        check_name(&field.name, errors);
                        let ty = field.ty.map(|t| t.ty).unwrap_or(FieldType::Any);
                        FieldSpec::new(field.name.0.as_str(), ty)
                    })
                    .collect();
                ProcedureOutputs::Fields(fields)
            }
        };
        if !errors.is_empty() {
            return None;
        }
        Some(ProcedureSignature {
            name: self.qualify(&ast.name),
            inputs,
            outputs,
            mode,
            description: description.map(SmolStr::new),
        })
    }

    fn build_function(
        &self,
        ast: FunctionAst,
        description: Option<&str>,
        errors: &mut Vec<SignatureError>,
    ) -> Option<(FunctionSignature, bool)> {
        self.check_signature_name(&ast.name, errors);
        let inputs = build_inputs(&ast.params, errors);
        if !errors.is_empty() {
            return None;
        }
        Some((
            FunctionSignature {
                name: self.qualify(&ast.name),
                inputs,
                output: ast.output.ty,
                description: description.map(SmolStr::new),
            },
            ast.output.map_result,
        ))
    }

    fn check_signature_name(&self, name: &SignatureName, errors: &mut Vec<SignatureError>) {
        for segment in &name.namespace {
            check_name(segment, errors);
        }
        check_name(&name.name, errors);
    }

    fn qualify(&self, name: &SignatureName) -> QualifiedName {
        let mut namespace = Vec::with_capacity(name.namespace.len() + 1);
        namespace.push(self.prefix.clone());
        namespace.extend(name.namespace.iter().map(|(segment, _)| segment.clone()));
        QualifiedName::new(namespace, name.name.0.as_str())
    }
}

fn build_inputs(params: &[ParamAst], errors: &mut Vec<SignatureError>) -> Vec<FieldSpec> {
    params
        .iter()
        .map(|param| {
            check_name(&param.name, errors);
            let ty = param
                .ty
                .as_ref()
                .map(|t| t.ty.clone())
                .unwrap_or(FieldType::Any);
            let mut field = FieldSpec::new(param.name.0.as_str(), ty.clone());
            if let Some((value, span)) = &param.default {
                check_map_keys(value, span, errors);
                match convert_default(value, &ty) {
                    Ok(default) => field.default = default,
                    Err(message) => errors.push(SignatureError::new(span.clone(), message)),
                }
            }
            field
        })
        .collect()
}

fn check_name(name: &Spanned<SmolStr>, errors: &mut Vec<SignatureError>) {
    if name.0.len() < 2 {
        errors.push(SignatureError::new(
            name.1.clone(),
            format!("invalid name '{}', must have at least 2 characters", name.0),
        ));
    }
}

fn check_map_keys(value: &ValueAst, span: &Span, errors: &mut Vec<SignatureError>) {
    match value {
        ValueAst::Map(entries) => {
            for (key, inner) in entries {
                if key.len() < 2 {
                    errors.push(SignatureError::new(
                        span.clone(),
                        format!("invalid map key '{key}', must have at least 2 characters"),
                    ));
                }
                check_map_keys(inner, span, errors);
            }
        }
        ValueAst::List(items) => {
            for item in items {
                check_map_keys(item, span, errors);
            }
        }
        _ => {}
    }
}
