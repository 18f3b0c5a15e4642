// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Typed operator and composite parameters.
//!
//! The document form is `{"value": ..., "type": ...}`; the `type` tag selects
//! how the value is rendered as SPL.

use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::core::error::{Result, SplError};

/// SPL primitive meta types a literal can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Boolean,
    RString,
    UString,
}

impl MetaType {
    pub const ALL: [MetaType; 13] = [
        MetaType::Int8,
        MetaType::Int16,
        MetaType::Int32,
        MetaType::Int64,
        MetaType::UInt8,
        MetaType::UInt16,
        MetaType::UInt32,
        MetaType::UInt64,
        MetaType::Float32,
        MetaType::Float64,
        MetaType::Boolean,
        MetaType::RString,
        MetaType::UString,
    ];

    /// Name used in the graph document (`"UINT32"`).
    pub fn name(self) -> &'static str {
        match self {
            Self::Int8 => "INT8",
            Self::Int16 => "INT16",
            Self::Int32 => "INT32",
            Self::Int64 => "INT64",
            Self::UInt8 => "UINT8",
            Self::UInt16 => "UINT16",
            Self::UInt32 => "UINT32",
            Self::UInt64 => "UINT64",
            Self::Float32 => "FLOAT32",
            Self::Float64 => "FLOAT64",
            Self::Boolean => "BOOLEAN",
            Self::RString => "RSTRING",
            Self::UString => "USTRING",
        }
    }

    /// SPL type name (`"uint32"`).
    pub fn spl_type(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Boolean => "boolean",
            Self::RString => "rstring",
            Self::UString => "ustring",
        }
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64
        )
    }
}

impl FromStr for MetaType {
    type Err = SplError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| SplError::UnmappedType(format!("SPL meta type '{}'", s)))
    }
}

impl fmt::Display for MetaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parameter whose value is supplied when the job is submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionParameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_modifier: Option<String>,
}

impl From<SubmissionParameter> for Value {
    fn from(sp: SubmissionParameter) -> Self {
        let mut map = Map::new();
        map.insert("name".into(), Value::String(sp.name));
        let optional = [
            ("metaType", sp.meta_type.map(Value::String)),
            ("valueClass", sp.value_class.map(Value::String)),
            ("defaultValue", sp.default_value),
            ("typeModifier", sp.type_modifier.map(Value::String)),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                map.insert(key.into(), value);
            }
        }
        Value::Object(map)
    }
}

pub const TYPE_SPL_VALUE: &str = "__spl_value";
pub const TYPE_ENUM: &str = "enum";
pub const TYPE_SPL_TYPE: &str = "spltype";
pub const TYPE_ATTRIBUTE: &str = "attribute";
pub const TYPE_SPL_EXPRESSION: &str = "splexpr";
pub const TYPE_SUBMISSION_PARAMETER: &str = "submissionParameter";

/// Operator, composite or output-assignment parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParameter", into = "RawParameter")]
pub enum Parameter {
    /// Untagged JSON literal (string, number, boolean or array of those).
    Literal(Value),
    /// Literal with an explicit SPL meta type.
    Typed { meta_type: MetaType, value: Value },
    Enum(String),
    SplType(String),
    Attribute(String),
    /// Raw SPL expression, emitted verbatim.
    Expression(String),
    Submission(SubmissionParameter),
}

impl Parameter {
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    pub fn expression(text: impl Into<String>) -> Self {
        Self::Expression(text.into())
    }

    pub fn as_submission(&self) -> Option<&SubmissionParameter> {
        match self {
            Self::Submission(sp) => Some(sp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawParameter {
    value: Value,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
}

fn symbol(kind: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(SplError::UnmappedType(format!(
            "'{}' parameter must be a string, got {}",
            kind, other
        ))),
    }
}

impl TryFrom<RawParameter> for Parameter {
    type Error = SplError;

    fn try_from(raw: RawParameter) -> Result<Self> {
        let Some(kind) = raw.kind else {
            return Ok(Parameter::Literal(raw.value));
        };

        match kind.as_str() {
            TYPE_SPL_VALUE => {
                let Value::Object(mut wrapped) = raw.value else {
                    return Err(SplError::UnmappedType(format!(
                        "'{}' parameter must be an object",
                        TYPE_SPL_VALUE
                    )));
                };
                let meta_type = match wrapped.remove("metaType") {
                    Some(Value::String(m)) => m.parse()?,
                    _ => {
                        return Err(SplError::UnmappedType(format!(
                            "'{}' parameter without metaType",
                            TYPE_SPL_VALUE
                        )));
                    }
                };
                let value = wrapped.remove("value").unwrap_or(Value::Null);
                Ok(Parameter::Typed { meta_type, value })
            }
            TYPE_ENUM => Ok(Parameter::Enum(symbol(&kind, raw.value)?)),
            TYPE_SPL_TYPE => Ok(Parameter::SplType(symbol(&kind, raw.value)?)),
            TYPE_ATTRIBUTE => Ok(Parameter::Attribute(symbol(&kind, raw.value)?)),
            TYPE_SPL_EXPRESSION => Ok(Parameter::Expression(symbol(&kind, raw.value)?)),
            TYPE_SUBMISSION_PARAMETER => {
                Ok(Parameter::Submission(serde_json::from_value(raw.value)?))
            }
            other => Ok(Parameter::Typed {
                meta_type: other.parse()?,
                value: raw.value,
            }),
        }
    }
}

impl From<Parameter> for RawParameter {
    fn from(param: Parameter) -> Self {
        let (kind, value) = match param {
            Parameter::Literal(v) => (None, v),
            Parameter::Typed { meta_type, value } => (Some(meta_type.name().to_string()), value),
            Parameter::Enum(s) => (Some(TYPE_ENUM.to_string()), Value::String(s)),
            Parameter::SplType(s) => (Some(TYPE_SPL_TYPE.to_string()), Value::String(s)),
            Parameter::Attribute(s) => (Some(TYPE_ATTRIBUTE.to_string()), Value::String(s)),
            Parameter::Expression(s) => (Some(TYPE_SPL_EXPRESSION.to_string()), Value::String(s)),
            Parameter::Submission(sp) => (
                Some(TYPE_SUBMISSION_PARAMETER.to_string()),
                Value::from(sp),
            ),
        };
        RawParameter { value, kind }
    }
}

/// Name-ordered parameter map. Order is preserved from the document and
/// drives emission order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Parameters(Vec<(String, Parameter)>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert or replace, keeping the original position on replace.
    pub fn insert(&mut self, name: impl Into<String>, param: Parameter) {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = param,
            None => self.0.push((name, param)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Parameter> {
        let pos = self.0.iter().position(|(n, _)| n == name)?;
        Some(self.0.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.0.iter().map(|(n, p)| (n.as_str(), p))
    }
}

impl TryFrom<Map<String, Value>> for Parameters {
    type Error = SplError;

    fn try_from(map: Map<String, Value>) -> Result<Self> {
        let mut params = Vec::with_capacity(map.len());
        for (name, value) in map {
            params.push((name, serde_json::from_value(value)?));
        }
        Ok(Self(params))
    }
}

impl Serialize for Parameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, param) in &self.0 {
            map.serialize_entry(name, param)?;
        }
        map.end()
    }
}

impl FromIterator<(String, Parameter)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (String, Parameter)>>(iter: I) -> Self {
        let mut params = Parameters::new();
        for (name, param) in iter {
            params.insert(name, param);
        }
        params
    }
}
