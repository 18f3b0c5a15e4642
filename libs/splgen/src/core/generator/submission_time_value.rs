// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Submission-time values: the SPL composite parameters that carry
//! submission parameters into the generated application.

use serde_json::Value;

use crate::core::error::{Result, SplError};
use crate::core::graph::{Graph, MetaType, Parameter, SubmissionParameter};

use super::literals::{number_literal, spl_compatible_name, string_literal};

pub const MODIFIER_UNSIGNED: &str = "unsigned";
pub const MODIFIER_USTRING: &str = "ustring";

/// Composite parameter name for a submission parameter (`__spl_stv_<name>`).
pub fn composite_param_name(sp_name: &str) -> String {
    format!("__spl_stv_{}", spl_compatible_name(&sp_name.replace('.', "_")))
}

/// Expression referencing the composite parameter (`$__spl_stv_<name>`).
pub fn reference(sp_name: &str) -> String {
    format!("${}", composite_param_name(sp_name))
}

/// SPL meta type of a submission parameter, from `metaType` or, failing
/// that, from its carrier `valueClass` and type modifier.
pub fn meta_type(sp: &SubmissionParameter) -> Result<MetaType> {
    if let Some(meta) = &sp.meta_type {
        return meta.parse();
    }

    let class = sp.value_class.as_deref().ok_or_else(|| {
        SplError::UnmappedType(format!(
            "submission parameter '{}' has neither metaType nor valueClass",
            sp.name
        ))
    })?;
    let unsigned = sp.type_modifier.as_deref() == Some(MODIFIER_UNSIGNED);
    let meta = match class.strip_prefix("java.lang.").unwrap_or(class) {
        "String" if sp.type_modifier.as_deref() == Some(MODIFIER_USTRING) => MetaType::UString,
        "String" => MetaType::RString,
        "Boolean" => MetaType::Boolean,
        "Byte" if unsigned => MetaType::UInt8,
        "Byte" => MetaType::Int8,
        "Short" if unsigned => MetaType::UInt16,
        "Short" => MetaType::Int16,
        "Integer" if unsigned => MetaType::UInt32,
        "Integer" => MetaType::Int32,
        "Long" if unsigned => MetaType::UInt64,
        "Long" => MetaType::Int64,
        "Float" => MetaType::Float32,
        "Double" => MetaType::Float64,
        other => {
            return Err(SplError::UnmappedType(format!(
                "submission parameter '{}' has unsupported value class '{}'",
                sp.name, other
            )));
        }
    };
    Ok(meta)
}

/// Main composite definition, reading the value at submission time:
///
/// `expression<int32> $__spl_stv_width : (int32) getSubmissionTimeValue("width", "3")`
pub fn main_def(sp: &SubmissionParameter) -> Result<String> {
    let meta = meta_type(sp)?;
    let spl_type = meta.spl_type();
    let name = string_literal(&sp.name);

    let lookup = match &sp.default_value {
        None => format!("({}) getSubmissionTimeValue({})", spl_type, name),
        Some(default) => {
            let default = if meta.is_unsigned() {
                format!("(rstring) {}", number_literal(default, meta)?)
            } else {
                string_literal(&default_text(default))
            };
            format!("({}) getSubmissionTimeValue({}, {})", spl_type, name, default)
        }
    };
    Ok(format!(
        "expression<{}> {} : {}",
        spl_type,
        reference(&sp.name),
        lookup
    ))
}

/// Inner composite declaration: `expression<int32> $__spl_stv_width`.
pub fn inner_def(sp: &SubmissionParameter) -> Result<String> {
    Ok(format!(
        "expression<{}> {}",
        meta_type(sp)?.spl_type(),
        reference(&sp.name)
    ))
}

fn default_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Values of the `submissionParamNames` / `submissionParamValues` operator
/// parameters handed to functional operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamsInfo {
    /// `"a", "b"`
    pub names: String,
    /// `(rstring) $__spl_stv_a, (rstring) $__spl_stv_b`
    pub values: String,
}

/// Every submission parameter a graph declares, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct SubmissionTimeValues {
    params: Vec<SubmissionParameter>,
}

impl SubmissionTimeValues {
    /// Collect the graph level submission parameters.
    ///
    /// Any other kind of graph parameter is rejected: the main composite can
    /// only declare submission-time values.
    pub fn from_graph(graph: &Graph) -> Result<Self> {
        let mut stv = Self::default();
        for (name, param) in graph.parameters.iter() {
            match param {
                Parameter::Submission(sp) => stv.add(sp),
                _ => {
                    return Err(SplError::UnmappedType(format!(
                        "graph parameter '{}' is not a submission parameter",
                        name
                    )));
                }
            }
        }
        Ok(stv)
    }

    fn add(&mut self, sp: &SubmissionParameter) {
        if !self.params.iter().any(|p| p.name == sp.name) {
            self.params.push(sp.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn all(&self) -> &[SubmissionParameter] {
        &self.params
    }

    /// Names and value expressions for functional operators, `None` when
    /// the graph has no submission parameters.
    pub fn params_info(&self) -> Option<ParamsInfo> {
        if self.params.is_empty() {
            return None;
        }
        let names: Vec<String> = self.params.iter().map(|p| string_literal(&p.name)).collect();
        let values: Vec<String> = self
            .params
            .iter()
            .map(|p| format!("(rstring) {}", reference(&p.name)))
            .collect();
        Some(ParamsInfo {
            names: names.join(", "),
            values: values.join(", "),
        })
    }
}
