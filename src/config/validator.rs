use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;

use super::loader::{Rule, TemplateAstNode};

/// Configuration validation error type
#[derive(Debug)]
pub enum ConfigError {
    InvalidCount,
    InvalidThreadCount,
    TemplateParseError(String),
    NoFields,
    EmptyFieldName,
    DuplicateFieldName(String),
    UnknownFunction { field: String, name: String },
    TooManyArguments { field: String, name: String, max: usize, got: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidCount => write!(f, "count must be at least 1"),
            ConfigError::InvalidThreadCount => write!(f, "Thread count must be at least 1"),
            ConfigError::TemplateParseError(e) => write!(f, "Template parsing error: {}", e),
            ConfigError::NoFields => write!(f, "No fields specified in configuration"),
            ConfigError::EmptyFieldName => write!(f, "Field names must not be empty"),
            ConfigError::DuplicateFieldName(name) => {
                write!(f, "Duplicate field name: '{}'", name)
            }
            ConfigError::UnknownFunction { field, name } => {
                write!(f, "Field '{}': unknown template function '{}'", field, name)
            }
            ConfigError::TooManyArguments { field, name, max, got } => {
                write!(
                    f,
                    "Field '{}': function '{}' takes at most {} argument(s), got {}",
                    field, name, max, got
                )?;
                if let Some(spec) = builtin_function(name) {
                    write!(f, " ({})", spec.arg_desc)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<pest::error::Error<Rule>> for ConfigError {
    fn from(e: pest::error::Error<Rule>) -> Self {
        ConfigError::TemplateParseError(e.to_string())
    }
}

// --- Template Function Registry ---

/// Signature of a built-in template function: arity bound plus the argument
/// description surfaced in validation errors.
pub struct FunctionSpec {
    pub max_args: usize,
    pub arg_desc: &'static str,
}

lazy_static! {
    static ref BUILTIN_FUNCTIONS: HashMap<&'static str, FunctionSpec> = {
        let mut registry = HashMap::new();
        registry.insert(
            "hkid",
            FunctionSpec {
                max_args: 1,
                arg_desc: "candidate pool for the leading letter, \
                           default QWERTYUIOPASDGFHJKLZXCVBNM",
            },
        );
        registry.insert(
            "prcid",
            FunctionSpec {
                max_args: 1,
                arg_desc: "birth date in yyyyMMdd form, default 19921225",
            },
        );
        registry
    };
}

pub fn builtin_function(name: &str) -> Option<&'static FunctionSpec> {
    BUILTIN_FUNCTIONS.get(name)
}

// --- AST Validation Logic ---

/// Validates a compiled template AST: every function call must name a
/// registered function and stay within its arity bound.
pub fn validate_template(field_name: &str, node: &TemplateAstNode) -> Result<(), ConfigError> {
    match node {
        TemplateAstNode::Static(_) => Ok(()),
        TemplateAstNode::FunctionCall { name, args } => {
            let spec = builtin_function(name).ok_or_else(|| ConfigError::UnknownFunction {
                field: field_name.to_string(),
                name: name.clone(),
            })?;
            if args.len() > spec.max_args {
                return Err(ConfigError::TooManyArguments {
                    field: field_name.to_string(),
                    name: name.clone(),
                    max: spec.max_args,
                    got: args.len(),
                });
            }
            for arg in args {
                validate_template(field_name, arg)?;
            }
            Ok(())
        }
        TemplateAstNode::Root(nodes) => {
            for n in nodes {
                validate_template(field_name, n)?;
            }
            Ok(())
        }
    }
}
