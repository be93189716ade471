use super::validator::{self, ConfigError};
use pest::Parser;
use pest_derive::Parser;
use serde::Deserialize;
use std::collections::HashSet;
use std::{error::Error, fs, num::NonZeroUsize, thread};

// --- Pest Parser Setup ---

#[derive(Parser)]
#[grammar = "template.pest"] // Path relative to src
struct TemplateParser;

// --- AST Definition ---

// Represents the parsed structure of a field template
#[derive(Clone, Debug, PartialEq)]
pub enum TemplateAstNode {
    Static(String),
    FunctionCall {
        name: String,
        args: Vec<TemplateAstNode>,
    },
    // Represents the top-level sequence of nodes in a template
    Root(Vec<TemplateAstNode>),
}

// --- Configuration Structs ---

#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    pub count: Option<u64>,   // 生成记录条数
    pub threads: Option<usize>, // 生成线程数
    pub seed: Option<u64>,    // 固定随机种子，保证可复现
    pub quiet: Option<bool>,
    pub header: Option<bool>,
    pub delimiter: Option<String>,
    pub output_file: Option<String>,
    #[serde(rename = "Field")]
    pub fields: Option<Vec<RawField>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawField {
    pub name: String,
    pub template: String,
}

#[derive(Clone, Debug)]
pub struct RunConfig {
    pub count: u64,
    pub threads: usize,
    pub seed: Option<u64>,
    pub quiet: bool,
    pub header: bool,
    pub delimiter: String,
    pub output_file: Option<String>,
    pub fields: Vec<CompiledField>,
}

#[derive(Clone, Debug)]
pub struct CompiledField {
    pub name: String,
    pub template: TemplateAstNode,
}

// --- Parsing Logic ---

// Parses a template string into an AST using Pest
pub(crate) fn parse_template_string(input: &str) -> Result<TemplateAstNode, ConfigError> {
    let pairs = TemplateParser::parse(Rule::template, input)
        .map_err(|e| ConfigError::TemplateParseError(e.to_string()))?;
    let top_pair = pairs
        .peek()
        .ok_or_else(|| ConfigError::TemplateParseError("Empty parse result".into()))?;
    build_ast_from_pair(top_pair)
        .map_err(|e| ConfigError::TemplateParseError(format!("Failed to build AST: {}", e)))
}

// Recursively builds the AST from Pest parse pairs
fn build_ast_from_pair(
    pair: pest::iterators::Pair<Rule>,
) -> Result<TemplateAstNode, pest::error::Error<Rule>> {
    match pair.as_rule() {
        Rule::template => Ok(TemplateAstNode::Root(
            pair.into_inner()
                .filter(|p| p.as_rule() != Rule::EOI)
                .map(build_ast_from_pair)
                .collect::<Result<Vec<TemplateAstNode>, pest::error::Error<Rule>>>()?,
        )),

        Rule::expression => {
            let mut inner_rules = pair.into_inner();
            let identifier_pair = inner_rules.next().expect("Expression must have an identifier");
            let name = identifier_pair.as_str().to_string();

            let mut args: Vec<TemplateAstNode> = Vec::new();
            if let Some(args_pair) = inner_rules.next() {
                if args_pair.as_rule() == Rule::arguments {
                    args = args_pair
                        .into_inner()
                        .map(build_ast_from_pair)
                        .collect::<Result<_, _>>()?;
                }
            }

            Ok(TemplateAstNode::FunctionCall { name, args })
        }

        Rule::argument => build_ast_from_pair(pair.into_inner().next().unwrap()),

        Rule::string_literal => {
            // Quotes are single ASCII bytes, so byte slicing is safe here.
            let literal_str = pair.as_str();
            let content = if literal_str.len() >= 2 {
                &literal_str[1..literal_str.len() - 1]
            } else {
                ""
            };
            Ok(TemplateAstNode::Static(content.to_string()))
        }

        Rule::static_text => Ok(TemplateAstNode::Static(pair.as_str().to_string())),
        Rule::number => Ok(TemplateAstNode::Static(pair.as_str().to_string())),

        _ => unreachable!(
            "Unexpected rule: {:?} in build_ast_from_pair",
            pair.as_rule()
        ),
    }
}

/// Loads the configuration file and compiles every field template,
/// validating function names and argument counts along the way.
pub fn load_config_and_compile(path: &str) -> Result<RunConfig, Box<dyn Error>> {
    let content = fs::read_to_string(path)?;
    let raw: RawConfig = toml::from_str(&content)?;

    let count = raw.count.unwrap_or(10);
    if count == 0 {
        return Err(ConfigError::InvalidCount.into());
    }

    let mut threads = match raw.threads {
        Some(0) => return Err(ConfigError::InvalidThreadCount.into()),
        Some(t) => t,
        None => thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1),
    };
    // A seeded run is only reproducible with a single worker.
    if raw.seed.is_some() && threads > 1 {
        eprintln!(
            "Warning: seed is set, reducing threads from {} to 1 for reproducible output.",
            threads
        );
        threads = 1;
    }

    let raw_fields = raw.fields.unwrap_or_default();
    if raw_fields.is_empty() {
        return Err(ConfigError::NoFields.into());
    }

    let mut seen_names = HashSet::new();
    let mut fields: Vec<CompiledField> = Vec::with_capacity(raw_fields.len());
    for raw_field in raw_fields {
        let name = raw_field.name.trim().to_string();
        if name.is_empty() {
            return Err(ConfigError::EmptyFieldName.into());
        }
        if !seen_names.insert(name.clone()) {
            return Err(ConfigError::DuplicateFieldName(name).into());
        }
        let template = parse_template_string(&raw_field.template)?;
        validator::validate_template(&name, &template)?;
        fields.push(CompiledField { name, template });
    }

    Ok(RunConfig {
        count,
        threads,
        seed: raw.seed,
        quiet: raw.quiet.unwrap_or(false),
        header: raw.header.unwrap_or(false),
        delimiter: raw.delimiter.unwrap_or_else(|| ",".to_string()),
        output_file: raw.output_file,
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_config(name: &str, content: &str) -> String {
        let path = std::env::temp_dir().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn parses_call_with_string_argument() {
        let ast = parse_template_string("${hkid('ABC')}").unwrap();
        assert_eq!(
            ast,
            TemplateAstNode::Root(vec![TemplateAstNode::FunctionCall {
                name: "hkid".into(),
                args: vec![TemplateAstNode::Static("ABC".into())],
            }])
        );
    }

    #[test]
    fn parses_bare_identifier_as_zero_arg_call() {
        let ast = parse_template_string("${prcid}").unwrap();
        assert_eq!(
            ast,
            TemplateAstNode::Root(vec![TemplateAstNode::FunctionCall {
                name: "prcid".into(),
                args: vec![],
            }])
        );
    }

    #[test]
    fn parses_mixed_static_and_calls() {
        let ast = parse_template_string("id=${prcid('19900101')};tail").unwrap();
        assert_eq!(
            ast,
            TemplateAstNode::Root(vec![
                TemplateAstNode::Static("id=".into()),
                TemplateAstNode::FunctionCall {
                    name: "prcid".into(),
                    args: vec![TemplateAstNode::Static("19900101".into())],
                },
                TemplateAstNode::Static(";tail".into()),
            ])
        );
    }

    #[test]
    fn parses_number_argument_and_nested_call() {
        let ast = parse_template_string("${hkid(${prcid(19900101)})}").unwrap();
        assert_eq!(
            ast,
            TemplateAstNode::Root(vec![TemplateAstNode::FunctionCall {
                name: "hkid".into(),
                args: vec![TemplateAstNode::FunctionCall {
                    name: "prcid".into(),
                    args: vec![TemplateAstNode::Static("19900101".into())],
                }],
            }])
        );
    }

    #[test]
    fn unclosed_placeholder_is_a_parse_error() {
        assert!(matches!(
            parse_template_string("${hkid"),
            Err(ConfigError::TemplateParseError(_))
        ));
    }

    #[test]
    fn loads_and_compiles_full_config() {
        let path = write_temp_config(
            "idforge_loader_full.toml",
            r#"
count = 25
threads = 2
delimiter = ";"
header = true

[[Field]]
name = "hk"
template = "${hkid('QWERTY')}"

[[Field]]
name = "prc"
template = "${prcid('19921225')}"
"#,
        );
        let config = load_config_and_compile(&path).unwrap();
        assert_eq!(config.count, 25);
        assert_eq!(config.threads, 2);
        assert_eq!(config.delimiter, ";");
        assert!(config.header);
        assert_eq!(config.fields.len(), 2);
        assert_eq!(config.fields[0].name, "hk");
    }

    #[test]
    fn seed_forces_single_thread() {
        let path = write_temp_config(
            "idforge_loader_seed.toml",
            r#"
count = 5
threads = 8
seed = 42

[[Field]]
name = "hk"
template = "${hkid}"
"#,
        );
        let config = load_config_and_compile(&path).unwrap();
        assert_eq!(config.threads, 1);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn rejects_unknown_function() {
        let path = write_temp_config(
            "idforge_loader_unknown.toml",
            r#"
[[Field]]
name = "x"
template = "${passport}"
"#,
        );
        let err = load_config_and_compile(&path).unwrap_err().to_string();
        assert!(err.contains("passport"), "unexpected error: {}", err);
    }

    #[test]
    fn rejects_duplicate_field_names() {
        let path = write_temp_config(
            "idforge_loader_dup.toml",
            r#"
[[Field]]
name = "id"
template = "${hkid}"

[[Field]]
name = "id"
template = "${prcid}"
"#,
        );
        assert!(load_config_and_compile(&path).is_err());
    }

    #[test]
    fn rejects_zero_count_and_missing_fields() {
        let zero = write_temp_config(
            "idforge_loader_zero.toml",
            "count = 0\n\n[[Field]]\nname = \"x\"\ntemplate = \"${hkid}\"\n",
        );
        assert!(load_config_and_compile(&zero).is_err());

        let empty = write_temp_config("idforge_loader_empty.toml", "count = 3\n");
        assert!(load_config_and_compile(&empty).is_err());
    }
}
