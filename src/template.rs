use crate::{
    config::loader::TemplateAstNode,
    generator::{hkid::generate_hkid, prc_id::generate_prc_id},
    logger::Logger,
};
use rand::Rng;

/// Applies built-in template functions.
/// Takes the function name and the rendered arguments; both identity
/// functions treat a missing argument as "use the documented default" and
/// never fail, so a warning is the strongest reaction to odd input here.
pub fn apply_function(
    name: &str,
    args: Vec<String>,
    logger: Logger,
    rng: &mut impl Rng,
) -> Result<String, String> {
    match name {
        "hkid" => {
            if args.len() > 1 {
                logger.warning(&format!(
                    "hkid takes at most one argument, ignoring {} extra.",
                    args.len() - 1
                ));
            }
            let initial_range = args.first().map(String::as_str).unwrap_or("");
            Ok(generate_hkid(rng, initial_range))
        }
        "prcid" => {
            if args.len() > 1 {
                logger.warning(&format!(
                    "prcid takes at most one argument, ignoring {} extra.",
                    args.len() - 1
                ));
            }
            let birth_date = args.first().map(String::as_str).unwrap_or("");
            Ok(generate_prc_id(rng, birth_date))
        }
        // Unknown names are rejected at load time; render defensively anyway.
        _ => {
            logger.warning(&format!("Unknown template function '{}' called.", name));
            Ok(String::new())
        }
    }
}

// Recursive helper function to render an AST node.
// Arguments render before dispatch, so nested calls compose.
pub fn render_ast_node(
    node: &TemplateAstNode,
    logger: Logger,
    rng: &mut impl Rng,
) -> Result<String, String> {
    match node {
        TemplateAstNode::Static(s) => Ok(s.clone()),
        TemplateAstNode::FunctionCall { name, args } => {
            let mut rendered_args = Vec::with_capacity(args.len());
            for arg_node in args {
                rendered_args.push(render_ast_node(arg_node, logger.clone(), rng)?);
            }
            apply_function(name, rendered_args, logger, rng)
        }
        TemplateAstNode::Root(nodes) => nodes
            .iter()
            .map(|n| render_ast_node(n, logger.clone(), rng))
            .collect::<Result<String, _>>(),
    }
}
