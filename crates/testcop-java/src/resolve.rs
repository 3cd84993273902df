//! Static type resolution for call arguments.
//!
//! Only what the assertion classifier needs: literals, boolean-valued
//! operators, and names declared as fields, parameters or locals.

use std::collections::HashMap;
use std::ops::Range;

use tree_sitter::Node;

use testcop_core::types::{ArgumentKind, ResolvedType};

use crate::{declarators, named_children, node_text, type_name};

const BOOLEAN_OPERATORS: &[&str] = &["==", "!=", "<", ">", "<=", ">=", "&&", "||"];

/// A local variable, visible from its name to the end of the enclosing node.
#[derive(Debug, Clone)]
struct Local {
    name: String,
    ty: ResolvedType,
    visible: Range<usize>,
}

/// Declared types visible from a method body.
///
/// Fields and parameters are visible everywhere. Locals, loop variables and
/// lambda parameters are resolved by byte position, so a name only sees the
/// declarations that enclose it.
#[derive(Debug, Clone, Default)]
pub(crate) struct Scope {
    types: HashMap<String, ResolvedType>,
    locals: Vec<Local>,
}

impl Scope {
    /// Scope holding the fields declared among `members`.
    pub(crate) fn of_fields(members: &[Node<'_>], content: &str) -> Self {
        let mut scope = Self::default();
        for member in members.iter().filter(|m| m.kind() == "field_declaration") {
            for (name, ty) in scope.variables(*member, content) {
                scope.types.insert(node_text(name, content), ty);
            }
        }
        scope
    }

    /// Extend with the parameters and locals of `method`.
    pub(crate) fn for_method(&self, method: Node<'_>, content: &str) -> Self {
        let mut scope = self.clone();
        if let Some(params) = method.child_by_field_name("parameters") {
            for (name, ty) in formal_parameters(params, content) {
                scope.types.insert(name, ty);
            }
        }
        if let Some(body) = method.child_by_field_name("body") {
            scope.declare_locals(body, content);
        }
        scope
    }

    fn declare_locals(&mut self, node: Node<'_>, content: &str) {
        for child in named_children(node) {
            match child.kind() {
                "local_variable_declaration" => {
                    for (name, ty) in self.variables(child, content) {
                        self.declare(name, ty, node, content);
                    }
                }
                "enhanced_for_statement" => {
                    if let (Some(ty), Some(name)) = (
                        child.child_by_field_name("type"),
                        child.child_by_field_name("name"),
                    ) {
                        let ty = ResolvedType::from_declared(&node_text(ty, content));
                        self.declare(name, ty, child, content);
                    }
                }
                "lambda_expression" => self.declare_lambda_parameters(child, content),
                _ => {}
            }
            self.declare_locals(child, content);
        }
    }

    fn declare_lambda_parameters(&mut self, lambda: Node<'_>, content: &str) {
        let Some(params) = lambda.child_by_field_name("parameters") else {
            return;
        };
        let visible = params.end_byte()..lambda.end_byte();
        let declared: Vec<(String, ResolvedType)> = match params.kind() {
            "identifier" => vec![(node_text(params, content), ResolvedType::Unresolved)],
            "inferred_parameters" => named_children(params)
                .into_iter()
                .map(|p| (node_text(p, content), ResolvedType::Unresolved))
                .collect(),
            _ => formal_parameters(params, content),
        };
        for (name, ty) in declared {
            self.locals.push(Local {
                name,
                ty,
                visible: visible.clone(),
            });
        }
    }

    fn declare(&mut self, name: Node<'_>, ty: ResolvedType, enclosing: Node<'_>, content: &str) {
        self.locals.push(Local {
            name: node_text(name, content),
            ty,
            visible: name.end_byte()..enclosing.end_byte(),
        });
    }

    /// Name nodes and types of every variable in a field or local declaration.
    fn variables<'t>(&self, declaration: Node<'t>, content: &str) -> Vec<(Node<'t>, ResolvedType)> {
        let declared = declaration
            .child_by_field_name("type")
            .map(|t| node_text(t, content))
            .unwrap_or_default();
        declarators(declaration)
            .into_iter()
            .filter_map(|declarator| {
                let name = declarator.child_by_field_name("name")?;
                let ty = if declared == "var" {
                    declarator
                        .child_by_field_name("value")
                        .map(|v| self.resolve(v, content))
                        .unwrap_or(ResolvedType::Unresolved)
                } else {
                    ResolvedType::from_declared(&declared)
                };
                Some((name, ty))
            })
            .collect()
    }

    /// Type of `name` as seen from byte offset `at`.
    fn lookup(&self, name: &str, at: usize) -> Option<&ResolvedType> {
        self.locals
            .iter()
            .rev()
            .find(|local| local.name == name && local.visible.contains(&at))
            .map(|local| &local.ty)
            .or_else(|| self.types.get(name))
    }

    /// Resolve the static type of an expression.
    pub(crate) fn resolve(&self, expr: Node<'_>, content: &str) -> ResolvedType {
        let resolved = match expr.kind() {
            "true" | "false" | "instanceof_expression" => ResolvedType::Boolean,
            "string_literal" | "text_block" => ResolvedType::Named("String".into()),
            "character_literal" => ResolvedType::Named("char".into()),
            "decimal_integer_literal"
            | "hex_integer_literal"
            | "octal_integer_literal"
            | "binary_integer_literal" => ResolvedType::Named("int".into()),
            "decimal_floating_point_literal" | "hex_floating_point_literal" => {
                ResolvedType::Named("double".into())
            }
            "parenthesized_expression" => named_children(expr)
                .first()
                .map(|inner| self.resolve(*inner, content))
                .unwrap_or(ResolvedType::Unresolved),
            "unary_expression" => match operator(expr, content).as_deref() {
                Some("!") => ResolvedType::Boolean,
                _ => expr
                    .child_by_field_name("operand")
                    .map(|operand| self.resolve(operand, content))
                    .unwrap_or(ResolvedType::Unresolved),
            },
            "binary_expression" => self.resolve_binary(expr, content),
            "ternary_expression" => expr
                .child_by_field_name("consequence")
                .map(|c| self.resolve(c, content))
                .unwrap_or(ResolvedType::Unresolved),
            "cast_expression" => expr
                .child_by_field_name("type")
                .map(|t| ResolvedType::from_declared(&node_text(t, content)))
                .unwrap_or(ResolvedType::Unresolved),
            "object_creation_expression" => expr
                .child_by_field_name("type")
                .map(|t| ResolvedType::Named(type_name(t, content)))
                .unwrap_or(ResolvedType::Unresolved),
            "identifier" => self
                .lookup(&node_text(expr, content), expr.start_byte())
                .cloned()
                .unwrap_or(ResolvedType::Unresolved),
            _ => ResolvedType::Unresolved,
        };
        if resolved == ResolvedType::Unresolved {
            tracing::debug!(
                expression = %node_text(expr, content),
                kind = expr.kind(),
                "could not resolve expression type"
            );
        }
        resolved
    }

    fn resolve_binary(&self, expr: Node<'_>, content: &str) -> ResolvedType {
        let op = operator(expr, content).unwrap_or_default();
        if BOOLEAN_OPERATORS.contains(&op.as_str()) {
            return ResolvedType::Boolean;
        }
        let side = |field| {
            expr.child_by_field_name(field)
                .map(|n| self.resolve(n, content))
                .unwrap_or(ResolvedType::Unresolved)
        };
        let (left, right) = (side("left"), side("right"));
        let string = ResolvedType::Named("String".into());
        match op.as_str() {
            "+" if left == string || right == string => string,
            "&" | "|" | "^" if left.is_boolean() && right.is_boolean() => ResolvedType::Boolean,
            _ => left,
        }
    }
}

/// Names and declared types of `formal_parameter` children.
fn formal_parameters(params: Node<'_>, content: &str) -> Vec<(String, ResolvedType)> {
    named_children(params)
        .into_iter()
        .filter(|p| p.kind() == "formal_parameter")
        .filter_map(|p| {
            let ty = p.child_by_field_name("type")?;
            let name = p.child_by_field_name("name")?;
            Some((
                node_text(name, content),
                ResolvedType::from_declared(&node_text(ty, content)),
            ))
        })
        .collect()
}

fn operator(expr: Node<'_>, content: &str) -> Option<String> {
    expr.child_by_field_name("operator")
        .map(|op| node_text(op, content))
}

/// Syntactic category of an argument expression.
pub(crate) fn argument_kind(expr: Node<'_>) -> ArgumentKind {
    match expr.kind() {
        "string_literal" | "text_block" => ArgumentKind::StringLiteral,
        "true" | "false" => ArgumentKind::BooleanLiteral,
        "identifier" => ArgumentKind::Name,
        "field_access" => ArgumentKind::FieldAccess,
        "method_invocation" => ArgumentKind::MethodCall,
        _ => ArgumentKind::Other,
    }
}
