//! Semantic-token collection.
//!
//! Projects the linked IR and expression ASTs into a positional token
//! stream: custom-element tags, attribute targets and commands, scope
//! identifiers, member accesses, converter/behavior names, and literal
//! tokens inside expressions. Tokens come out sorted and non-overlapping;
//! on overlap the smaller (more specific) span wins.

use aurelia_compiler::{NodeSem, TemplateCompilation};
use aurelia_expr::Expr;
use aurelia_resources::ResourceIndex;
use aurelia_template::{AttributeParser, Node};
use source_map::{FrameId, Span};

/// Token classification, mapped by the host onto its legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenType {
    /// Custom element tag.
    Element,
    /// Custom attribute or template-controller name.
    Attribute,
    /// Binding command segment.
    Command,
    /// Bindable attribute target.
    Bindable,
    /// Scope identifier (iteration variables, `<let>` values).
    Variable,
    /// View-model member access.
    Member,
    /// Value converter or binding behavior name.
    Function,
    /// `$this`, `$parent`, contextuals.
    Keyword,
    /// String literal.
    String,
    /// Numeric literal.
    Number,
}

/// One semantic token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticToken {
    /// The token span.
    pub span: Span,
    /// Classification.
    pub token_type: TokenType,
}

/// Collects the semantic tokens of one compiled template.
pub fn collect_semantic_tokens(
    compilation: &TemplateCompilation,
    resources: &ResourceIndex,
    attr_parser: &mut AttributeParser,
) -> Vec<SemanticToken> {
    let mut tokens = Vec::new();

    for row in &compilation.linked.rows {
        if let NodeSem::Element {
            tag_span,
            close_tag_span,
            custom: Some(_),
            ..
        } = &row.node
        {
            tokens.push(SemanticToken {
                span: *tag_span,
                token_type: TokenType::Element,
            });
            if let Some(span) = close_tag_span {
                tokens.push(SemanticToken {
                    span: *span,
                    token_type: TokenType::Element,
                });
            }
        }
    }

    collect_attr_tokens(compilation, resources, attr_parser, &mut tokens);

    for (_, entry) in compilation.linked.exprs.iter() {
        collect_expr_tokens(&entry.expr, entry.frame, compilation, &mut tokens);
    }

    // Smaller spans are more specific; drop anything they overlap.
    tokens.sort_by_key(|t| (t.span.start, t.span.len()));
    let mut out: Vec<SemanticToken> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if let Some(last) = out.last() {
            if token.span.start < last.span.end {
                continue;
            }
        }
        out.push(token);
    }
    out
}

fn collect_attr_tokens(
    compilation: &TemplateCompilation,
    resources: &ResourceIndex,
    attr_parser: &mut AttributeParser,
    tokens: &mut Vec<SemanticToken>,
) {
    fn walk(
        nodes: &[Node],
        resources: &ResourceIndex,
        attr_parser: &mut AttributeParser,
        tokens: &mut Vec<SemanticToken>,
    ) {
        for node in nodes {
            let (attrs, children) = match node {
                Node::Element(el) => (&el.attrs, &el.children),
                Node::Template(t) => (&t.attrs, &t.children),
                _ => continue,
            };
            for attr in attrs {
                let syntax = attr_parser.analyze(&attr.name);
                if let Some(span) = syntax.target_span {
                    let span = span.rebase(attr.name_span.start);
                    let token_type = if resources.controller(&syntax.target).is_some()
                        || resources.attribute(&syntax.target).is_some()
                    {
                        Some(TokenType::Attribute)
                    } else if syntax.command.is_some() {
                        Some(TokenType::Bindable)
                    } else {
                        None
                    };
                    if let Some(token_type) = token_type {
                        tokens.push(SemanticToken { span, token_type });
                    }
                }
                if let Some(span) = syntax.command_span {
                    tokens.push(SemanticToken {
                        span: span.rebase(attr.name_span.start),
                        token_type: TokenType::Command,
                    });
                }
            }
            walk(children, resources, attr_parser, tokens);
        }
    }
    walk(&compilation.parsed.dom, resources, attr_parser, tokens);
}

fn collect_expr_tokens(
    expr: &Expr,
    frame: FrameId,
    compilation: &TemplateCompilation,
    tokens: &mut Vec<SemanticToken>,
) {
    match expr {
        Expr::AccessScope { name, ancestor, .. }
        | Expr::CallScope { name, ancestor, .. } => {
            let token_type = if compilation
                .linked
                .scope
                .resolve(frame, &name.name, *ancestor)
                .is_some()
            {
                TokenType::Variable
            } else {
                TokenType::Member
            };
            tokens.push(SemanticToken {
                span: name.span,
                token_type,
            });
        }
        Expr::AccessMember { name, .. } | Expr::CallMember { name, .. } => {
            tokens.push(SemanticToken {
                span: name.span,
                token_type: TokenType::Member,
            });
        }
        Expr::AccessGlobal { name, .. } | Expr::CallGlobal { name, .. } => {
            tokens.push(SemanticToken {
                span: name.span,
                token_type: TokenType::Keyword,
            });
        }
        Expr::AccessThis { span, .. } | Expr::AccessBoundary { span } => {
            tokens.push(SemanticToken {
                span: *span,
                token_type: TokenType::Keyword,
            });
        }
        Expr::ValueConverter { name, .. } | Expr::BindingBehavior { name, .. } => {
            tokens.push(SemanticToken {
                span: name.span,
                token_type: TokenType::Function,
            });
        }
        Expr::BindingIdentifier { span, .. } => {
            tokens.push(SemanticToken {
                span: *span,
                token_type: TokenType::Variable,
            });
        }
        Expr::PrimitiveLiteral { span, value } => {
            let token_type = match value {
                aurelia_expr::PrimitiveValue::Number(_) => Some(TokenType::Number),
                aurelia_expr::PrimitiveValue::Str(_) => Some(TokenType::String),
                _ => None,
            };
            if let Some(token_type) = token_type {
                if !span.is_empty() {
                    tokens.push(SemanticToken {
                        span: *span,
                        token_type,
                    });
                }
            }
        }
        _ => {}
    }
    expr.for_each_child(&mut |child| collect_expr_tokens(child, frame, compilation, tokens));
}
