//! Overlay planning.
//!
//! The overlay is the generated type-checker input for one template: a
//! deterministic rendering of every bound expression against the
//! view-model, with one provenance edge per expression and one per member
//! segment. The plan is a pure function of the compilation; it performs no
//! I/O and its output is byte-stable for a fixed snapshot.

use crate::link::LinkedTemplate;
use crate::scope::ScopeGraph;
use aurelia_expr::{Expr, PrimitiveValue};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use source_map::{ExprId, FileId, FrameId, ProvenanceBuilder, ProvenanceEdge};

/// The alias used for the view-model type in overlay text.
const VM_TYPE_ALIAS: &str = "__VM";

/// A planned overlay.
#[derive(Debug)]
pub struct OverlayPlan {
    /// The overlay text.
    pub text: String,
    /// Provenance edges into the template.
    pub edges: Vec<ProvenanceEdge>,
    /// Overlay type aliases → display names, for diagnostic rewriting.
    pub aliases: FxHashMap<SmolStr, SmolStr>,
    /// The overlay document id.
    pub overlay_file: FileId,
    /// The template document id.
    pub template_file: FileId,
}

/// Plans the overlay for a linked template.
pub fn plan_overlay(
    linked: &LinkedTemplate,
    vm_class: Option<&str>,
    template_file: FileId,
    overlay_file: FileId,
) -> OverlayPlan {
    let mut builder = ProvenanceBuilder::new(overlay_file, template_file);
    let mut aliases = FxHashMap::default();

    let vm_type = vm_class.unwrap_or("any");
    builder.push_synthetic(&format!("type {VM_TYPE_ALIAS} = {vm_type};\n"));
    builder.push_synthetic(&format!("declare const vm: {VM_TYPE_ALIAS};\n"));
    aliases.insert(
        SmolStr::new_static(VM_TYPE_ALIAS),
        SmolStr::from(vm_type),
    );

    // Scope locals are typed loosely; their identity is what matters.
    let mut declared = Vec::new();
    for frame in linked.scope.frames() {
        for symbol in &frame.symbols {
            if !declared.contains(&symbol.name) {
                declared.push(symbol.name.clone());
            }
        }
    }
    for name in &declared {
        builder.push_synthetic(&format!("declare let {name}: any;\n"));
    }

    for (id, entry) in linked.exprs.iter() {
        builder.push_synthetic(&format!("const __e{} = ", id.0));
        let start = builder.offset();
        let mut renderer = Renderer {
            builder: &mut builder,
            scope: &linked.scope,
            frame: entry.frame,
            expr_id: id,
            locals: Vec::new(),
        };
        renderer.render(&entry.expr);
        builder.mark_expr(start, entry.span, Some(entry.node), id);
        builder.push_synthetic(";\n");
    }

    let (text, edges) = builder.finish();
    OverlayPlan {
        text,
        edges,
        aliases,
        overlay_file,
        template_file,
    }
}

struct Renderer<'a> {
    builder: &'a mut ProvenanceBuilder,
    scope: &'a ScopeGraph,
    frame: FrameId,
    expr_id: ExprId,
    /// Arrow-function parameter names currently in scope.
    locals: Vec<SmolStr>,
}

impl<'a> Renderer<'a> {
    fn render(&mut self, expr: &Expr) {
        self.render_with_path(expr);
    }

    /// Renders `expr`, returning the member path it denotes when it is a
    /// plain access chain.
    fn render_with_path(&mut self, expr: &Expr) -> Option<String> {
        match expr {
            Expr::AccessScope {
                name, ancestor, ..
            } => {
                let is_local = self.locals.contains(&name.name)
                    || self
                        .scope
                        .resolve(self.frame, &name.name, *ancestor)
                        .is_some();
                if !is_local {
                    self.builder.push_synthetic("vm.");
                }
                self.builder.push_member(
                    name.span,
                    self.expr_id,
                    &name.name,
                    &name.name,
                );
                Some(name.name.to_string())
            }
            Expr::AccessGlobal { name, .. } => {
                self.builder.push_member(
                    name.span,
                    self.expr_id,
                    &name.name,
                    &name.name,
                );
                Some(name.name.to_string())
            }
            Expr::AccessThis { .. } | Expr::AccessBoundary { .. } => {
                self.builder.push_synthetic("vm");
                Some("".to_string())
            }
            Expr::AccessMember {
                object,
                name,
                optional,
                ..
            } => {
                let base = self.render_with_path(object);
                self.builder
                    .push_synthetic(if *optional { "?." } else { "." });
                let path = join_path(base, &name.name);
                self.builder
                    .push_member(name.span, self.expr_id, &path, &name.name);
                Some(path)
            }
            Expr::AccessKeyed {
                object,
                key,
                optional,
                ..
            } => {
                self.render_with_path(object);
                self.builder
                    .push_synthetic(if *optional { "?.[" } else { "[" });
                self.render(key);
                self.builder.push_synthetic("]");
                None
            }
            Expr::CallScope {
                name,
                args,
                ancestor,
                optional_call,
                ..
            } => {
                let is_local = self.locals.contains(&name.name)
                    || self
                        .scope
                        .resolve(self.frame, &name.name, *ancestor)
                        .is_some();
                if !is_local {
                    self.builder.push_synthetic("vm.");
                }
                self.builder.push_member(
                    name.span,
                    self.expr_id,
                    &name.name,
                    &name.name,
                );
                self.render_args(args, *optional_call);
                None
            }
            Expr::CallMember {
                object,
                name,
                args,
                optional_member,
                optional_call,
                ..
            } => {
                let base = self.render_with_path(object);
                self.builder
                    .push_synthetic(if *optional_member { "?." } else { "." });
                let path = join_path(base, &name.name);
                self.builder
                    .push_member(name.span, self.expr_id, &path, &name.name);
                self.render_args(args, *optional_call);
                None
            }
            Expr::CallGlobal { name, args, .. } => {
                self.builder.push_member(
                    name.span,
                    self.expr_id,
                    &name.name,
                    &name.name,
                );
                self.render_args(args, false);
                None
            }
            Expr::CallFunction {
                func,
                args,
                optional_call,
                ..
            } => {
                self.render(func);
                self.render_args(args, *optional_call);
                None
            }
            Expr::New { func, args, .. } => {
                self.builder.push_synthetic("new ");
                self.render(func);
                if !args.is_empty() {
                    self.render_args(args, false);
                }
                None
            }
            Expr::Unary { op, expr, .. } => {
                use aurelia_expr::UnaryOp::*;
                match op {
                    PostInc => {
                        self.render(expr);
                        self.builder.push_synthetic("++");
                    }
                    PostDec => {
                        self.render(expr);
                        self.builder.push_synthetic("--");
                    }
                    other => {
                        let text = match other {
                            Neg => "-",
                            Pos => "+",
                            Not => "!",
                            Typeof => "typeof ",
                            Void => "void ",
                            PreInc => "++",
                            PreDec => "--",
                            PostInc | PostDec => unreachable!(),
                        };
                        self.builder.push_synthetic(text);
                        self.render(expr);
                    }
                }
                None
            }
            Expr::Binary {
                op, left, right, ..
            } => {
                self.render(left);
                self.builder.push_synthetic(&format!(" {} ", op.as_str()));
                self.render(right);
                None
            }
            Expr::Conditional { cond, yes, no, .. } => {
                self.render(cond);
                self.builder.push_synthetic(" ? ");
                self.render(yes);
                self.builder.push_synthetic(" : ");
                self.render(no);
                None
            }
            Expr::Assign {
                target, value, op, ..
            } => {
                self.render(target);
                let text = match op {
                    aurelia_expr::AssignOp::Assign => " = ",
                    aurelia_expr::AssignOp::Add => " += ",
                    aurelia_expr::AssignOp::Sub => " -= ",
                    aurelia_expr::AssignOp::Mul => " *= ",
                    aurelia_expr::AssignOp::Div => " /= ",
                };
                self.builder.push_synthetic(text);
                self.render(value);
                None
            }
            Expr::ArrowFunction { params, body, .. } => {
                self.builder.push_synthetic("(");
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        self.builder.push_synthetic(", ");
                    }
                    if param.rest {
                        self.builder.push_synthetic("...");
                    }
                    self.builder.push_synthetic(&param.name.name);
                    self.builder.push_synthetic(": any");
                }
                self.builder.push_synthetic(") => ");
                let added = params.len();
                self.locals
                    .extend(params.iter().map(|p| p.name.name.clone()));
                self.render(body);
                self.locals.truncate(self.locals.len() - added);
                None
            }
            Expr::ArrayLiteral { elements, .. } => {
                self.builder.push_synthetic("[");
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        self.builder.push_synthetic(", ");
                    }
                    self.render(element);
                }
                self.builder.push_synthetic("]");
                None
            }
            Expr::ObjectLiteral { entries, .. } => {
                self.builder.push_synthetic("{ ");
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        self.builder.push_synthetic(", ");
                    }
                    self.builder
                        .push_synthetic(&format!("{}: ", object_key_text(&entry.key)));
                    self.render(&entry.value);
                }
                self.builder.push_synthetic(" }");
                None
            }
            Expr::Template { expressions, .. } => {
                // Evaluates to a string; the parts are irrelevant to types.
                self.builder.push_synthetic("(");
                for expr in expressions {
                    self.render(expr);
                    self.builder.push_synthetic(", ");
                }
                self.builder.push_synthetic("\"\")");
                None
            }
            Expr::TaggedTemplate {
                tag, expressions, ..
            } => {
                self.render(tag);
                self.builder.push_synthetic("(");
                for (i, expr) in expressions.iter().enumerate() {
                    if i > 0 {
                        self.builder.push_synthetic(", ");
                    }
                    self.render(expr);
                }
                self.builder.push_synthetic(")");
                None
            }
            Expr::Interpolation { expressions, .. } => {
                self.builder.push_synthetic("(");
                for expr in expressions {
                    self.render(expr);
                    self.builder.push_synthetic(", ");
                }
                self.builder.push_synthetic("\"\")");
                None
            }
            Expr::PrimitiveLiteral { value, .. } => {
                let text = match value {
                    PrimitiveValue::Number(n) => format!("{n}"),
                    PrimitiveValue::Str(s) => format!("{:?}", s.as_str()),
                    PrimitiveValue::Bool(b) => b.to_string(),
                    PrimitiveValue::Null => "null".to_string(),
                    PrimitiveValue::Undefined => "undefined".to_string(),
                };
                self.builder.push_synthetic(&text);
                None
            }
            Expr::ValueConverter {
                expression, args, ..
            }
            | Expr::BindingBehavior {
                expression, args, ..
            } => {
                // The tail's type is its input's type; arguments are kept so
                // their member accesses stay checked.
                self.builder.push_synthetic("(");
                for arg in args {
                    self.render(arg);
                    self.builder.push_synthetic(", ");
                }
                self.render(expression);
                self.builder.push_synthetic(")");
                None
            }
            Expr::ForOfStatement { iterable, .. } => {
                self.render(iterable);
                None
            }
            Expr::Paren { inner, .. } => {
                self.builder.push_synthetic("(");
                self.render(inner);
                self.builder.push_synthetic(")");
                None
            }
            Expr::BindingIdentifier { name, .. } => {
                self.builder.push_synthetic(name);
                None
            }
            Expr::ArrayBindingPattern { .. }
            | Expr::ObjectBindingPattern { .. }
            | Expr::BindingPatternDefault { .. }
            | Expr::Custom { .. }
            | Expr::Bad(_) => {
                self.builder.push_synthetic("undefined");
                None
            }
        }
    }

    fn render_args(&mut self, args: &[Expr], optional_call: bool) {
        self.builder
            .push_synthetic(if optional_call { "?.(" } else { "(" });
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.builder.push_synthetic(", ");
            }
            self.render(arg);
        }
        self.builder.push_synthetic(")");
    }
}

fn join_path(base: Option<String>, name: &str) -> String {
    match base {
        Some(base) if !base.is_empty() => format!("{base}.{name}"),
        _ => name.to_string(),
    }
}

fn object_key_text(key: &aurelia_expr::ObjectKey) -> String {
    match key {
        aurelia_expr::ObjectKey::Ident(id) => id.name.to_string(),
        aurelia_expr::ObjectKey::Str { value, .. } => format!("{:?}", value.as_str()),
        aurelia_expr::ObjectKey::Number { value, .. } => format!("{value}"),
    }
}
