//! Expression AST.
//!
//! One closed enum covers every node the binding language can produce.
//! Every variant carries a byte span into the originating text; recoverable
//! parse failures are represented by [`Expr::Bad`] nodes so downstream
//! stages always receive a structurally valid tree.

use smol_str::SmolStr;
use source_map::Span;

/// An identifier with the span covering exactly its text.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Identifier {
    /// The identifier text.
    pub name: SmolStr,
    /// Span of the identifier text only.
    pub span: Span,
}

impl Identifier {
    /// Creates a new identifier.
    pub fn new(name: impl Into<SmolStr>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// A primitive literal value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrimitiveValue {
    /// Numeric literal.
    Number(f64),
    /// String literal, escape-resolved.
    Str(SmolStr),
    /// `true` / `false`.
    Bool(bool),
    /// `null`.
    Null,
    /// `undefined` (also used for array holes).
    Undefined,
}

/// Unary operators, including prefix and postfix increment/decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `+x`
    Pos,
    /// `!x`
    Not,
    /// `typeof x`
    Typeof,
    /// `void x`
    Void,
    /// `++x`
    PreInc,
    /// `--x`
    PreDec,
    /// `x++`
    PostInc,
    /// `x--`
    PostDec,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `**`
    Exp,
    /// `==`
    Eq,
    /// `===`
    StrictEq,
    /// `!=`
    Ne,
    /// `!==`
    StrictNe,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `??`
    Coalesce,
    /// `instanceof`
    Instanceof,
    /// `in`
    In,
}

impl BinaryOp {
    /// The operator's source text.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Exp => "**",
            BinaryOp::Eq => "==",
            BinaryOp::StrictEq => "===",
            BinaryOp::Ne => "!=",
            BinaryOp::StrictNe => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Coalesce => "??",
            BinaryOp::Instanceof => "instanceof",
            BinaryOp::In => "in",
        }
    }
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `+=`
    Add,
    /// `-=`
    Sub,
    /// `*=`
    Mul,
    /// `/=`
    Div,
}

/// An object-literal key.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObjectKey {
    /// Bare identifier key.
    Ident(Identifier),
    /// Quoted string key.
    Str { value: SmolStr, span: Span },
    /// Numeric key.
    Number { value: f64, span: Span },
}

impl ObjectKey {
    /// Span of the key text.
    pub fn span(&self) -> Span {
        match self {
            ObjectKey::Ident(id) => id.span,
            ObjectKey::Str { span, .. } | ObjectKey::Number { span, .. } => *span,
        }
    }

    /// Key name as written (without quotes).
    pub fn name(&self) -> SmolStr {
        match self {
            ObjectKey::Ident(id) => id.name.clone(),
            ObjectKey::Str { value, .. } => value.clone(),
            ObjectKey::Number { value, .. } => SmolStr::from(format!("{value}")),
        }
    }
}

/// One `key: value` entry in an object literal; shorthand entries record the
/// implied scope access as their value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectEntry {
    /// The key.
    pub key: ObjectKey,
    /// The value expression.
    pub value: Expr,
}

/// Parameter of an arrow function: identifiers only, with an optional
/// trailing rest parameter.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArrowParam {
    /// Parameter name.
    pub name: Identifier,
    /// True for a `...rest` parameter (always last).
    pub rest: bool,
}

/// Where a `BadExpression` came from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BadOrigin {
    /// The stage that produced the node. Always `"parse"` for parser
    /// recoveries.
    pub by: SmolStr,
    /// Parser states crossed at the failure point, outermost first.
    pub trace: Vec<SmolStr>,
}

/// A recoverable parse failure, kept in-tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BadExpression {
    /// Span of the offending region.
    pub span: Span,
    /// The raw source text covered by `span`.
    pub text: SmolStr,
    /// User-actionable message.
    pub message: SmolStr,
    /// Provenance of the failure.
    pub origin: Option<BadOrigin>,
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expr {
    /// A scope access: `name`, or `$parent.name` with `ancestor` hops.
    AccessScope {
        /// Node span.
        span: Span,
        /// Accessed name.
        name: Identifier,
        /// Number of `$parent` hops (0 for the current scope).
        ancestor: u8,
    },
    /// Member access: `object.name`.
    AccessMember {
        /// Node span.
        span: Span,
        /// Receiver.
        object: Box<Expr>,
        /// Member name.
        name: Identifier,
        /// True for `object?.name`.
        optional: bool,
    },
    /// Keyed access: `object[key]`.
    AccessKeyed {
        /// Node span.
        span: Span,
        /// Receiver.
        object: Box<Expr>,
        /// Key expression.
        key: Box<Expr>,
        /// True for `object?.[key]`.
        optional: bool,
    },
    /// `$this`, `$parent`, `$parent.$parent`, … as a whole value.
    AccessThis {
        /// Node span.
        span: Span,
        /// 0 for `$this`, 1 for `$parent`, and so on.
        ancestor: u8,
    },
    /// The `this` keyword (the binding boundary).
    AccessBoundary {
        /// Node span.
        span: Span,
    },
    /// A known global name (`Math`, `JSON`, …).
    AccessGlobal {
        /// Node span.
        span: Span,
        /// Global name.
        name: Identifier,
    },
    /// Call of a scope member: `doIt(x)`, `$parent.doIt(x)`.
    CallScope {
        /// Node span.
        span: Span,
        /// Called name.
        name: Identifier,
        /// Arguments.
        args: Vec<Expr>,
        /// `$parent` hops.
        ancestor: u8,
        /// True for `name?.(…)`.
        optional_call: bool,
    },
    /// Call of a member: `obj.doIt(x)`.
    CallMember {
        /// Node span.
        span: Span,
        /// Receiver.
        object: Box<Expr>,
        /// Called member name.
        name: Identifier,
        /// Arguments.
        args: Vec<Expr>,
        /// True when the member access used `?.`.
        optional_member: bool,
        /// True when the call itself used `?.(`.
        optional_call: bool,
    },
    /// Call of a known global: `parseInt(x)`.
    CallGlobal {
        /// Node span.
        span: Span,
        /// Global name.
        name: Identifier,
        /// Arguments.
        args: Vec<Expr>,
    },
    /// Call of an arbitrary callee expression: `(fn)(x)`, `arr[0](x)`.
    CallFunction {
        /// Node span.
        span: Span,
        /// Callee.
        func: Box<Expr>,
        /// Arguments.
        args: Vec<Expr>,
        /// True for `callee?.(…)`.
        optional_call: bool,
    },
    /// `new` expression.
    New {
        /// Node span.
        span: Span,
        /// Constructed callee; calls on the callee stay embedded here.
        func: Box<Expr>,
        /// Constructor arguments when the callee itself was not a call form.
        args: Vec<Expr>,
    },
    /// Unary expression.
    Unary {
        /// Node span.
        span: Span,
        /// Operator.
        op: UnaryOp,
        /// Operand.
        expr: Box<Expr>,
    },
    /// Binary expression.
    Binary {
        /// Node span.
        span: Span,
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Ternary conditional.
    Conditional {
        /// Node span.
        span: Span,
        /// Condition.
        cond: Box<Expr>,
        /// Value when truthy.
        yes: Box<Expr>,
        /// Value when falsy.
        no: Box<Expr>,
    },
    /// Assignment.
    Assign {
        /// Node span.
        span: Span,
        /// Assignment target.
        target: Box<Expr>,
        /// Assigned value.
        value: Box<Expr>,
        /// Operator (`=`, `+=`, …).
        op: AssignOp,
    },
    /// Arrow function.
    ArrowFunction {
        /// Node span.
        span: Span,
        /// Parameters.
        params: Vec<ArrowParam>,
        /// Body expression.
        body: Box<Expr>,
    },
    /// Array literal; holes are `PrimitiveLiteral` `Undefined`.
    ArrayLiteral {
        /// Node span.
        span: Span,
        /// Elements.
        elements: Vec<Expr>,
    },
    /// Object literal.
    ObjectLiteral {
        /// Node span.
        span: Span,
        /// Entries in source order.
        entries: Vec<ObjectEntry>,
    },
    /// Untagged template literal.
    Template {
        /// Node span.
        span: Span,
        /// Cooked string parts; always `expressions.len() + 1` entries.
        cooked: Vec<SmolStr>,
        /// Embedded expressions.
        expressions: Vec<Expr>,
    },
    /// Tagged template literal.
    TaggedTemplate {
        /// Node span.
        span: Span,
        /// Tag expression.
        tag: Box<Expr>,
        /// Cooked string parts.
        cooked: Vec<SmolStr>,
        /// Embedded expressions.
        expressions: Vec<Expr>,
    },
    /// HTML text with `${…}` holes.
    Interpolation {
        /// Node span.
        span: Span,
        /// Literal parts; always `expressions.len() + 1` entries.
        parts: Vec<SmolStr>,
        /// Hole expressions.
        expressions: Vec<Expr>,
    },
    /// Literal value.
    PrimitiveLiteral {
        /// Node span.
        span: Span,
        /// Decoded value.
        value: PrimitiveValue,
    },
    /// Iteration variable declaration in a `for-of` head.
    BindingIdentifier {
        /// Node span.
        span: Span,
        /// Declared name.
        name: SmolStr,
    },
    /// Array destructuring pattern in a `for-of` head.
    ArrayBindingPattern {
        /// Node span.
        span: Span,
        /// Pattern elements (`BindingIdentifier`s, nested patterns, holes).
        elements: Vec<Expr>,
    },
    /// Object destructuring pattern in a `for-of` head.
    ObjectBindingPattern {
        /// Node span.
        span: Span,
        /// Pattern entries.
        entries: Vec<ObjectEntry>,
    },
    /// A pattern element with a default value.
    BindingPatternDefault {
        /// Node span.
        span: Span,
        /// The declared target.
        target: Box<Expr>,
        /// Default value expression.
        default: Box<Expr>,
    },
    /// `decl of iterable` iterator head.
    ForOfStatement {
        /// Node span.
        span: Span,
        /// Declaration (identifier or pattern).
        declaration: Box<Expr>,
        /// Iterable expression.
        iterable: Box<Expr>,
    },
    /// Explicit parenthesized expression; never collapsed.
    Paren {
        /// Node span including the parentheses.
        span: Span,
        /// Inner expression.
        inner: Box<Expr>,
    },
    /// Value-converter tail: `expression | name:args…`.
    ValueConverter {
        /// Node span.
        span: Span,
        /// Wrapped expression.
        expression: Box<Expr>,
        /// Converter name.
        name: Identifier,
        /// Converter arguments.
        args: Vec<Expr>,
    },
    /// Binding-behavior tail: `expression & name:args…`.
    BindingBehavior {
        /// Node span.
        span: Span,
        /// Wrapped expression.
        expression: Box<Expr>,
        /// Behavior name.
        name: Identifier,
        /// Behavior arguments.
        args: Vec<Expr>,
    },
    /// Opaque expression returned verbatim in `IsCustom` mode.
    Custom {
        /// Node span.
        span: Span,
        /// Raw text.
        text: SmolStr,
    },
    /// Recoverable parse failure.
    Bad(BadExpression),
}

impl Expr {
    /// Returns the span of this node.
    pub fn span(&self) -> Span {
        match self {
            Expr::AccessScope { span, .. }
            | Expr::AccessMember { span, .. }
            | Expr::AccessKeyed { span, .. }
            | Expr::AccessThis { span, .. }
            | Expr::AccessBoundary { span }
            | Expr::AccessGlobal { span, .. }
            | Expr::CallScope { span, .. }
            | Expr::CallMember { span, .. }
            | Expr::CallGlobal { span, .. }
            | Expr::CallFunction { span, .. }
            | Expr::New { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Conditional { span, .. }
            | Expr::Assign { span, .. }
            | Expr::ArrowFunction { span, .. }
            | Expr::ArrayLiteral { span, .. }
            | Expr::ObjectLiteral { span, .. }
            | Expr::Template { span, .. }
            | Expr::TaggedTemplate { span, .. }
            | Expr::Interpolation { span, .. }
            | Expr::PrimitiveLiteral { span, .. }
            | Expr::BindingIdentifier { span, .. }
            | Expr::ArrayBindingPattern { span, .. }
            | Expr::ObjectBindingPattern { span, .. }
            | Expr::BindingPatternDefault { span, .. }
            | Expr::ForOfStatement { span, .. }
            | Expr::Paren { span, .. }
            | Expr::ValueConverter { span, .. }
            | Expr::BindingBehavior { span, .. }
            | Expr::Custom { span, .. } => *span,
            Expr::Bad(bad) => bad.span,
        }
    }

    /// True for forms that may appear on the left of an assignment.
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            Expr::AccessScope { .. }
                | Expr::AccessMember { .. }
                | Expr::AccessKeyed { .. }
                | Expr::AccessBoundary { .. }
                | Expr::AccessThis { .. }
        )
    }

    /// True when this node (or any descendant) is a `Bad` recovery node.
    pub fn has_errors(&self) -> bool {
        if matches!(self, Expr::Bad(_)) {
            return true;
        }
        let mut found = false;
        self.for_each_child(&mut |child| {
            if child.has_errors() {
                found = true;
            }
        });
        found
    }

    /// Invokes `f` for each direct child expression.
    pub fn for_each_child<'a>(&'a self, f: &mut dyn FnMut(&'a Expr)) {
        match self {
            Expr::AccessScope { .. }
            | Expr::AccessThis { .. }
            | Expr::AccessBoundary { .. }
            | Expr::AccessGlobal { .. }
            | Expr::PrimitiveLiteral { .. }
            | Expr::BindingIdentifier { .. }
            | Expr::Custom { .. }
            | Expr::Bad(_) => {}
            Expr::AccessMember { object, .. } => f(object),
            Expr::AccessKeyed { object, key, .. } => {
                f(object);
                f(key);
            }
            Expr::CallScope { args, .. } | Expr::CallGlobal { args, .. } => {
                args.iter().for_each(f);
            }
            Expr::CallMember { object, args, .. } => {
                f(object);
                args.iter().for_each(f);
            }
            Expr::CallFunction { func, args, .. } => {
                f(func);
                args.iter().for_each(f);
            }
            Expr::New { func, args, .. } => {
                f(func);
                args.iter().for_each(f);
            }
            Expr::Unary { expr, .. } => f(expr),
            Expr::Binary { left, right, .. } => {
                f(left);
                f(right);
            }
            Expr::Conditional { cond, yes, no, .. } => {
                f(cond);
                f(yes);
                f(no);
            }
            Expr::Assign { target, value, .. } => {
                f(target);
                f(value);
            }
            Expr::ArrowFunction { body, .. } => f(body),
            Expr::ArrayLiteral { elements, .. } | Expr::ArrayBindingPattern { elements, .. } => {
                elements.iter().for_each(f);
            }
            Expr::ObjectLiteral { entries, .. } | Expr::ObjectBindingPattern { entries, .. } => {
                entries.iter().for_each(|e| f(&e.value));
            }
            Expr::Template { expressions, .. } | Expr::Interpolation { expressions, .. } => {
                expressions.iter().for_each(f);
            }
            Expr::TaggedTemplate {
                tag, expressions, ..
            } => {
                f(tag);
                expressions.iter().for_each(f);
            }
            Expr::BindingPatternDefault {
                target, default, ..
            } => {
                f(target);
                f(default);
            }
            Expr::ForOfStatement {
                declaration,
                iterable,
                ..
            } => {
                f(declaration);
                f(iterable);
            }
            Expr::Paren { inner, .. } => f(inner),
            Expr::ValueConverter { expression, args, .. }
            | Expr::BindingBehavior { expression, args, .. } => {
                f(expression);
                args.iter().for_each(f);
            }
        }
    }

    /// Shifts every span in the tree forward by `base`. Applied exactly once,
    /// at the end of a parse that received a base span.
    pub fn rebase(&mut self, base: source_map::ByteOffset) {
        fn shift_ident(id: &mut Identifier, base: source_map::ByteOffset) {
            id.span = id.span.rebase(base);
        }
        match self {
            Expr::AccessScope { span, name, .. } => {
                *span = span.rebase(base);
                shift_ident(name, base);
            }
            Expr::AccessMember {
                span, object, name, ..
            } => {
                *span = span.rebase(base);
                object.rebase(base);
                shift_ident(name, base);
            }
            Expr::AccessKeyed {
                span, object, key, ..
            } => {
                *span = span.rebase(base);
                object.rebase(base);
                key.rebase(base);
            }
            Expr::AccessThis { span, .. }
            | Expr::AccessBoundary { span }
            | Expr::PrimitiveLiteral { span, .. }
            | Expr::BindingIdentifier { span, .. }
            | Expr::Custom { span, .. } => *span = span.rebase(base),
            Expr::AccessGlobal { span, name } => {
                *span = span.rebase(base);
                shift_ident(name, base);
            }
            Expr::CallScope {
                span, name, args, ..
            }
            | Expr::CallGlobal {
                span, name, args, ..
            } => {
                *span = span.rebase(base);
                shift_ident(name, base);
                args.iter_mut().for_each(|a| a.rebase(base));
            }
            Expr::CallMember {
                span,
                object,
                name,
                args,
                ..
            } => {
                *span = span.rebase(base);
                object.rebase(base);
                shift_ident(name, base);
                args.iter_mut().for_each(|a| a.rebase(base));
            }
            Expr::CallFunction {
                span, func, args, ..
            }
            | Expr::New {
                span, func, args, ..
            } => {
                *span = span.rebase(base);
                func.rebase(base);
                args.iter_mut().for_each(|a| a.rebase(base));
            }
            Expr::Unary { span, expr, .. } => {
                *span = span.rebase(base);
                expr.rebase(base);
            }
            Expr::Binary {
                span, left, right, ..
            } => {
                *span = span.rebase(base);
                left.rebase(base);
                right.rebase(base);
            }
            Expr::Conditional {
                span,
                cond,
                yes,
                no,
            } => {
                *span = span.rebase(base);
                cond.rebase(base);
                yes.rebase(base);
                no.rebase(base);
            }
            Expr::Assign {
                span,
                target,
                value,
                ..
            } => {
                *span = span.rebase(base);
                target.rebase(base);
                value.rebase(base);
            }
            Expr::ArrowFunction { span, params, body } => {
                *span = span.rebase(base);
                params.iter_mut().for_each(|p| shift_ident(&mut p.name, base));
                body.rebase(base);
            }
            Expr::ArrayLiteral { span, elements }
            | Expr::ArrayBindingPattern { span, elements } => {
                *span = span.rebase(base);
                elements.iter_mut().for_each(|e| e.rebase(base));
            }
            Expr::ObjectLiteral { span, entries }
            | Expr::ObjectBindingPattern { span, entries } => {
                *span = span.rebase(base);
                for entry in entries {
                    match &mut entry.key {
                        ObjectKey::Ident(id) => shift_ident(id, base),
                        ObjectKey::Str { span, .. } | ObjectKey::Number { span, .. } => {
                            *span = span.rebase(base);
                        }
                    }
                    entry.value.rebase(base);
                }
            }
            Expr::Template {
                span, expressions, ..
            }
            | Expr::Interpolation {
                span, expressions, ..
            } => {
                *span = span.rebase(base);
                expressions.iter_mut().for_each(|e| e.rebase(base));
            }
            Expr::TaggedTemplate {
                span,
                tag,
                expressions,
                ..
            } => {
                *span = span.rebase(base);
                tag.rebase(base);
                expressions.iter_mut().for_each(|e| e.rebase(base));
            }
            Expr::BindingPatternDefault {
                span,
                target,
                default,
            } => {
                *span = span.rebase(base);
                target.rebase(base);
                default.rebase(base);
            }
            Expr::ForOfStatement {
                span,
                declaration,
                iterable,
            } => {
                *span = span.rebase(base);
                declaration.rebase(base);
                iterable.rebase(base);
            }
            Expr::Paren { span, inner } => {
                *span = span.rebase(base);
                inner.rebase(base);
            }
            Expr::ValueConverter {
                span,
                expression,
                name,
                args,
            }
            | Expr::BindingBehavior {
                span,
                expression,
                name,
                args,
            } => {
                *span = span.rebase(base);
                expression.rebase(base);
                shift_ident(name, base);
                args.iter_mut().for_each(|a| a.rebase(base));
            }
            Expr::Bad(bad) => bad.span = bad.span.rebase(base),
        }
    }
}
