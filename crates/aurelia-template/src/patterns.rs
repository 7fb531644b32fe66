//! Attribute-name analysis through a pluggable pattern registry.
//!
//! A pattern is a template of literal characters, `PART` placeholders, and
//! separator symbols (`PART.PART`, `:PART`, `@PART:PART`). Matching is
//! precedence-ordered: more static characters first, then more symbol
//! runs, then earliest registration. Dynamic segments are non-empty.
//!
//! The registry freezes on first analysis; the analyzer memoizes matched
//! segmentations by raw name but re-runs the pattern handler on every hit
//! because handler output feeds instruction construction.

use crate::error::RegistryFrozen;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use source_map::Span;

/// One matched `PART` with its location inside the attribute name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartMatch {
    /// The matched text.
    pub text: SmolStr,
    /// Span relative to the attribute-name start.
    pub span: Span,
}

/// The analyzed shape of an attribute name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrSyntax {
    /// The raw attribute name.
    pub raw: SmolStr,
    /// The binding target (property, attribute, or controller name).
    pub target: SmolStr,
    /// The binding command, when the pattern implies one.
    pub command: Option<SmolStr>,
    /// Span of the target segment, relative to the name start.
    pub target_span: Option<Span>,
    /// Span of the command segment, relative to the name start.
    pub command_span: Option<Span>,
    /// All matched parts, in order.
    pub parts: Vec<PartMatch>,
    /// The pattern that matched, `None` for the identity fallback.
    pub pattern: Option<SmolStr>,
}

impl AttrSyntax {
    /// The identity analysis: the whole name is the target, no command.
    pub fn identity(raw: &str) -> Self {
        Self {
            raw: SmolStr::from(raw),
            target: SmolStr::from(raw),
            command: None,
            target_span: Some(Span::new(0u32, raw.len() as u32)),
            command_span: None,
            parts: Vec::new(),
            pattern: None,
        }
    }
}

/// Handler invoked with the raw name and matched parts to build the syntax.
pub type PatternHandler = fn(&str, &[PartMatch]) -> AttrSyntax;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(SmolStr),
    Symbol(char),
    Part,
}

struct Pattern {
    template: SmolStr,
    segments: Vec<Segment>,
    static_chars: usize,
    symbol_runs: usize,
    registration: usize,
    handler: PatternHandler,
}

fn compile_segments(template: &str, symbols: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = template;
    while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix("PART") {
            if !literal.is_empty() {
                segments.push(Segment::Literal(SmolStr::from(std::mem::take(
                    &mut literal,
                ))));
            }
            segments.push(Segment::Part);
            rest = stripped;
            continue;
        }
        let ch = rest.chars().next().expect("non-empty rest");
        if symbols.contains(ch) {
            if !literal.is_empty() {
                segments.push(Segment::Literal(SmolStr::from(std::mem::take(
                    &mut literal,
                ))));
            }
            segments.push(Segment::Symbol(ch));
        } else {
            literal.push(ch);
        }
        rest = &rest[ch.len_utf8()..];
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(SmolStr::from(literal)));
    }
    segments
}

fn count_symbol_runs(segments: &[Segment]) -> usize {
    let mut runs = 0;
    let mut in_run = false;
    for segment in segments {
        match segment {
            Segment::Symbol(_) => {
                if !in_run {
                    runs += 1;
                    in_run = true;
                }
            }
            _ => in_run = false,
        }
    }
    runs
}

/// Matches `name` against the compiled segments, capturing parts. Non-final
/// parts match lazily so a `PART.PART` split lands on the first separator.
fn match_segments(segments: &[Segment], name: &str) -> Option<Vec<PartMatch>> {
    fn recurse(
        segments: &[Segment],
        name: &str,
        pos: usize,
        parts: &mut Vec<PartMatch>,
    ) -> bool {
        let Some((segment, rest)) = segments.split_first() else {
            return pos == name.len();
        };
        match segment {
            Segment::Literal(lit) => {
                if name[pos..].starts_with(lit.as_str()) {
                    recurse(rest, name, pos + lit.len(), parts)
                } else {
                    false
                }
            }
            Segment::Symbol(sym) => {
                if name[pos..].starts_with(*sym) {
                    recurse(rest, name, pos + sym.len_utf8(), parts)
                } else {
                    false
                }
            }
            Segment::Part => {
                let mut end = pos;
                let bytes = name.as_bytes();
                while end < name.len() {
                    end += utf8_len(bytes[end]);
                    parts.push(PartMatch {
                        text: SmolStr::from(&name[pos..end]),
                        span: Span::new(pos as u32, end as u32),
                    });
                    if recurse(rest, name, end, parts) {
                        return true;
                    }
                    parts.pop();
                }
                false
            }
        }
    }

    let mut parts = Vec::new();
    recurse(segments, name, 0, &mut parts).then_some(parts)
}

fn utf8_len(first_byte: u8) -> usize {
    match first_byte {
        b if b < 0x80 => 1,
        b if b >= 0xF0 => 4,
        b if b >= 0xE0 => 3,
        _ => 2,
    }
}

/// The ordered pattern registry.
pub struct PatternRegistry {
    patterns: Vec<Pattern>,
    frozen: bool,
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::with_default_patterns()
    }
}

impl PatternRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            patterns: Vec::new(),
            frozen: false,
        }
    }

    /// The built-in pattern set.
    pub fn with_default_patterns() -> Self {
        let mut registry = Self::new();
        registry
            .register_pattern("PART.PART", ".", handlers::target_command)
            .expect("fresh registry");
        registry
            .register_pattern("PART.PART.PART", ".", handlers::target_command_modifier)
            .expect("fresh registry");
        registry
            .register_pattern(":PART", ":", handlers::colon_bind)
            .expect("fresh registry");
        registry
            .register_pattern("@PART", "@", handlers::at_trigger)
            .expect("fresh registry");
        registry
            .register_pattern("@PART:PART", "@:", handlers::at_trigger_modifier)
            .expect("fresh registry");
        registry
            .register_pattern("...PART", "", handlers::spread)
            .expect("fresh registry");
        registry
    }

    /// Registers a pattern. Fails once the registry has been used for
    /// analysis.
    pub fn register_pattern(
        &mut self,
        template: &str,
        symbols: &str,
        handler: PatternHandler,
    ) -> Result<(), RegistryFrozen> {
        if self.frozen {
            return Err(RegistryFrozen);
        }
        let segments = compile_segments(template, symbols);
        let static_chars = segments
            .iter()
            .map(|s| match s {
                Segment::Literal(lit) => lit.len(),
                _ => 0,
            })
            .sum();
        let symbol_runs = count_symbol_runs(&segments);
        self.patterns.push(Pattern {
            template: SmolStr::from(template),
            segments,
            static_chars,
            symbol_runs,
            registration: self.patterns.len(),
            handler,
        });
        // Precedence: more statics, then more symbol runs, then first
        // registered.
        self.patterns.sort_by(|a, b| {
            b.static_chars
                .cmp(&a.static_chars)
                .then(b.symbol_runs.cmp(&a.symbol_runs))
                .then(a.registration.cmp(&b.registration))
        });
        Ok(())
    }

    /// True once analysis has started.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn freeze(&mut self) {
        self.frozen = true;
    }

    fn find_match(&self, name: &str) -> Option<(&Pattern, Vec<PartMatch>)> {
        for pattern in &self.patterns {
            if let Some(parts) = match_segments(&pattern.segments, name) {
                return Some((pattern, parts));
            }
        }
        None
    }
}

/// Memoizing attribute-name analyzer over a [`PatternRegistry`].
pub struct AttributeParser {
    registry: PatternRegistry,
    /// Raw name → (pattern template, parts); `None` marks the identity
    /// fallback. Handlers re-run on every lookup.
    cache: FxHashMap<SmolStr, Option<(SmolStr, Vec<PartMatch>)>>,
}

impl Default for AttributeParser {
    fn default() -> Self {
        Self::new(PatternRegistry::with_default_patterns())
    }
}

impl AttributeParser {
    /// Creates an analyzer over the given registry.
    pub fn new(registry: PatternRegistry) -> Self {
        Self {
            registry,
            cache: FxHashMap::default(),
        }
    }

    /// Registers an extra pattern; fails after the first analysis.
    pub fn register_pattern(
        &mut self,
        template: &str,
        symbols: &str,
        handler: PatternHandler,
    ) -> Result<(), RegistryFrozen> {
        self.registry.register_pattern(template, symbols, handler)
    }

    /// Analyzes an attribute name into target and command segments.
    pub fn analyze(&mut self, name: &str) -> AttrSyntax {
        self.registry.freeze();
        if let Some(cached) = self.cache.get(name) {
            return match cached {
                None => AttrSyntax::identity(name),
                Some((template, parts)) => {
                    let handler = self
                        .registry
                        .patterns
                        .iter()
                        .find(|p| p.template == *template)
                        .expect("cached pattern still registered")
                        .handler;
                    handler(name, parts)
                }
            };
        }
        match self.registry.find_match(name) {
            Some((pattern, parts)) => {
                let syntax = (pattern.handler)(name, &parts);
                self.cache.insert(
                    SmolStr::from(name),
                    Some((pattern.template.clone(), parts)),
                );
                syntax
            }
            None => {
                self.cache.insert(SmolStr::from(name), None);
                AttrSyntax::identity(name)
            }
        }
    }
}

/// Built-in pattern handlers.
pub mod handlers {
    use super::{AttrSyntax, PartMatch};
    use smol_str::SmolStr;

    /// `PART.PART` → target + command.
    pub fn target_command(raw: &str, parts: &[PartMatch]) -> AttrSyntax {
        AttrSyntax {
            raw: SmolStr::from(raw),
            target: parts[0].text.clone(),
            command: Some(parts[1].text.clone()),
            target_span: Some(parts[0].span),
            command_span: Some(parts[1].span),
            parts: parts.to_vec(),
            pattern: Some(SmolStr::new_static("PART.PART")),
        }
    }

    /// `PART.PART.PART` → target + command, third part kept as a modifier.
    pub fn target_command_modifier(raw: &str, parts: &[PartMatch]) -> AttrSyntax {
        AttrSyntax {
            raw: SmolStr::from(raw),
            target: parts[0].text.clone(),
            command: Some(parts[1].text.clone()),
            target_span: Some(parts[0].span),
            command_span: Some(parts[1].span),
            parts: parts.to_vec(),
            pattern: Some(SmolStr::new_static("PART.PART.PART")),
        }
    }

    /// `:PART` → target with the implicit `bind` command.
    pub fn colon_bind(raw: &str, parts: &[PartMatch]) -> AttrSyntax {
        AttrSyntax {
            raw: SmolStr::from(raw),
            target: parts[0].text.clone(),
            command: Some(SmolStr::new_static("bind")),
            target_span: Some(parts[0].span),
            command_span: None,
            parts: parts.to_vec(),
            pattern: Some(SmolStr::new_static(":PART")),
        }
    }

    /// `@PART` → target with the implicit `trigger` command.
    pub fn at_trigger(raw: &str, parts: &[PartMatch]) -> AttrSyntax {
        AttrSyntax {
            raw: SmolStr::from(raw),
            target: parts[0].text.clone(),
            command: Some(SmolStr::new_static("trigger")),
            target_span: Some(parts[0].span),
            command_span: None,
            parts: parts.to_vec(),
            pattern: Some(SmolStr::new_static("@PART")),
        }
    }

    /// `@PART:PART` → trigger with a modifier part (`once`, `capture`).
    pub fn at_trigger_modifier(raw: &str, parts: &[PartMatch]) -> AttrSyntax {
        AttrSyntax {
            raw: SmolStr::from(raw),
            target: parts[0].text.clone(),
            command: Some(SmolStr::new_static("trigger")),
            target_span: Some(parts[0].span),
            command_span: Some(parts[1].span),
            parts: parts.to_vec(),
            pattern: Some(SmolStr::new_static("@PART:PART")),
        }
    }

    /// `...PART` → spread.
    pub fn spread(raw: &str, parts: &[PartMatch]) -> AttrSyntax {
        AttrSyntax {
            raw: SmolStr::from(raw),
            target: parts[0].text.clone(),
            command: Some(SmolStr::new_static("spread")),
            target_span: Some(parts[0].span),
            command_span: None,
            parts: parts.to_vec(),
            pattern: Some(SmolStr::new_static("...PART")),
        }
    }
}
