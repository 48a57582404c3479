//! Rewrite rules and the built-in rule sets
//!
//! A [`RuleSet`] is an ordered list of rules. Each rule rewrites the whole
//! text and hands its output to the next one, so a later rule may match text
//! an earlier rule produced.

use crate::replacement::convert_backreferences;
use crate::scanner::{CallShape, Operand, Relation};
use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Which group of built-in rules to start from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RuleSetKind {
    /// Every supported assertion form (six rules)
    #[default]
    All,
    /// Only the `toEqualTypeOf<T>()` forms, type-only calls may span lines
    Remaining,
}

/// How the built-in rules locate call chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Non-greedy regular expressions, stop at the first closing delimiter
    #[default]
    Regex,
    /// Nesting-aware scanner, handles nested brackets in operands
    Balanced,
}

impl fmt::Display for RuleSetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RuleSetKind::All => "all",
            RuleSetKind::Remaining => "remaining",
        })
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Regex => "regex",
            Strategy::Balanced => "balanced",
        })
    }
}

/// How a rule finds the text it replaces
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Regex with a `${N}` replacement template
    Pattern { regex: Regex, replacement: String },
    /// Bracket-aware call chain of one shape
    Call(CallShape),
}

#[derive(Debug, Clone)]
pub struct RewriteRule {
    name: String,
    matcher: Matcher,
}

impl RewriteRule {
    /// Compile a regex rule. Backslash group references in the template are accepted.
    pub fn pattern(name: impl Into<String>, pattern: &str, replacement: &str) -> Result<Self> {
        let name = name.into();
        let regex = Regex::new(pattern)
            .with_context(|| format!("Invalid pattern in rule '{}': {}", name, pattern))?;
        Ok(Self {
            name,
            matcher: Matcher::Pattern {
                regex,
                replacement: convert_backreferences(replacement),
            },
        })
    }

    /// Like [`RewriteRule::pattern`], but `.` also matches newlines
    pub fn multiline_pattern(
        name: impl Into<String>,
        pattern: &str,
        replacement: &str,
    ) -> Result<Self> {
        let name = name.into();
        let regex = RegexBuilder::new(pattern)
            .dot_matches_new_line(true)
            .build()
            .with_context(|| format!("Invalid pattern in rule '{}': {}", name, pattern))?;
        Ok(Self {
            name,
            matcher: Matcher::Pattern {
                regex,
                replacement: convert_backreferences(replacement),
            },
        })
    }

    pub fn call(name: impl Into<String>, shape: CallShape) -> Self {
        Self {
            name: name.into(),
            matcher: Matcher::Call(shape),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Replace every non-overlapping match, left to right
    pub fn apply<'a>(&self, input: &'a str) -> Cow<'a, str> {
        match &self.matcher {
            Matcher::Pattern { regex, replacement } => {
                regex.replace_all(input, replacement.as_str())
            }
            Matcher::Call(shape) => shape.rewrite(input),
        }
    }
}

impl fmt::Display for RewriteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.matcher {
            Matcher::Pattern { regex, replacement } => {
                write!(f, "{}: {} -> {}", self.name, regex.as_str(), replacement)
            }
            Matcher::Call(shape) => write!(f, "{}: {} (balanced)", self.name, shape),
        }
    }
}

/// One built-in rule, in both strategies
struct Builtin {
    name: &'static str,
    pattern: &'static str,
    replacement: &'static str,
    shape: CallShape,
}

const VALUE_EQUAL_VALUE: Builtin = Builtin {
    name: "value-equal-value",
    pattern: r"expectTypeOf\(([^)]+?)\)\.toEqualTypeOf\(([^)]+?)\)",
    replacement: "Ts.Assert.exact.ofAs<typeof ${2}>().on(${1})",
    shape: CallShape::new(Operand::Value, false, Relation::Equal, Operand::Value),
};

const VALUE_MATCH_TYPE: Builtin = Builtin {
    name: "value-match-type",
    pattern: r"expectTypeOf\(([^)]+?)\)\.toMatchTypeOf<(.+?)>\(\)",
    replacement: "Ts.Assert.sub.ofAs<${2}>().on(${1})",
    shape: CallShape::new(Operand::Value, false, Relation::Match, Operand::Type),
};

const TYPE_MATCH_TYPE: Builtin = Builtin {
    name: "type-match-type",
    pattern: r"expectTypeOf<(.+?)>\(\)\.toMatchTypeOf<(.+?)>\(\)",
    replacement: "Ts.Assert.sub.ofAs<${2}>().onAs<${1}>()",
    shape: CallShape::new(Operand::Type, false, Relation::Match, Operand::Type),
};

const TYPE_NOT_MATCH_TYPE: Builtin = Builtin {
    name: "type-not-match-type",
    pattern: r"expectTypeOf<(.+?)>\(\)\.not\.toMatchTypeOf<(.+?)>\(\)",
    replacement: "Ts.Assert.not.sub.ofAs<${2}>().onAs<${1}>()",
    shape: CallShape::new(Operand::Type, true, Relation::Match, Operand::Type),
};

const VALUE_EQUAL_TYPE: Builtin = Builtin {
    name: "value-equal-type",
    pattern: r"expectTypeOf\(([^)]+?)\)\.toEqualTypeOf<(.+?)>\(\)",
    replacement: "Ts.Assert.exact.ofAs<${2}>().on(${1})",
    shape: CallShape::new(Operand::Value, false, Relation::Equal, Operand::Type),
};

const TYPE_EQUAL_TYPE: Builtin = Builtin {
    name: "type-equal-type",
    pattern: r"expectTypeOf<(.+?)>\(\)\.toEqualTypeOf<(.+?)>\(\)",
    replacement: "Ts.Assert.exact.ofAs<${2}>().onAs<${1}>()",
    shape: CallShape::new(Operand::Type, false, Relation::Equal, Operand::Type),
};

/// Application order matters: value forms run before type-only forms.
const ALL: [&Builtin; 6] = [
    &VALUE_EQUAL_VALUE,
    &VALUE_MATCH_TYPE,
    &TYPE_MATCH_TYPE,
    &TYPE_NOT_MATCH_TYPE,
    &VALUE_EQUAL_TYPE,
    &TYPE_EQUAL_TYPE,
];

const REMAINING: [&Builtin; 2] = [&VALUE_EQUAL_TYPE, &TYPE_EQUAL_TYPE];

/// An ordered list of rewrite rules
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<RewriteRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<RewriteRule>) -> Self {
        Self { rules }
    }

    /// Build one of the built-in rule sets
    pub fn builtin(kind: RuleSetKind, strategy: Strategy) -> Result<Self> {
        let builtins: &[&Builtin] = match kind {
            RuleSetKind::All => &ALL,
            RuleSetKind::Remaining => &REMAINING,
        };

        let rules = builtins
            .iter()
            .map(|b| match strategy {
                Strategy::Balanced => Ok(RewriteRule::call(b.name, b.shape)),
                // Type-only calls in the remaining set may be split across lines
                Strategy::Regex
                    if kind == RuleSetKind::Remaining && b.shape.subject == Operand::Type =>
                {
                    RewriteRule::multiline_pattern(b.name, b.pattern, b.replacement)
                }
                Strategy::Regex => RewriteRule::pattern(b.name, b.pattern, b.replacement),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    /// Append a rule; it runs after every rule already in the set
    pub fn push(&mut self, rule: RewriteRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule in order, each on the previous rule's output
    pub fn apply<'a>(&self, input: &'a str) -> Cow<'a, str> {
        let mut content = Cow::Borrowed(input);

        for rule in &self.rules {
            let rewritten = match rule.apply(&content) {
                Cow::Owned(next) => Some(next),
                Cow::Borrowed(_) => None,
            };
            if let Some(next) = rewritten {
                tracing::debug!(rule = rule.name(), "rule matched");
                content = Cow::Owned(next);
            }
        }

        content
    }
}
