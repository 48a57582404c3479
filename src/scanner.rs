//! Bracket-aware matching for `expectTypeOf` call chains
//!
//! The regex rules stop at the first plausible closing delimiter, so an
//! operand like `fn(a)` or `Array<Map<K, V>>` can end a match early or
//! prevent one entirely. This scanner reads each operand with an explicit
//! nesting stack instead, and only rewrites a call whose shape matches the
//! rule it was asked to apply.
//!
//! The scanner does not parse comments. An apostrophe in a `//` comment
//! inside a multi-line operand (`// don't`) opens a quoted literal, so the
//! operand never closes and that call is left unchanged.

use std::borrow::Cow;
use std::fmt;

const KEYWORD: &str = "expectTypeOf";

/// How an operand is written in the call chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// `(expr)`
    Value,
    /// `<Type>()`
    Type,
}

/// Which assertion the call makes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// `toEqualTypeOf`, emitted as `exact`
    Equal,
    /// `toMatchTypeOf`, emitted as `sub`
    Match,
}

impl Relation {
    fn method(self) -> &'static str {
        match self {
            Relation::Equal => ".toEqualTypeOf",
            Relation::Match => ".toMatchTypeOf",
        }
    }

    fn assertion(self) -> &'static str {
        match self {
            Relation::Equal => "exact",
            Relation::Match => "sub",
        }
    }
}

/// The shape of one `expectTypeOf` call chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallShape {
    pub subject: Operand,
    pub negated: bool,
    pub relation: Relation,
    pub expected: Operand,
}

impl CallShape {
    pub const fn new(
        subject: Operand,
        negated: bool,
        relation: Relation,
        expected: Operand,
    ) -> Self {
        Self {
            subject,
            negated,
            relation,
            expected,
        }
    }

    /// Rewrite every call of this shape in `input`, left to right, without overlap
    ///
    /// Calls of other shapes are left in place and scanning continues inside
    /// them, so a nested call can still be rewritten.
    pub fn rewrite<'a>(&self, input: &'a str) -> Cow<'a, str> {
        let mut output = String::new();
        let mut copied_to = 0;
        let mut cursor = 0;

        while let Some(offset) = input[cursor..].find(KEYWORD) {
            let start = cursor + offset;
            match parse_call(input, start) {
                Some(call) if call.shape == *self => {
                    output.push_str(&input[copied_to..start]);
                    call.render_into(&mut output);
                    copied_to = call.end;
                    cursor = call.end;
                }
                _ => cursor = start + KEYWORD.len(),
            }
        }

        if copied_to == 0 {
            return Cow::Borrowed(input);
        }
        output.push_str(&input[copied_to..]);
        Cow::Owned(output)
    }
}

impl fmt::Display for CallShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operand = |o: Operand, name: &str| match o {
            Operand::Value => format!("({name})"),
            Operand::Type => format!("<{name}>()"),
        };
        write!(
            f,
            "{KEYWORD}{}{}{}{}",
            operand(self.subject, "actual"),
            if self.negated { ".not" } else { "" },
            self.relation.method(),
            operand(self.expected, "expected"),
        )
    }
}

/// A call chain located in the source text
#[derive(Debug)]
struct ParsedCall<'a> {
    shape: CallShape,
    subject: &'a str,
    expected: &'a str,
    /// Byte offset just past the call
    end: usize,
}

impl ParsedCall<'_> {
    fn render_into(&self, out: &mut String) {
        out.push_str("Ts.Assert.");
        if self.shape.negated {
            out.push_str("not.");
        }
        out.push_str(self.shape.relation.assertion());
        out.push_str(".ofAs<");
        if self.shape.expected == Operand::Value {
            out.push_str("typeof ");
        }
        out.push_str(self.expected);
        out.push_str(">()");
        match self.shape.subject {
            Operand::Type => {
                out.push_str(".onAs<");
                out.push_str(self.subject);
                out.push_str(">()");
            }
            Operand::Value => {
                out.push_str(".on(");
                out.push_str(self.subject);
                out.push(')');
            }
        }
    }
}

fn parse_call(input: &str, start: usize) -> Option<ParsedCall<'_>> {
    let mut pos = start + KEYWORD.len();
    let (subject_kind, subject, next) = parse_operand(input, pos)?;
    pos = next;

    let negated = input[pos..].starts_with(".not.");
    if negated {
        pos += ".not".len();
    }

    let relation = [Relation::Equal, Relation::Match]
        .into_iter()
        .find(|r| input[pos..].starts_with(r.method()))?;
    pos += relation.method().len();

    let (expected_kind, expected, end) = parse_operand(input, pos)?;

    Some(ParsedCall {
        shape: CallShape::new(subject_kind, negated, relation, expected_kind),
        subject,
        expected,
        end,
    })
}

/// Read `(expr)` or `<Type>()` at `pos`, returning the operand text and the offset after it
fn parse_operand(input: &str, pos: usize) -> Option<(Operand, &str, usize)> {
    let (kind, close) = match input.as_bytes().get(pos)? {
        b'(' => (Operand::Value, find_closing(input, pos)?),
        b'<' => (Operand::Type, find_closing(input, pos)?),
        _ => return None,
    };

    let inner = &input[pos + 1..close];
    if inner.is_empty() {
        return None;
    }

    match kind {
        Operand::Value => Some((kind, inner, close + 1)),
        Operand::Type if input[close + 1..].starts_with("()") => Some((kind, inner, close + 3)),
        Operand::Type => None,
    }
}

/// Find the delimiter that closes the bracket at `open`
///
/// Tracks `()`, `<>`, `[]` and `{}` on one stack. A `>` preceded by `=` is an
/// arrow, not a closer. A `<` that is never closed (a comparison inside a value
/// operand) is discarded when an outer bracket closes over it. Quoted literals
/// are skipped; comments are not recognized, so a quote character inside one
/// is taken as the start of a literal.
fn find_closing(input: &str, open: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut stack: Vec<u8> = Vec::new();
    let mut quote: Option<u8> = None;
    let mut i = open;

    while i < bytes.len() {
        let b = bytes[i];

        if let Some(q) = quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'(' => stack.push(b')'),
            b'[' => stack.push(b']'),
            b'{' => stack.push(b'}'),
            b'<' => stack.push(b'>'),
            b'>' if i > 0 && bytes[i - 1] == b'=' => {}
            b'>' => {
                if stack.last() == Some(&b'>') {
                    stack.pop();
                    if stack.is_empty() {
                        return Some(i);
                    }
                }
                // otherwise a stray comparison operator
            }
            b')' | b']' | b'}' => {
                while stack.last() == Some(&b'>') {
                    stack.pop();
                }
                if stack.last() != Some(&b) {
                    return None;
                }
                stack.pop();
                if stack.is_empty() {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }

    None
}
