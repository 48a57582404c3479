//! Replacement Template Conversion
//!
//! User-defined rules may write group references the way the old migration
//! scripts did (`\1`, `\g<2>`), or the way the `regex` crate expects them
//! (`$1`, `${1}`). Both forms are accepted; the backslash forms are rewritten
//! to braced `${N}` references before the template reaches `Regex::replace_all`.
//!
//! Braces are always emitted because `$1abc` would otherwise be read by the
//! regex crate as a reference to a group named `1abc`.

/// Convert backslash group references in a replacement template to `${N}` form
///
/// # Conversion Rules
///
/// - `\1`, `\12` → `${1}`, `${12}` - numbered group
/// - `\g<2>`, `\g<name>` → `${2}`, `${name}` - explicit group
/// - `\\` → `\` - escaped backslash
/// - any other escape is kept literally
/// - `$` references pass through untouched; a literal dollar is written `$$`
///
/// # Examples
///
/// ```
/// use typeshift::replacement::convert_backreferences;
///
/// assert_eq!(convert_backreferences(r"\1"), "${1}");
/// assert_eq!(convert_backreferences(r"ofAs<\2>().on(\1)"), "ofAs<${2}>().on(${1})");
/// assert_eq!(convert_backreferences("$1"), "$1");
/// ```
pub fn convert_backreferences(template: &str) -> String {
    let mut result = String::with_capacity(template.len() + 8);
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }

        match chars.peek().copied() {
            Some(d) if d.is_ascii_digit() => {
                let mut group = String::new();
                while let Some(&d) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    group.push(d);
                    chars.next();
                }
                push_group(&mut result, &group);
            }
            Some('g') => {
                chars.next();
                if chars.peek() == Some(&'<') {
                    chars.next();
                    let mut name = String::new();
                    let mut closed = false;
                    for n in chars.by_ref() {
                        if n == '>' {
                            closed = true;
                            break;
                        }
                        name.push(n);
                    }
                    if closed && !name.is_empty() {
                        push_group(&mut result, &name);
                    } else {
                        // Not a group reference after all, keep what we consumed
                        result.push_str("\\g<");
                        result.push_str(&name);
                    }
                } else {
                    result.push_str("\\g");
                }
            }
            Some('\\') => {
                chars.next();
                result.push('\\');
            }
            Some(other) => {
                chars.next();
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}

fn push_group(result: &mut String, group: &str) {
    result.push_str("${");
    result.push_str(group);
    result.push('}');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_backreferences() {
        assert_eq!(convert_backreferences(r"\1"), "${1}");
        assert_eq!(convert_backreferences(r"\2\1"), "${2}${1}");
        assert_eq!(convert_backreferences(r"foo\1bar"), "foo${1}bar");
        assert_eq!(convert_backreferences(r"\12"), "${12}");
    }

    #[test]
    fn test_named_group_syntax() {
        assert_eq!(convert_backreferences(r"\g<2>"), "${2}");
        assert_eq!(convert_backreferences(r"\g<actual>x"), "${actual}x");
        assert_eq!(convert_backreferences(r"\g<oops"), r"\g<oops");
        assert_eq!(convert_backreferences(r"\gx"), r"\gx");
    }

    #[test]
    fn test_dollar_references_pass_through() {
        assert_eq!(convert_backreferences("$1$2"), "$1$2");
        assert_eq!(convert_backreferences("${1}"), "${1}");
        assert_eq!(convert_backreferences(r"foo\1bar$2"), "foo${1}bar$2");
    }

    #[test]
    fn test_escape_sequences() {
        assert_eq!(convert_backreferences(r"\\"), "\\");
        assert_eq!(convert_backreferences(r"\n"), "\\n");
        assert_eq!(convert_backreferences("trailing\\"), "trailing\\");
    }

    #[test]
    fn test_original_script_template() {
        let converted = convert_backreferences(r"Ts.Assert.exact.ofAs<typeof \2>().on(\1)");
        assert_eq!(converted, "Ts.Assert.exact.ofAs<typeof ${2}>().on(${1})");
    }
}
