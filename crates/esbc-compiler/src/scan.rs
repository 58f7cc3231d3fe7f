//! Scanning helpers over source text.
//!
//! Every helper here sees text through the same lens: string literals
//! (`"…"`, `\"` escaped) are opaque, and "top level" means outside any
//! `()`, `{}` or `[]` pair.

use esbc_ast::BinOp;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level iteration
// ─────────────────────────────────────────────────────────────────────────────

/// Yields `(byte_index, char)` for every character sitting at depth 0 outside
/// strings. Opening brackets are yielded at their outer depth, closing brackets
/// once the depth is back to 0; quote characters are never yielded.
pub struct TopLevel<'a> {
    chars: core::str::CharIndices<'a>,
    depth: usize,
    in_str: bool,
    escaped: bool,
}

impl<'a> TopLevel<'a> {
    /// Starts a scan over `text`.
    pub fn new(text: &'a str) -> Self { Self { chars: text.char_indices(), depth: 0, in_str: false, escaped: false } }
}

impl Iterator for TopLevel<'_> {
    type Item = (usize, char);

    fn next(&mut self) -> Option<Self::Item> {
        for (i, c) in self.chars.by_ref() {
            if self.in_str {
                if self.escaped {
                    self.escaped = false;
                } else if c == '\\' {
                    self.escaped = true;
                } else if c == '"' {
                    self.in_str = false;
                }
                continue;
            }
            match c {
                '"' => self.in_str = true,
                '(' | '{' | '[' => {
                    self.depth += 1;
                    if self.depth == 1 {
                        return Some((i, c));
                    }
                }
                ')' | '}' | ']' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        return Some((i, c));
                    }
                }
                _ if self.depth == 0 => return Some((i, c)),
                _ => {}
            }
        }
        None
    }
}

/// Byte index of the first top-level occurrence of `pat`.
pub fn find_top(text: &str, pat: &str) -> Option<usize> {
    TopLevel::new(text).map(|(i, _)| i).find(|&i| text[i..].starts_with(pat))
}

/// Splits on a top-level separator character.
pub fn split_top(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, c) in TopLevel::new(text) {
        if c == sep {
            parts.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Index of the bracket closing the one opened at `open` (`(`, `{` or `[`).
pub fn matching_close(text: &str, open: usize) -> Option<usize> {
    let tail = text.get(open..)?;
    let first = tail.chars().next()?;
    if !matches!(first, '(' | '{' | '[') {
        return None;
    }
    // The opener is yielded first at depth 0; the next yielded bracket closes it.
    TopLevel::new(tail)
        .skip(1)
        .find(|&(_, c)| matches!(c, ')' | '}' | ']'))
        .map(|(i, _)| open + i)
}

/// Inner text when the whole of `text` is one `open … close` pair.
pub fn strip_outer(text: &str, open: char, close: char) -> Option<&str> {
    let t = text.trim();
    if !t.starts_with(open) || !t.ends_with(close) {
        return None;
    }
    (matching_close(t, 0)? == t.len() - close.len_utf8()).then(|| t[open.len_utf8()..t.len() - close.len_utf8()].trim())
}

/// Removes one pair of braces wrapping a whole body, if present.
pub fn strip_braces(body: &str) -> &str { strip_outer(body, '{', '}').unwrap_or_else(|| body.trim()) }

/// Inner text of a string literal spanning all of `text`.
pub fn string_literal(text: &str) -> Option<&str> {
    let t = text.trim();
    let rest = t.strip_prefix('"')?;
    let mut escaped = false;
    for (i, c) in rest.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return (i + 1 == rest.len()).then(|| &rest[..i]);
        }
    }
    None
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_word_char(c: char) -> bool { c.is_ascii_alphanumeric() || c == '_' }

/// Text after keyword `kw` when `text` starts with it as a whole word.
pub fn after_keyword<'a>(text: &'a str, kw: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(kw)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if !is_word_char(c) => Some(rest.trim_start()),
        Some(_) => None,
    }
}

/// True if keyword `kw` occurs as a whole word followed by whitespace,
/// outside string literals.
pub fn has_keyword(text: &str, kw: &str) -> bool {
    let code = blank_strings(text);
    code.match_indices(kw).any(|(i, _)| {
        let before_ok = code[..i].chars().next_back().map_or(true, |c| !is_word_char(c));
        let after_ok = code[i + kw.len()..].chars().next().is_some_and(char::is_whitespace);
        before_ok && after_ok
    })
}

/// Copy of `text` with the contents of string literals replaced by spaces.
pub fn blank_strings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_str = false;
    let mut escaped = false;
    for c in text.chars() {
        if in_str {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_str = false;
                out.push(c);
                continue;
            }
            // same byte length, so offsets stay valid in the original text
            for _ in 0..c.len_utf8() {
                out.push(' ');
            }
        } else {
            if c == '"' {
                in_str = true;
            }
            out.push(c);
        }
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────────────

/// Splits a top-level `cond ? then : else`. The `:` paired with the first `?`
/// is found by counting nested `?`, so `a ? b : c ? d : e` nests to the right.
pub fn find_ternary(expr: &str) -> Option<(&str, &str, &str)> {
    let mut question = None;
    let mut nested = 0usize;
    for (i, c) in TopLevel::new(expr) {
        match (c, question) {
            ('?', None) => question = Some(i),
            ('?', Some(_)) => nested += 1,
            (':', Some(q)) if nested == 0 => {
                return Some((expr[..q].trim(), expr[q + 1..i].trim(), expr[i + 1..].trim()));
            }
            (':', Some(_)) => nested -= 1,
            _ => {}
        }
    }
    None
}

/// True when the character before `i` (ignoring blanks) ends an operand, so an
/// operator at `i` is binary rather than a prefix.
fn binary_position(expr: &str, i: usize) -> bool {
    expr[..i]
        .trim_end()
        .chars()
        .next_back()
        .is_some_and(|c| is_word_char(c) || matches!(c, ')' | ']' | '"'))
}

/// Rightmost top-level occurrence of any operator of `group` in binary
/// position; the split point that keeps the group left-associative.
pub fn find_binop(expr: &str, group: &[BinOp]) -> Option<(usize, BinOp)> {
    let positions: Vec<usize> = TopLevel::new(expr).map(|(i, _)| i).collect();
    for &i in positions.iter().rev() {
        let tail = &expr[i..];
        let Some(op) = group.iter().copied().find(|op| tail.starts_with(op.symbol())) else {
            continue;
        };
        let sym = op.symbol();
        let next = tail[sym.len()..].chars().next();
        let prev = expr[..i].chars().next_back();
        // `<`/`>` of `<=`/`>=`, `=` tails and doubled `<<`/`>>`
        if sym.len() == 1 && matches!(next, Some('=')) {
            continue;
        }
        if matches!(sym, "<" | ">") && (prev == Some('<') || prev == Some('>') || next == Some('<') || next == Some('>')) {
            continue;
        }
        if sym == "==" && matches!(prev, Some('=' | '!' | '<' | '>')) {
            continue;
        }
        if binary_position(expr, i) {
            return Some((i, op));
        }
    }
    None
}

/// `name(args…)` spanning all of `expr`; empty arguments are dropped.
pub fn parse_call(expr: &str) -> Option<(&str, Vec<&str>)> {
    let open = expr.find('(')?;
    let name = expr[..open].trim();
    if !is_identifier(name) || matching_close(expr, open)? != expr.len() - 1 {
        return None;
    }
    let args = split_top(&expr[open + 1..expr.len() - 1], ',')
        .into_iter()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .collect();
    Some((name, args))
}

/// A range bound pair `start..=end` (inclusive) or `start..end`.
pub fn split_range(text: &str) -> Option<(&str, &str, bool)> {
    let at = find_top(text, "..")?;
    let rest = &text[at + 2..];
    match rest.strip_prefix('=') {
        Some(end) => Some((text[..at].trim(), end.trim(), true)),
        None => Some((text[..at].trim(), rest.trim(), false)),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Statements
// ─────────────────────────────────────────────────────────────────────────────

/// Position of a top-level plain `=` (not part of `==`, `!=`, `<=`, `>=`, `:=`,
/// `..=` or a compound operator).
pub fn find_assign(stmt: &str) -> Option<usize> {
    TopLevel::new(stmt).map(|(i, _)| i).find(|&i| {
        stmt[i..].starts_with('=')
            && !stmt[i + 1..].starts_with('=')
            && !matches!(stmt[..i].chars().next_back(), Some('=' | '!' | '<' | '>' | ':' | '.' | '+' | '-' | '*' | '/' | '%'))
    })
}

/// Position and operator of a top-level compound assignment (`+=`, `-=`, `*=`,
/// `/=`, `%=`).
pub fn find_compound(stmt: &str) -> Option<(usize, BinOp)> {
    TopLevel::new(stmt).find_map(|(i, c)| {
        let op = match c {
            '+' => BinOp::Add,
            '-' => BinOp::Sub,
            '*' => BinOp::Mul,
            '/' => BinOp::Div,
            '%' => BinOp::Mod,
            _ => return None,
        };
        let after = &stmt[i + 1..];
        (after.starts_with('=') && !after.starts_with("==")).then_some((i, op))
    })
}

/// Splits `head { body } rest` at the first top-level `{` and its match.
/// Without a closing brace the body runs to the end of the text.
pub fn split_head_block(text: &str) -> Option<(&str, &str, &str)> {
    let open = find_top(text, "{")?;
    let head = text[..open].trim();
    Some(match matching_close(text, open) {
        Some(close) => (head, text[open + 1..close].trim(), text[close + 1..].trim()),
        None => (head, text[open + 1..].trim(), ""),
    })
}

/// Text after `el` when the statement is an alternate branch (`el`,
/// `el if …`, `el { … }`). `el := 5` and `el + 1` use `el` as a name.
pub fn else_branch(stmt: &str) -> Option<&str> {
    after_keyword(stmt, "el").filter(|rest| rest.is_empty() || rest.starts_with('{') || after_keyword(rest, "if").is_some())
}

/// Is this statement an alternate branch?
pub fn is_else_branch(stmt: &str) -> bool { else_branch(stmt).is_some() }

fn ends_with_bare_el(stmt: &str) -> bool {
    let t = stmt.trim_end();
    t.strip_suffix("el")
        .is_some_and(|before| before.chars().next_back().map_or(true, |c| c.is_whitespace() || c == '}'))
}

/// Splits a block into statements on top-level `;` or newline; a `}` bringing
/// the depth back to 0 also ends a statement. Alternate branches are merged
/// into the preceding `if`, so a whole chain comes back as one statement.
pub fn split_statements(body: &str) -> Vec<String> {
    let mut raw = Vec::new();
    let mut start = 0;
    for (i, c) in TopLevel::new(body) {
        match c {
            ';' | '\n' => {
                raw.push(&body[start..i]);
                start = i + 1;
            }
            '}' => {
                raw.push(&body[start..=i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    raw.push(&body[start..]);

    let mut merged: Vec<String> = Vec::new();
    for s in raw.into_iter().map(str::trim).filter(|s| !s.is_empty()) {
        match merged.last_mut() {
            Some(last) if is_else_branch(s) && after_keyword(last, "if").is_some() => {
                last.push('\n');
                last.push_str(s);
            }
            Some(last) if s.starts_with('{') && ends_with_bare_el(last) => {
                last.push(' ');
                last.push_str(s);
            }
            _ => merged.push(s.to_owned()),
        }
    }
    merged
}

/// Rewrites `else` to `el` and `elif` to `el if` (whole words, outside strings).
pub fn normalize_branches(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let code = blank_strings(body);
    let mut i = 0;
    while i < body.len() {
        let rest = &code[i..];
        let boundary = code[..i].chars().next_back().map_or(true, |c| !is_word_char(c));
        let word_end = |kw: &str| rest.starts_with(kw) && rest[kw.len()..].chars().next().map_or(true, |c| !is_word_char(c));
        if boundary && word_end("else") {
            out.push_str("el");
            i += "else".len();
        } else if boundary && word_end("elif") {
            out.push_str("el if");
            i += "elif".len();
        } else {
            let c = body[i..].chars().next().unwrap_or_default();
            out.push(c);
            i += c.len_utf8().max(1);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn top_level_skips_nested_and_strings() {
        let seen: String = TopLevel::new(r#"a(b,c)"x,y"d"#).map(|(_, c)| c).collect();
        assert_eq!(seen, "a()d");
        assert_eq!(split_top(r#"1, f(2, 3), "a,b""#, ','), vec!["1", " f(2, 3)", r#" "a,b""#]);
    }

    #[test]
    fn outer_parens_only_when_they_wrap_everything() {
        assert_eq!(strip_outer("(a + b)", '(', ')'), Some("a + b"));
        assert_eq!(strip_outer("(a) + (b)", '(', ')'), None);
        assert_eq!(strip_braces("{ x := 1 }"), "x := 1");
        assert_eq!(strip_braces("{ a } el { b }"), "{ a } el { b }");
    }

    #[test]
    fn string_literals() {
        assert_eq!(string_literal(r#""hi""#), Some("hi"));
        assert_eq!(string_literal(r#""a\"b""#), Some(r#"a\"b"#));
        assert_eq!(string_literal(r#""a" + "b""#), None);
        assert_eq!(string_literal("x"), None);
    }

    #[test]
    fn ternary_nests_right() {
        assert_eq!(find_ternary("a ? b : c ? d : e"), Some(("a", "b", "c ? d : e")));
        assert_eq!(find_ternary("a ? (b ? c : d) : e"), Some(("a", "(b ? c : d)", "e")));
        assert_eq!(find_ternary("a ? b ? c : d : e"), Some(("a", "b ? c : d", "e")));
        assert_eq!(find_ternary(r#"print("a?b:c")"#), None);
    }

    #[test]
    fn binop_rightmost_in_group() {
        let add = BinOp::GROUPS[3];
        assert_eq!(find_binop("a - b + c", add), Some((6, BinOp::Add)));
        assert_eq!(find_binop("a - b - c", add), Some((6, BinOp::Sub)));
        assert_eq!(find_binop("-a", add), None);
        assert_eq!(find_binop("a * -b", add), None);
        assert_eq!(find_binop("a - -5", add), Some((2, BinOp::Sub)));
        assert_eq!(find_binop("f(a - b)", add), None);
    }

    #[test]
    fn binop_comparisons() {
        let cmp = BinOp::GROUPS[2];
        assert_eq!(find_binop("a <= b", cmp), Some((2, BinOp::Le)));
        assert_eq!(find_binop("a < b", cmp), Some((2, BinOp::Lt)));
        assert_eq!(find_binop("a == b", cmp), Some((2, BinOp::Eq)));
        assert_eq!(find_binop("a != b", cmp), Some((2, BinOp::Ne)));
        assert_eq!(find_binop("a >= b", cmp), Some((2, BinOp::Ge)));
        assert_eq!(find_binop("a = b", cmp), None);
        assert_eq!(find_binop("i % 15 == 0", cmp), Some((7, BinOp::Eq)));
    }

    #[test]
    fn calls_and_ranges() {
        assert_eq!(parse_call("f(a, g(b, c))"), Some(("f", vec!["a", "g(b, c)"])));
        assert_eq!(parse_call("f()"), Some(("f", vec![])));
        assert_eq!(parse_call("f(a) + g(b)"), None);
        assert_eq!(parse_call("(a)"), None);
        assert_eq!(split_range("1..=n"), Some(("1", "n", true)));
        assert_eq!(split_range("0..n - 1"), Some(("0", "n - 1", false)));
        assert_eq!(split_range("n"), None);
    }

    #[test]
    fn assignment_detection() {
        assert_eq!(find_assign("x = y == z"), Some(2));
        assert_eq!(find_assign("a == b"), None);
        assert_eq!(find_assign("a <= b"), None);
        assert_eq!(find_assign("x := 1"), None);
        assert_eq!(find_assign("x += 1"), None);
        assert_eq!(find_assign(r#"print("a=b")"#), None);
        assert_eq!(find_compound("acc += i * 2"), Some((4, BinOp::Add)));
        assert_eq!(find_compound("x %= 3"), Some((2, BinOp::Mod)));
        assert_eq!(find_compound("a - b"), None);
    }

    #[test]
    fn head_block_split() {
        assert_eq!(split_head_block("x > 0 { x = x - 1 } el { y }"), Some(("x > 0", "x = x - 1", "el { y }")));
        assert_eq!(split_head_block("x > 0"), None);
        assert_eq!(split_head_block("x { open"), Some(("x", "open", "")));
    }

    #[test]
    fn statements_split_and_chains_merge() {
        let body = "x := 1; y := 2\nif x { a } el if y { b }\nel { c }\nprint(x)";
        assert_eq!(
            split_statements(body),
            vec!["x := 1", "y := 2", "if x { a }\nel if y { b }\nel { c }", "print(x)"]
        );
        assert_eq!(split_statements("if x {\n  a\n} el\n{ b }"), vec!["if x {\n  a\n}\nel { b }"]);
        assert_eq!(split_statements("el { b }"), vec!["el { b }"]);
        assert_eq!(split_statements("if x { a }\nel := 5"), vec!["if x { a }", "el := 5"]);
        assert_eq!(split_statements(r#"print("a;b")"#), vec![r#"print("a;b")"#]);
    }

    #[test]
    fn branches_normalize_outside_strings() {
        assert_eq!(normalize_branches("} else if x {"), "} el if x {");
        assert_eq!(normalize_branches("} else {"), "} el {");
        assert_eq!(normalize_branches("elif x {"), "el if x {");
        assert_eq!(normalize_branches(r#"print("else")"#), r#"print("else")"#);
        assert_eq!(normalize_branches("elsewhere := 1"), "elsewhere := 1");
    }

    #[test]
    fn keywords() {
        assert!(has_keyword("for i := 1..=3 { }", "for"));
        assert!(!has_keyword("diff + 1", "if"));
        assert!(!has_keyword(r#"print("if x")"#, "if"));
        assert_eq!(after_keyword("return x", "return"), Some("x"));
        assert_eq!(after_keyword("returned", "return"), None);
        assert_eq!(after_keyword("break", "break"), Some(""));
        assert_eq!(else_branch("el { b }"), Some("{ b }"));
        assert_eq!(else_branch("el if x { b }"), Some("if x { b }"));
        assert_eq!(else_branch("el"), Some(""));
        assert_eq!(else_branch("el := 5"), None);
        assert_eq!(else_branch("el + 1"), None);
        assert_eq!(else_branch("elapsed = 1"), None);
        assert!(is_identifier("acc_2"));
        assert!(!is_identifier("2x"));
    }
}
