//! Static reference scanner.
//!
//! A small lexer that walks module source just far enough to find
//! `require("...")` calls outside of comments, strings, template literals and
//! regular-expression literals. It also reports constructs that never close
//! and delimiters that do not pair up, either of which would let the module
//! run past the wrapper the bundler emits around it.

use std::fmt;

/// Result of scanning one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Dependency specifiers in source order, first occurrence wins
    pub specifiers: Vec<String>,
    /// First structural problem found, if any
    pub defect: Option<LexDefect>,
}

/// A structural problem and the line it was found on (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexDefect {
    pub kind: DefectKind,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefectKind {
    BlockComment,
    StringLiteral,
    TemplateLiteral,
    /// A closer without its opener, or an opener still open at end of file
    UnbalancedDelimiter { delimiter: char },
}

impl fmt::Display for LexDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            DefectKind::BlockComment => "block comment",
            DefectKind::StringLiteral => "string literal",
            DefectKind::TemplateLiteral => "template literal",
            DefectKind::UnbalancedDelimiter { delimiter } => {
                return write!(f, "unbalanced `{delimiter}` on line {}", self.line);
            }
        };
        write!(f, "unterminated {what} starting on line {}", self.line)
    }
}

/// Scan module source for dependency specifiers.
pub fn scan(source: &str) -> ScanOutcome {
    Lexer::new(source).run()
}

/// Keywords after which a `/` starts a regular expression, not a division.
const REGEX_PREFIX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

/// An open delimiter in code position.
#[derive(Debug, Clone, Copy)]
struct Open {
    /// `{`, `(`, `[`, or `$` for a template `${` interpolation
    delimiter: u8,
    line: usize,
}

struct Lexer<'a> {
    text: &'a str,
    src: &'a [u8],
    pos: usize,
    line: usize,
    /// Whether a `/` at this point would start a regex literal
    regex_allowed: bool,
    /// Whether the last significant token was `.` (property access)
    after_dot: bool,
    /// Delimiters opened in code position and not yet closed
    open: Vec<Open>,
    specifiers: Vec<String>,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            src: text.as_bytes(),
            pos: 0,
            line: 1,
            regex_allowed: true,
            after_dot: false,
            open: Vec::new(),
            specifiers: Vec::new(),
        }
    }

    fn run(mut self) -> ScanOutcome {
        if self.text.starts_with("#!") {
            self.skip_line_comment();
        }
        let defect = self.lex_code().err();
        ScanOutcome {
            specifiers: self.specifiers,
            defect,
        }
    }

    #[inline]
    fn peek(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn defect(&self, kind: DefectKind, line: usize) -> LexDefect {
        LexDefect { kind, line }
    }

    fn lex_code(&mut self) -> Result<(), LexDefect> {
        while let Some(b) = self.peek(0) {
            match b {
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment()?,
                b'/' if self.regex_allowed => self.skip_regex(),
                b'"' | b'\'' => {
                    self.skip_string(b)?;
                    self.value_token();
                }
                b'`' => {
                    let start_line = self.line;
                    self.pos += 1;
                    self.lex_template_body(start_line)?;
                }
                b'{' | b'(' | b'[' => {
                    self.open.push(Open {
                        delimiter: b,
                        line: self.line,
                    });
                    self.pos += 1;
                    self.punct_token(b);
                }
                b'}' | b')' | b']' => {
                    let opener = match b {
                        b'}' => b'{',
                        b')' => b'(',
                        _ => b'[',
                    };
                    let top = self.open.pop();
                    self.pos += 1;
                    match top {
                        Some(Open { delimiter: b'$', .. }) if b == b'}' => {
                            let line = self.line;
                            self.lex_template_body(line)?;
                        }
                        Some(open) if open.delimiter == opener => self.value_token(),
                        _ => return Err(self.unbalanced(b, self.line)),
                    }
                }
                b'0'..=b'9' => {
                    self.skip_number();
                    self.value_token();
                }
                b if is_ident_start(b) => self.lex_identifier(),
                _ => {
                    self.pos += 1;
                    self.punct_token(b);
                }
            }
        }

        match self.open.last() {
            // An interpolation was never closed
            Some(Open {
                delimiter: b'$',
                line,
            }) => Err(self.defect(DefectKind::TemplateLiteral, *line)),
            Some(open) => Err(self.unbalanced(open.delimiter, open.line)),
            None => Ok(()),
        }
    }

    fn unbalanced(&self, delimiter: u8, line: usize) -> LexDefect {
        self.defect(
            DefectKind::UnbalancedDelimiter {
                delimiter: char::from(delimiter),
            },
            line,
        )
    }

    fn value_token(&mut self) {
        self.regex_allowed = false;
        self.after_dot = false;
    }

    fn punct_token(&mut self, b: u8) {
        self.regex_allowed = true;
        self.after_dot = b == b'.';
    }

    fn skip_line_comment(&mut self) {
        while let Some(b) = self.peek(0) {
            if b == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexDefect> {
        let start_line = self.line;
        self.pos += 2;
        while let Some(b) = self.peek(0) {
            if b == b'*' && self.peek(1) == Some(b'/') {
                self.pos += 2;
                return Ok(());
            }
            if b == b'\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
        Err(self.defect(DefectKind::BlockComment, start_line))
    }

    fn skip_string(&mut self, quote: u8) -> Result<(), LexDefect> {
        let start_line = self.line;
        self.pos += 1;
        while let Some(b) = self.peek(0) {
            match b {
                b'\\' => {
                    // Escaped newline is a line continuation
                    if self.peek(1) == Some(b'\n') {
                        self.line += 1;
                    }
                    self.pos += 2;
                }
                b'\n' => break,
                b if b == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
        Err(self.defect(DefectKind::StringLiteral, start_line))
    }

    /// Lex template text up to the closing backtick or the next `${`.
    fn lex_template_body(&mut self, start_line: usize) -> Result<(), LexDefect> {
        while let Some(b) = self.peek(0) {
            match b {
                b'\\' => {
                    if self.peek(1) == Some(b'\n') {
                        self.line += 1;
                    }
                    self.pos += 2;
                }
                b'`' => {
                    self.pos += 1;
                    self.value_token();
                    return Ok(());
                }
                b'$' if self.peek(1) == Some(b'{') => {
                    self.pos += 2;
                    self.open.push(Open {
                        delimiter: b'$',
                        line: self.line,
                    });
                    self.punct_token(b'{');
                    return Ok(());
                }
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                _ => self.pos += 1,
            }
        }
        Err(self.defect(DefectKind::TemplateLiteral, start_line))
    }

    /// Skip a regex literal. A `/` that does not close on the same line was a
    /// misjudged division and is consumed as punctuation instead.
    fn skip_regex(&mut self) {
        let start = self.pos;
        self.pos += 1;
        let mut in_class = false;
        while let Some(b) = self.peek(0) {
            match b {
                b'\\' => self.pos += 2,
                b'[' => {
                    in_class = true;
                    self.pos += 1;
                }
                b']' => {
                    in_class = false;
                    self.pos += 1;
                }
                b'/' if !in_class => {
                    self.pos += 1;
                    while self.peek(0).is_some_and(is_ident_part) {
                        self.pos += 1;
                    }
                    self.value_token();
                    return;
                }
                b'\n' => break,
                _ => self.pos += 1,
            }
        }
        self.pos = start + 1;
        self.punct_token(b'/');
    }

    fn skip_number(&mut self) {
        while self
            .peek(0)
            .is_some_and(|b| is_ident_part(b) || b == b'.')
        {
            self.pos += 1;
        }
    }

    fn lex_identifier(&mut self) {
        let start = self.pos;
        while self.peek(0).is_some_and(is_ident_part) {
            self.pos += 1;
        }
        let word = self.text.get(start..self.pos).unwrap_or_default();

        if word == "require"
            && !self.after_dot
            && let Some(specifier) = self.require_argument()
            && !self.specifiers.iter().any(|s| s == specifier)
        {
            self.specifiers.push(specifier.to_string());
        }

        self.regex_allowed = REGEX_PREFIX_KEYWORDS.contains(&word);
        self.after_dot = false;
    }

    /// Look ahead from just after `require` for `( "literal" )`.
    ///
    /// Does not advance the lexer: the string is lexed normally afterwards.
    fn require_argument(&self) -> Option<&'a str> {
        let src = self.src;
        let mut p = skip_whitespace(src, self.pos);
        if src.get(p) != Some(&b'(') {
            return None;
        }
        p = skip_whitespace(src, p + 1);

        let quote = *src.get(p)?;
        if quote != b'"' && quote != b'\'' {
            return None;
        }
        let start = p + 1;
        let mut end = start;
        loop {
            match *src.get(end)? {
                b if b == quote => break,
                b'\\' | b'\n' => return None,
                _ => end += 1,
            }
        }

        p = skip_whitespace(src, end + 1);
        if src.get(p) != Some(&b')') || end == start {
            return None;
        }
        self.text.get(start..end)
    }
}

fn skip_whitespace(src: &[u8], mut p: usize) -> usize {
    while src.get(p).is_some_and(u8::is_ascii_whitespace) {
        p += 1;
    }
    p
}

#[inline]
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

#[inline]
fn is_ident_part(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specifiers(source: &str) -> Vec<String> {
        scan(source).specifiers
    }

    #[test]
    fn test_require_calls_in_source_order() {
        let source = r#"
            var b = require("./b");
            var a = require('./a');
            var c = require ( "c/index" );
        "#;
        assert_eq!(specifiers(source), vec!["./b", "./a", "c/index"]);
    }

    #[test]
    fn test_duplicate_requires_keep_first_position() {
        let source = "require('./x'); require('./y'); require('./x');";
        assert_eq!(specifiers(source), vec!["./x", "./y"]);
    }

    #[test]
    fn test_comments_and_strings_are_ignored() {
        let source = r#"
            // require("./line-comment")
            /* require("./block-comment") */
            var s = "require('./in-string')";
            var t = `require("./in-template")`;
            var real = require("./real");
        "#;
        assert_eq!(specifiers(source), vec!["./real"]);
    }

    #[test]
    fn test_property_access_and_dynamic_arguments_are_ignored() {
        let source = r#"
            loader.require("./method");
            obj.require ("./spaced");
            require(name);
            require("./a" + suffix);
            myrequire("./suffix-ident");
        "#;
        assert!(specifiers(source).is_empty());
    }

    #[test]
    fn test_template_interpolation_is_code() {
        let source = "var t = `${require('./inner')} and ${ {a: 1}.a }`; require('./after');";
        let outcome = scan(source);
        assert_eq!(outcome.specifiers, vec!["./inner", "./after"]);
        assert_eq!(outcome.defect, None);
    }

    #[test]
    fn test_regex_literal_with_quote_is_not_a_string() {
        let source = r#"
            var re = /["']/g;
            var half = total / 2; var other = require("./other");
        "#;
        let outcome = scan(source);
        assert_eq!(outcome.specifiers, vec!["./other"]);
        assert_eq!(outcome.defect, None);
    }

    #[test]
    fn test_division_after_identifier() {
        let outcome = scan("var x = a / b / c; require('./ok');");
        assert_eq!(outcome.specifiers, vec!["./ok"]);
        assert_eq!(outcome.defect, None);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let outcome = scan("var a = 1;\n/* never closed\nrequire('./hidden');");
        assert!(outcome.specifiers.is_empty());
        assert_eq!(
            outcome.defect,
            Some(LexDefect {
                kind: DefectKind::BlockComment,
                line: 2
            })
        );
    }

    #[test]
    fn test_unterminated_string() {
        let outcome = scan("var a = 'oops;\nvar b = 2;");
        assert_eq!(outcome.defect.map(|d| d.kind), Some(DefectKind::StringLiteral));
    }

    #[test]
    fn test_unterminated_template() {
        let outcome = scan("var a = `line one\nline two");
        let defect = outcome.defect.unwrap();
        assert_eq!(defect.kind, DefectKind::TemplateLiteral);
        assert_eq!(defect.line, 1);
        assert!(defect.to_string().contains("template literal"));
    }

    fn unbalanced(delimiter: char, line: usize) -> Option<LexDefect> {
        Some(LexDefect {
            kind: DefectKind::UnbalancedDelimiter { delimiter },
            line,
        })
    }

    #[test]
    fn test_stray_closer_escaping_wrapper() {
        let outcome = scan("});\nvar leaked = 1;\n(function () {");
        assert_eq!(outcome.defect, unbalanced('}', 1));
    }

    #[test]
    fn test_unclosed_brace_at_end_of_file() {
        let outcome = scan("function f() {\n  return 1;\n");
        assert_eq!(outcome.defect, unbalanced('{', 1));
        assert_eq!(
            outcome.defect.unwrap().to_string(),
            "unbalanced `{` on line 1"
        );
    }

    #[test]
    fn test_mismatched_closers() {
        assert_eq!(scan("var a = [1, 2);").defect, unbalanced(')', 1));
        assert_eq!(scan("f(\n  1,\n]").defect, unbalanced(']', 3));
        assert_eq!(scan("call(1, 2").defect, unbalanced('(', 1));
        assert_eq!(scan("var a = [\n1").defect, unbalanced('[', 1));
    }

    #[test]
    fn test_delimiters_inside_interpolation() {
        assert_eq!(scan("var t = `${ f({ a: [1] }) }`;").defect, None);
        assert_eq!(scan("var t = `${ f( }`;").defect, unbalanced('}', 1));
        assert_eq!(
            scan("var t = `${ a\n").defect.map(|d| d.kind),
            Some(DefectKind::TemplateLiteral)
        );
    }

    #[test]
    fn test_delimiters_in_strings_comments_and_regex_are_ignored() {
        let source = r#"
            var s = "}" + ')' + `]`;
            // }
            /* ) */
            var re = /[(]{2}/;
        "#;
        assert_eq!(scan(source).defect, None);
    }

    #[test]
    fn test_hashbang_line_is_skipped() {
        let outcome = scan("#!/usr/bin/env node (\nrequire('./cli');");
        assert_eq!(outcome.specifiers, vec!["./cli"]);
        assert_eq!(outcome.defect, None);
    }

    #[test]
    fn test_clean_module_has_no_defect() {
        let outcome = scan("module.exports = function () { return { a: [1, 2] }; };");
        assert_eq!(outcome, ScanOutcome::default());
    }
}
