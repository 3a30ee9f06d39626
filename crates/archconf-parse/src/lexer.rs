use crate::token::{Tok, TokKind};
use archconf_ast::ast::AssignOp;
use archconf_ast::span::Span;

/// Line-oriented lexer for make-style arch files.
///
/// After an assignment operator the lexer switches into value mode and
/// returns the rest of the logical line as a single `Value` token.
pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    in_value: bool,
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-' | b'/')
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src: src.as_bytes(),
            pos: 0,
            in_value: false,
        }
    }

    fn bump(&mut self) -> Option<u8> {
        if self.pos >= self.src.len() {
            None
        } else {
            let b = self.src[self.pos];
            self.pos += 1;
            Some(b)
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }
    fn peek2(&self) -> Option<u8> {
        self.src.get(self.pos + 1).copied()
    }
    fn peek3(&self) -> Option<u8> {
        self.src.get(self.pos + 2).copied()
    }

    fn span(&self, start: usize) -> Span {
        Span {
            start: start as u32,
            end: self.pos as u32,
        }
    }

    fn tok(&self, kind: TokKind, start: usize) -> Tok {
        Tok {
            kind,
            span: self.span(start),
        }
    }

    fn skip_blanks(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r')) {
            self.bump();
        }
    }

    /// Backslash-newline (optionally `\r\n`) starting at the current position.
    fn continuation_len(&self) -> Option<usize> {
        if self.peek() != Some(b'\\') {
            return None;
        }
        match (self.peek2(), self.peek3()) {
            (Some(b'\n'), _) => Some(2),
            (Some(b'\r'), Some(b'\n')) => Some(3),
            _ => None,
        }
    }

    pub fn next_tok(&mut self) -> Tok {
        if self.in_value {
            self.in_value = false;
            return self.lex_value();
        }

        loop {
            self.skip_blanks();
            // a continuation outside a value just joins lines
            match self.continuation_len() {
                Some(n) => self.pos += n,
                None => break,
            }
        }

        let start = self.pos;
        let Some(b) = self.bump() else {
            return Tok {
                kind: TokKind::Eof,
                span: Span {
                    start: self.pos as u32,
                    end: self.pos as u32,
                },
            };
        };

        match b {
            b'\n' => self.tok(TokKind::Newline, start),
            b'#' => {
                let body = self.pos;
                while let Some(c) = self.peek() {
                    if c == b'\n' {
                        break;
                    }
                    self.bump();
                }
                let text = String::from_utf8_lossy(&self.src[body..self.pos])
                    .trim_end()
                    .to_string();
                self.tok(TokKind::Comment(text), start)
            }
            b'=' => self.assign(AssignOp::Recursive, start),
            b'?' if self.peek() == Some(b'=') => {
                self.bump();
                self.assign(AssignOp::Conditional, start)
            }
            b'+' if self.peek() == Some(b'=') => {
                self.bump();
                self.assign(AssignOp::Append, start)
            }
            b':' if self.peek() == Some(b'=') => {
                self.bump();
                self.assign(AssignOp::Simple, start)
            }
            b':' if self.peek() == Some(b':') && self.peek2() == Some(b'=') => {
                self.bump();
                self.bump();
                self.assign(AssignOp::Simple, start)
            }
            c if is_word_byte(c) => self.lex_word(start),
            c => {
                // swallow the rest of the line so the parser reports one error
                while let Some(n) = self.peek() {
                    if n == b'\n' {
                        break;
                    }
                    self.bump();
                }
                let shown = String::from_utf8_lossy(&self.src[start..start + 1]).into_owned();
                let msg = if c == b':' {
                    "rules are not supported (found ':')".to_string()
                } else {
                    format!("unexpected character '{}'", shown)
                };
                self.tok(TokKind::Error(msg), start)
            }
        }
    }

    fn assign(&mut self, op: AssignOp, start: usize) -> Tok {
        self.in_value = true;
        self.tok(TokKind::Assign(op), start)
    }

    fn lex_word(&mut self, start: usize) -> Tok {
        while matches!(self.peek(), Some(c) if is_word_byte(c)) {
            self.bump();
        }
        let word = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
        let end = self.pos;

        // `export FOO = ...`: keyword only when another word follows
        if word == "export" || word == "override" {
            self.skip_blanks();
            let followed_by_word = matches!(self.peek(), Some(c) if is_word_byte(c));
            let span = Span {
                start: start as u32,
                end: end as u32,
            };
            if followed_by_word {
                let kind = if word == "export" {
                    TokKind::KwExport
                } else {
                    TokKind::KwOverride
                };
                return Tok { kind, span };
            }
            return Tok {
                kind: TokKind::Word(word),
                span,
            };
        }

        self.tok(TokKind::Word(word), start)
    }

    fn lex_value(&mut self) -> Tok {
        // leading whitespace of a value is not significant
        loop {
            self.skip_blanks();
            match self.continuation_len() {
                Some(n) => self.pos += n,
                None => break,
            }
        }

        let start = self.pos;
        let mut end = start;
        let mut out: Vec<u8> = Vec::new();
        loop {
            if let Some(n) = self.continuation_len() {
                self.pos += n;
                while matches!(out.last(), Some(b' ' | b'\t' | b'\r')) {
                    out.pop();
                }
                self.skip_blanks();
                out.push(b' ');
                continue;
            }
            match self.peek() {
                None | Some(b'\n') | Some(b'#') => break,
                Some(b'\\') if self.peek2() == Some(b'#') => {
                    self.bump();
                    self.bump();
                    out.push(b'#');
                    end = self.pos;
                }
                Some(c) => {
                    self.bump();
                    out.push(c);
                    if !matches!(c, b' ' | b'\t' | b'\r') {
                        end = self.pos;
                    }
                }
            }
        }
        while matches!(out.last(), Some(b' ' | b'\t' | b'\r')) {
            out.pop();
        }

        let text = String::from_utf8_lossy(&out).into_owned();
        Tok {
            kind: TokKind::Value(text),
            span: Span {
                start: start as u32,
                end: end as u32,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokKind> {
        let mut lex = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let t = lex.next_tok();
            if t.kind == TokKind::Eof {
                break;
            }
            out.push(t.kind);
        }
        out
    }

    #[test]
    fn assignment_with_trailing_comment() {
        assert_eq!(
            kinds("FC = mpiifx # wrapper\n"),
            vec![
                TokKind::Word("FC".into()),
                TokKind::Assign(AssignOp::Recursive),
                TokKind::Value("mpiifx".into()),
                TokKind::Comment(" wrapper".into()),
                TokKind::Newline,
            ]
        );
    }

    #[test]
    fn continuation_joins_with_single_space() {
        let ks = kinds("LINK_LIBS = -llapack   \\\n     -lblas\n");
        assert_eq!(ks[2], TokKind::Value("-llapack -lblas".into()));
    }

    #[test]
    fn escaped_hash_stays_in_value() {
        let ks = kinds("X = a\\#b\n");
        assert_eq!(ks[2], TokKind::Value("a#b".into()));
    }

    #[test]
    fn export_keyword_needs_following_word() {
        assert_eq!(kinds("export FC := x")[0], TokKind::KwExport);
        assert_eq!(kinds("export = x")[0], TokKind::Word("export".into()));
    }

    #[test]
    fn double_colon_is_simple_assignment() {
        assert_eq!(kinds("A ::= b")[1], TokKind::Assign(AssignOp::Simple));
    }
}
