use crate::lexer::Lexer;
use crate::token::{Tok, TokKind};
use anyhow::{bail, Result};
use archconf_ast::ast::{ArchFile, Assignment, Comment, Fragment, Ident, Item, Modifier, Value};
use archconf_ast::span::Span;

/// Make directives that arch files occasionally contain but that a flat
/// resolver cannot evaluate.
const UNSUPPORTED_DIRECTIVES: &[&str] = &[
    "ifeq", "ifneq", "ifdef", "ifndef", "else", "endif", "include", "-include", "sinclude",
    "define", "endef", "vpath", "unexport",
];

pub fn parse_str(file: &str, src: &str) -> Result<ArchFile> {
    let mut p = Parser::new(file, src);
    p.parse_file()
}

struct Parser<'a> {
    file: &'a str,
    src: &'a str,
    lex: Lexer<'a>,
    cur: Tok,
}

impl<'a> Parser<'a> {
    fn new(file: &'a str, src: &'a str) -> Self {
        let mut lex = Lexer::new(src);
        let cur = lex.next_tok();
        Self {
            file,
            src,
            lex,
            cur,
        }
    }

    fn bump(&mut self) {
        self.cur = self.lex.next_tok();
    }

    fn line(&self, span: Span) -> usize {
        span.line_in(self.src)
    }

    fn fail<T>(&self, span: Span, msg: impl std::fmt::Display) -> Result<T> {
        bail!("{}:{}: {}", self.file, self.line(span), msg)
    }

    fn parse_file(&mut self) -> Result<ArchFile> {
        let start = self.cur.span.start;
        let mut items = Vec::new();
        loop {
            match &self.cur.kind {
                TokKind::Eof => break,
                TokKind::Newline => self.bump(),
                TokKind::Comment(text) => {
                    items.push(Item::Comment(Comment {
                        text: text.clone(),
                        span: self.cur.span,
                    }));
                    self.bump();
                }
                _ => items.push(Item::Assign(self.parse_assignment()?)),
            }
        }
        Ok(ArchFile {
            items,
            span: Span {
                start,
                end: self.cur.span.end,
            },
        })
    }

    fn parse_modifiers(&mut self) -> Vec<Modifier> {
        let mut mods = Vec::new();
        loop {
            match self.cur.kind {
                TokKind::KwExport => mods.push(Modifier::Export),
                TokKind::KwOverride => mods.push(Modifier::Override),
                _ => return mods,
            }
            self.bump();
        }
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        match &self.cur.kind {
            TokKind::Word(w) => {
                if UNSUPPORTED_DIRECTIVES.contains(&w.as_str()) {
                    return self.fail(self.cur.span, format!("unsupported directive '{}'", w));
                }
                let id = Ident {
                    text: w.clone(),
                    span: self.cur.span,
                };
                self.bump();
                Ok(id)
            }
            TokKind::Error(msg) => self.fail(self.cur.span, msg),
            other => self.fail(
                self.cur.span,
                format!("expected variable name, found {:?}", other),
            ),
        }
    }

    fn parse_assignment(&mut self) -> Result<Assignment> {
        let start = self.cur.span.start;
        let modifiers = self.parse_modifiers();
        let name = self.parse_ident()?;

        let op = match &self.cur.kind {
            TokKind::Assign(op) => *op,
            TokKind::Error(msg) => return self.fail(self.cur.span, msg),
            _ => {
                return self.fail(
                    name.span,
                    format!("expected assignment operator after '{}'", name.text),
                )
            }
        };
        self.bump();

        let value = match &self.cur.kind {
            TokKind::Value(text) => {
                let span = self.cur.span;
                let parts = match split_fragments(text) {
                    Ok(parts) => parts,
                    Err(msg) => return self.fail(span, format!("in value of {}: {}", name.text, msg)),
                };
                Value { parts, span }
            }
            other => {
                return self.fail(self.cur.span, format!("expected value, found {:?}", other))
            }
        };
        let end = value.span.end;
        self.bump();

        // a value always runs to the end of its line, so only a comment,
        // a newline or EOF may follow
        match self.cur.kind {
            TokKind::Newline | TokKind::Eof | TokKind::Comment(_) => {}
            _ => return self.fail(self.cur.span, "trailing input after value"),
        }

        Ok(Assignment {
            modifiers,
            name,
            op,
            value,
            span: Span { start, end },
        })
    }
}

/// Split a raw value into literal text and variable references.
fn split_fragments(text: &str) -> std::result::Result<Vec<Fragment>, String> {
    let mut parts = Vec::new();
    let mut lit = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            lit.push(c);
            continue;
        }
        let close = match chars.next() {
            None => {
                lit.push('$');
                break;
            }
            Some('$') => {
                lit.push('$');
                continue;
            }
            Some('(') => ')',
            Some('{') => '}',
            Some(single) => {
                flush(&mut parts, &mut lit);
                parts.push(Fragment::Ref(single.to_string()));
                continue;
            }
        };

        let mut name = String::new();
        let mut closed = false;
        for n in chars.by_ref() {
            if n == close {
                closed = true;
                break;
            }
            if n == '$' {
                return Err("nested variable references are not supported".to_string());
            }
            name.push(n);
        }
        if !closed {
            return Err(format!("unterminated variable reference '${}'", name));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err("empty variable reference".to_string());
        }
        if let Some((func, _)) = name.split_once(char::is_whitespace) {
            return Err(format!("make functions are not supported ('{}')", func));
        }
        flush(&mut parts, &mut lit);
        parts.push(Fragment::Ref(name.to_string()));
    }
    flush(&mut parts, &mut lit);
    Ok(parts)
}

fn flush(parts: &mut Vec<Fragment>, lit: &mut String) {
    if !lit.is_empty() {
        parts.push(Fragment::Text(std::mem::take(lit)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_split_on_references() {
        let parts = split_fragments("-I$(MPI_HOME)/include ${X} $Y $$HOME").unwrap();
        assert_eq!(
            parts,
            vec![
                Fragment::Text("-I".into()),
                Fragment::Ref("MPI_HOME".into()),
                Fragment::Text("/include ".into()),
                Fragment::Ref("X".into()),
                Fragment::Text(" ".into()),
                Fragment::Ref("Y".into()),
                Fragment::Text(" $HOME".into()),
            ]
        );
    }

    #[test]
    fn make_function_is_rejected() {
        let err = split_fragments("$(shell nc-config --libs)").unwrap_err();
        assert!(err.contains("'shell'"), "{err}");
    }

    #[test]
    fn unterminated_reference_is_rejected() {
        assert!(split_fragments("$(FC").is_err());
    }
}
