use archconf_ast::ast::AssignOp;
use archconf_ast::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum TokKind {
    // trivia / eof / error
    Eof,
    Newline,
    /// Error token (e.g., stray character outside a value)
    Error(String),
    /// Text after `#` up to the end of the line
    Comment(String),
    // names / keywords
    Word(String),
    KwExport,
    KwOverride,
    // assignment
    Assign(AssignOp),
    /// Raw right-hand side with continuations joined and `\#` unescaped
    Value(String),
}

#[derive(Debug, Clone)]
pub struct Tok {
    pub kind: TokKind,
    pub span: Span,
}
