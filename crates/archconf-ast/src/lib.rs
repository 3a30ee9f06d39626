pub mod span {
    use serde::Serialize;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
    pub struct Span {
        pub start: u32,
        pub end: u32,
    }

    impl Span {
        /// 1-based line number of `start` within `src`.
        pub fn line_in(&self, src: &str) -> usize {
            let end = (self.start as usize).min(src.len());
            src.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
        }
    }
}

pub mod ast {
    use super::span::Span;
    use serde::Serialize;

    /// One parsed arch include file, in source order.
    #[derive(Debug, Serialize)]
    pub struct ArchFile {
        pub items: Vec<Item>,
        pub span: Span,
    }

    impl ArchFile {
        /// Assignments only, skipping comments.
        pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
            self.items.iter().filter_map(|item| match item {
                Item::Assign(a) => Some(a),
                Item::Comment(_) => None,
            })
        }
    }

    #[derive(Debug, Serialize)]
    pub enum Item {
        Assign(Assignment),
        Comment(Comment),
    }

    #[derive(Debug, Serialize)]
    pub struct Assignment {
        pub modifiers: Vec<Modifier>,
        pub name: Ident,
        pub op: AssignOp,
        pub value: Value,
        pub span: Span,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
    pub enum Modifier {
        Export,
        Override,
    }

    /// Make assignment flavors.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
    pub enum AssignOp {
        /// `=`: expanded each time the variable is used
        Recursive,
        /// `:=` or `::=`: expanded once, at the point of definition
        Simple,
        /// `?=`: only assigns when the variable is still undefined
        Conditional,
        /// `+=`: appends with a single separating space
        Append,
    }

    impl AssignOp {
        pub fn as_str(self) -> &'static str {
            match self {
                AssignOp::Recursive => "=",
                AssignOp::Simple => ":=",
                AssignOp::Conditional => "?=",
                AssignOp::Append => "+=",
            }
        }
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct Ident {
        pub text: String,
        pub span: Span,
    }

    /// Right-hand side of an assignment, split into literal text and
    /// variable references.
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct Value {
        pub parts: Vec<Fragment>,
        pub span: Span,
    }

    impl Value {
        pub fn is_blank(&self) -> bool {
            self.parts.iter().all(|p| match p {
                Fragment::Text(t) => t.trim().is_empty(),
                Fragment::Ref(_) => false,
            })
        }

        /// Names referenced by this value, in order of appearance.
        pub fn references(&self) -> impl Iterator<Item = &str> {
            self.parts.iter().filter_map(|p| match p {
                Fragment::Ref(name) => Some(name.as_str()),
                Fragment::Text(_) => None,
            })
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub enum Fragment {
        Text(String),
        /// `$(NAME)`, `${NAME}` or `$N`
        Ref(String),
    }

    #[derive(Debug, Serialize)]
    pub struct Comment {
        pub text: String,
        pub span: Span,
    }
}
