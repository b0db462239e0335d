use std::fmt;

/// Source location for error reporting (1-based line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Layout.
    /// Indentation grew past the enclosing block's width.
    Indent,
    /// Indentation shrank back to an enclosing block's width.
    Dedent,
    Newline,
    Eof,

    // Operators.
    Plus,
    Minus,
    Star,
    Slash,
    SlashSlash,
    Percent,
    Equal,
    Dot,
    LessEqual,
    GreaterEqual,
    Less,
    Greater,
    EqualEqual,
    BangEqual,
    StarStar,
    LessLess,
    GreaterGreater,
    Caret,
    Pipe,
    Ampersand,
    Tilde,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Colon,

    // Literals and names.
    Number,
    String,
    /// Comment (`# ...`), kept in the stream as trivia.
    Comment,
    /// All-uppercase name: a builtin or `DEF`-declared command.
    Command,
    /// All-lowercase name: a variable.
    Identifier,

    // Lowercase keywords.
    True,
    False,
    /// The `none` literal.
    Null,
    And,
    Or,
    Not,
    /// Ternary `if`.
    IfInline,
    /// Ternary `else`.
    ElseInline,
    ElifInline,
    In,
    Is,
    Await,

    // Statement keywords.
    Init,
    Set,
    If,
    Else,
    Elsif,
    For,
    While,
    Def,
    Pass,
    Continue,
    Return,
}

impl TokenKind {
    /// Look up a reserved word. Keywords are case-sensitive: `if` and
    /// `IF` are different tokens.
    #[must_use]
    pub fn keyword(text: &str) -> Option<Self> {
        let kind = match text {
            "true" => Self::True,
            "false" => Self::False,
            "none" => Self::Null,
            "and" => Self::And,
            "or" => Self::Or,
            "not" => Self::Not,
            "if" => Self::IfInline,
            "else" => Self::ElseInline,
            "elif" => Self::ElifInline,
            "in" => Self::In,
            "is" => Self::Is,
            "await" => Self::Await,
            "INIT" => Self::Init,
            "SET" => Self::Set,
            "IF" => Self::If,
            "ELSE" => Self::Else,
            "ELSIF" => Self::Elsif,
            "FOR" => Self::For,
            "WHILE" => Self::While,
            "DEF" => Self::Def,
            "PASS" => Self::Pass,
            "CONTINUE" => Self::Continue,
            "RETURN" => Self::Return,
            _ => return None,
        };
        Some(kind)
    }

    /// Look up a one- or two-character operator lexeme.
    #[must_use]
    pub fn operator(lexeme: &[u8]) -> Option<Self> {
        let kind = match lexeme {
            b"+" => Self::Plus,
            b"-" => Self::Minus,
            b"*" => Self::Star,
            b"/" => Self::Slash,
            b"//" => Self::SlashSlash,
            b"%" => Self::Percent,
            b"=" => Self::Equal,
            b"." => Self::Dot,
            b"<=" => Self::LessEqual,
            b">=" => Self::GreaterEqual,
            b"<" => Self::Less,
            b">" => Self::Greater,
            b"==" => Self::EqualEqual,
            b"!=" => Self::BangEqual,
            b"**" => Self::StarStar,
            b"<<" => Self::LessLess,
            b">>" => Self::GreaterGreater,
            b"^" => Self::Caret,
            b"|" => Self::Pipe,
            b"&" => Self::Ampersand,
            b"~" => Self::Tilde,
            b"(" => Self::LeftParen,
            b")" => Self::RightParen,
            b"[" => Self::LeftBracket,
            b"]" => Self::RightBracket,
            b":" => Self::Colon,
            _ => return None,
        };
        Some(kind)
    }

    /// Upper-snake name used by the token dump.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Indent => "INDENT",
            Self::Dedent => "DEDENT",
            Self::Newline => "NEWLINE",
            Self::Eof => "EOF",
            Self::Plus => "PLUS",
            Self::Minus => "MINUS",
            Self::Star => "STAR",
            Self::Slash => "SLASH",
            Self::SlashSlash => "SLASH_SLASH",
            Self::Percent => "PERCENT",
            Self::Equal => "EQUAL",
            Self::Dot => "DOT",
            Self::LessEqual => "LESS_EQUAL",
            Self::GreaterEqual => "GREATER_EQUAL",
            Self::Less => "LESS",
            Self::Greater => "GREATER",
            Self::EqualEqual => "EQUAL_EQUAL",
            Self::BangEqual => "BANG_EQUAL",
            Self::StarStar => "STAR_STAR",
            Self::LessLess => "LESS_LESS",
            Self::GreaterGreater => "GREATER_GREATER",
            Self::Caret => "CARET",
            Self::Pipe => "PIPE",
            Self::Ampersand => "AMPERSAND",
            Self::Tilde => "TILDE",
            Self::LeftParen => "LEFT_PAREN",
            Self::RightParen => "RIGHT_PAREN",
            Self::LeftBracket => "LEFT_BRACKET",
            Self::RightBracket => "RIGHT_BRACKET",
            Self::Colon => "COLON",
            Self::Number => "NUMBER",
            Self::String => "STRING",
            Self::Comment => "COMMENT",
            Self::Command => "COMMAND",
            Self::Identifier => "IDENTIFIER",
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Null => "NONE",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::IfInline => "IF_I",
            Self::ElseInline => "ELSE_I",
            Self::ElifInline => "ELIF_I",
            Self::In => "IN",
            Self::Is => "IS",
            Self::Await => "AWAIT",
            Self::Init => "INIT",
            Self::Set => "SET",
            Self::If => "IF",
            Self::Else => "ELSE",
            Self::Elsif => "ELSIF",
            Self::For => "FOR",
            Self::While => "WHILE",
            Self::Def => "DEF",
            Self::Pass => "PASS",
            Self::Continue => "CONTINUE",
            Self::Return => "RETURN",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Literal payload carried by number, string, and name tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenLiteral {
    Number(f64),
    Text(String),
}

impl fmt::Display for TokenLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A single token with its kind, raw lexeme, payload, and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<TokenLiteral>,
    pub span: Span,
}

impl Token {
    /// Human-readable description for "found ..." error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Newline => "newline".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Indent => "indent".to_string(),
            TokenKind::Dedent => "dedent".to_string(),
            _ => format!("'{}'", self.lexeme),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.literal {
            Some(literal) => write!(f, "{}: {literal}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}
