// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use boa_unicode::UnicodeProperties;
use oxc_span::Span;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token {
    EOF,

    // Entities
    Identifier,
    PrivateIdentifier,
    StringLiteral,
    NumberLiteral,
    BigIntLiteral,
    RegExpLiteral,
    NoSubstitutionTemplate,
    TemplateHead,
    TemplateMiddle,
    TemplateTail,
    Keyword(Keyword),

    // Malformed input
    InvalidStringLiteral,
    InvalidNumberLiteral,
    InvalidTemplate,
    InvalidRegExp,
    UnterminatedComment,
    Unknown,

    // Unary
    Not,
    BitComplement,
    Increment,
    Decrement,

    // These could be unary or binary.
    Plus,
    Minus,

    // Binary
    Mul,
    Div,
    Pow,
    EqualEqual,
    EqualEqualEqual,
    NotEqual,
    NotEqualEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    BitShiftLeft,
    BitShiftRight,
    BitUnsignedShiftRight,
    BitAnd,
    BitOr,
    BitXor,
    Or,
    And,
    Nullish,
    Mod,

    // Assign
    Equal,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    PowAssign,
    BitShiftLeftAssign,
    BitShiftRightAssign,
    BitUnsignedShiftRightAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    OrAssign,
    AndAssign,
    NullishAssign,
    ModAssign,

    // Misc.
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBrack,
    RightBrack,
    Semi,
    Colon,
    Question,
    QuestionDot,
    Dot,
    DotDotDot,
    Comma,
    Arrow,
}

impl Token {
    /// Binding power of binary operators.
    ///
    /// https://developer.mozilla.org/en-US/docs/Web/JavaScript/Reference/Operators/Operator_Precedence
    pub fn lbp(self) -> u8 {
        match self {
            Self::Pow => 130,
            Self::Mul | Self::Div | Self::Mod => 120,
            // these are binary at this point
            Self::Plus | Self::Minus => 110,
            Self::BitShiftLeft | Self::BitShiftRight | Self::BitUnsignedShiftRight => 100,
            Self::Less
            | Self::LessEqual
            | Self::Greater
            | Self::GreaterEqual
            | Self::Keyword(Keyword::Instanceof)
            | Self::Keyword(Keyword::In) => 90,
            Self::EqualEqual | Self::NotEqual | Self::EqualEqualEqual | Self::NotEqualEqual => 80,
            Self::BitAnd => 70,
            Self::BitXor => 60,
            Self::BitOr => 50,
            Self::And => 40,
            Self::Nullish | Self::Or => 30,
            _ => 0,
        }
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::AddAssign
                | Self::SubAssign
                | Self::MulAssign
                | Self::DivAssign
                | Self::PowAssign
                | Self::BitShiftLeftAssign
                | Self::BitShiftRightAssign
                | Self::BitUnsignedShiftRightAssign
                | Self::BitAndAssign
                | Self::BitOrAssign
                | Self::BitXorAssign
                | Self::OrAssign
                | Self::AndAssign
                | Self::NullishAssign
                | Self::ModAssign
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Keyword {
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Enum,
    Export,
    Extends,
    False,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    New,
    Null,
    Return,
    Super,
    Switch,
    This,
    Throw,
    True,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,

    // Only reserved in strict mode.
    Let,
    Static,
    Yield,

    // Only reserved in modules or async function bodies.
    Await,

    // Reserved in strict mode.
    Implements,
    Interface,
    Package,
    Private,
    Protected,
    Public,
}

static KEYWORDS: phf::Map<&'static str, Token> = phf::phf_map! {
    "break" => Token::Keyword(Keyword::Break),
    "case" => Token::Keyword(Keyword::Case),
    "catch" => Token::Keyword(Keyword::Catch),
    "class" => Token::Keyword(Keyword::Class),
    "const" => Token::Keyword(Keyword::Const),
    "continue" => Token::Keyword(Keyword::Continue),
    "debugger" => Token::Keyword(Keyword::Debugger),
    "default" => Token::Keyword(Keyword::Default),
    "delete" => Token::Keyword(Keyword::Delete),
    "do" => Token::Keyword(Keyword::Do),
    "else" => Token::Keyword(Keyword::Else),
    "enum" => Token::Keyword(Keyword::Enum),
    "export" => Token::Keyword(Keyword::Export),
    "extends" => Token::Keyword(Keyword::Extends),
    "false" => Token::Keyword(Keyword::False),
    "finally" => Token::Keyword(Keyword::Finally),
    "for" => Token::Keyword(Keyword::For),
    "function" => Token::Keyword(Keyword::Function),
    "if" => Token::Keyword(Keyword::If),
    "import" => Token::Keyword(Keyword::Import),
    "in" => Token::Keyword(Keyword::In),
    "instanceof" => Token::Keyword(Keyword::Instanceof),
    "new" => Token::Keyword(Keyword::New),
    "null" => Token::Keyword(Keyword::Null),
    "return" => Token::Keyword(Keyword::Return),
    "super" => Token::Keyword(Keyword::Super),
    "switch" => Token::Keyword(Keyword::Switch),
    "this" => Token::Keyword(Keyword::This),
    "throw" => Token::Keyword(Keyword::Throw),
    "true" => Token::Keyword(Keyword::True),
    "try" => Token::Keyword(Keyword::Try),
    "typeof" => Token::Keyword(Keyword::Typeof),
    "var" => Token::Keyword(Keyword::Var),
    "void" => Token::Keyword(Keyword::Void),
    "while" => Token::Keyword(Keyword::While),
    "with" => Token::Keyword(Keyword::With),

    // Only reserved in strict mode.
    "let" => Token::Keyword(Keyword::Let),
    "static" => Token::Keyword(Keyword::Static),
    "yield" => Token::Keyword(Keyword::Yield),

    // Only reserved in modules or async function bodies.
    "await" => Token::Keyword(Keyword::Await),

    // Reserved in strict mode.
    "implements" => Token::Keyword(Keyword::Implements),
    "interface" => Token::Keyword(Keyword::Interface),
    "package" => Token::Keyword(Keyword::Package),
    "private" => Token::Keyword(Keyword::Private),
    "protected" => Token::Keyword(Keyword::Protected),
    "public" => Token::Keyword(Keyword::Public),
};

const LINE_SEPARATOR: char = '\u{2028}';
const PARAGRAPH_SEPARATOR: char = '\u{2029}';

#[derive(Debug, Clone, Copy)]
pub struct Lexer<'a> {
    buffer: &'a [u8],
    pub index: usize,
    pub start: usize,
    pub token: Token,
    pub has_newline_before: bool,
    pub hashbang: Option<Span>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Self {
            buffer: input.as_bytes(),
            index: 0,
            start: 0,
            token: Token::EOF,
            has_newline_before: false,
            hashbang: None,
        };
        if input.starts_with("#!") {
            let end = input.find(['\n', '\r']).unwrap_or(input.len());
            lexer.index = end;
            lexer.hashbang = Some(Span::new(0, end as u32));
        }
        lexer
    }

    #[inline]
    pub fn source(&self) -> &'a str {
        // SAFETY: the API ensures that the buffer is already an &str
        unsafe { std::str::from_utf8_unchecked(self.buffer) }
    }

    pub fn span(&self) -> Span {
        Span::new(self.start as u32, self.index as u32)
    }

    /// Source text of the current token.
    pub fn text(&self) -> &'a str {
        &self.source()[self.start..self.index]
    }

    /// Advances a copy of the lexer by one token.
    pub fn peek(&self) -> Lexer<'a> {
        let mut lexer = *self;
        lexer.next();
        lexer
    }

    #[inline]
    fn at(&self, offset: usize) -> Option<u8> {
        self.buffer.get(self.index + offset).copied()
    }

    fn char_at_index(&self) -> Option<char> {
        self.source()[self.index..].chars().next()
    }

    /// Skips whitespace and comments. Returns false if a block comment is
    /// left unterminated.
    fn skip_trivia(&mut self) -> bool {
        loop {
            match self.at(0) {
                Some(b' ' | b'\t' | 0x0B | 0x0C) => self.index += 1,
                Some(b'\n' | b'\r') => {
                    self.has_newline_before = true;
                    self.index += 1;
                }
                Some(b'/') => match self.at(1) {
                    // line comment
                    Some(b'/') => {
                        self.index += 2;
                        while let Some(byte) = self.at(0) {
                            if byte == b'\n' || byte == b'\r' {
                                break;
                            }
                            self.index += 1;
                        }
                    }
                    // block comment
                    Some(b'*') => {
                        self.index += 2;
                        loop {
                            match self.at(0) {
                                None => return false,
                                Some(b'*') if self.at(1) == Some(b'/') => {
                                    self.index += 2;
                                    break;
                                }
                                Some(b'\n' | b'\r') => {
                                    self.has_newline_before = true;
                                    self.index += 1;
                                }
                                Some(_) => self.index += 1,
                            }
                        }
                    }
                    _ => return true,
                },
                Some(byte) if byte >= 0x80 => {
                    let Some(c) = self.char_at_index() else {
                        return true;
                    };
                    if c == LINE_SEPARATOR || c == PARAGRAPH_SEPARATOR {
                        self.has_newline_before = true;
                    } else if !(c.is_whitespace() || c == '\u{FEFF}') {
                        return true;
                    }
                    self.index += c.len_utf8();
                }
                _ => return true,
            }
        }
    }

    fn identifier_tail(&mut self) {
        loop {
            match self.at(0) {
                Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_' | b'$') => self.index += 1,
                Some(byte) if byte >= 0x80 => match self.char_at_index() {
                    Some(c) if c.is_id_continue() || c == '\u{200C}' || c == '\u{200D}' => {
                        self.index += c.len_utf8()
                    }
                    _ => break,
                },
                _ => break,
            }
        }
    }

    fn digits(&mut self, is_digit: impl Fn(u8) -> bool) {
        while let Some(byte) = self.at(0) {
            if is_digit(byte) || byte == b'_' {
                self.index += 1;
            } else {
                break;
            }
        }
    }

    fn number(&mut self) {
        self.token = Token::NumberLiteral;
        let radix_digit: Option<fn(u8) -> bool> = match (self.at(0), self.at(1)) {
            (Some(b'0'), Some(b'x' | b'X')) => Some(|b: u8| b.is_ascii_hexdigit()),
            (Some(b'0'), Some(b'o' | b'O')) => Some(|b: u8| matches!(b, b'0'..=b'7')),
            (Some(b'0'), Some(b'b' | b'B')) => Some(|b: u8| matches!(b, b'0' | b'1')),
            _ => None,
        };
        if let Some(is_digit) = radix_digit {
            self.index += 2;
            let digits_start = self.index;
            self.digits(is_digit);
            if self.index == digits_start {
                self.token = Token::InvalidNumberLiteral;
                return;
            }
            if self.at(0) == Some(b'n') {
                self.index += 1;
                self.token = Token::BigIntLiteral;
            }
        } else {
            let mut integer = true;
            self.digits(|b| b.is_ascii_digit());
            if self.at(0) == Some(b'.') {
                integer = false;
                self.index += 1;
                self.digits(|b| b.is_ascii_digit());
            }
            if let Some(b'e' | b'E') = self.at(0) {
                integer = false;
                self.index += 1;
                if let Some(b'+' | b'-') = self.at(0) {
                    self.index += 1;
                }
                let digits_start = self.index;
                self.digits(|b| b.is_ascii_digit());
                if self.index == digits_start {
                    self.token = Token::InvalidNumberLiteral;
                    return;
                }
            }
            if integer && self.at(0) == Some(b'n') {
                self.index += 1;
                self.token = Token::BigIntLiteral;
            }
        }
        // An identifier may not start right after a numeric literal.
        if let Some(b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$' | b'0'..=b'9') = self.at(0) {
            self.token = Token::InvalidNumberLiteral;
        }
    }

    fn string(&mut self, quote: u8) {
        self.token = Token::StringLiteral;
        loop {
            self.index += 1;
            match self.at(0) {
                Some(b'\\') => {
                    // Skip the escaped character, including line
                    // continuations.
                    self.index += 1;
                    match self.at(0) {
                        None => {
                            self.token = Token::InvalidStringLiteral;
                            return;
                        }
                        Some(b'\r') if self.at(1) == Some(b'\n') => self.index += 1,
                        _ => {}
                    }
                }
                Some(b'\n' | b'\r') | None => {
                    self.token = Token::InvalidStringLiteral;
                    return;
                }
                Some(byte) if byte == quote => {
                    self.index += 1;
                    return;
                }
                _ => {}
            }
        }
    }

    /// Scans template characters up to the closing backtick or the next
    /// substitution.
    fn template(&mut self, head: bool) {
        loop {
            match self.at(0) {
                None => {
                    self.token = Token::InvalidTemplate;
                    return;
                }
                Some(b'`') => {
                    self.index += 1;
                    self.token = if head {
                        Token::NoSubstitutionTemplate
                    } else {
                        Token::TemplateTail
                    };
                    return;
                }
                Some(b'$') if self.at(1) == Some(b'{') => {
                    self.index += 2;
                    self.token = if head {
                        Token::TemplateHead
                    } else {
                        Token::TemplateMiddle
                    };
                    return;
                }
                Some(b'\\') => self.index += 2,
                Some(_) => self.index += 1,
            }
        }
    }

    /// Rescans the current `}` token as the continuation of a template
    /// literal.
    pub fn continue_template(&mut self) {
        debug_assert_eq!(self.token, Token::RightBrace);
        self.index = self.start + 1;
        self.template(false);
    }

    /// Rescans the current `/` or `/=` token as a regular expression literal.
    pub fn rescan_regex(&mut self) {
        debug_assert!(matches!(self.token, Token::Div | Token::DivAssign));
        self.index = self.start + 1;
        let mut in_class = false;
        loop {
            match self.at(0) {
                None | Some(b'\n' | b'\r') => {
                    self.token = Token::InvalidRegExp;
                    return;
                }
                Some(b'\\') => {
                    if let None | Some(b'\n' | b'\r') = self.at(1) {
                        self.token = Token::InvalidRegExp;
                        return;
                    }
                    self.index += 2;
                }
                Some(b'[') => {
                    in_class = true;
                    self.index += 1;
                }
                Some(b']') => {
                    in_class = false;
                    self.index += 1;
                }
                Some(b'/') if !in_class => {
                    self.index += 1;
                    break;
                }
                Some(_) => self.index += 1,
            }
        }
        // flags
        while let Some(b'a'..=b'z' | b'A'..=b'Z') = self.at(0) {
            self.index += 1;
        }
        self.token = Token::RegExpLiteral;
    }

    /// Consumes `=` after an operator prefix if present.
    fn with_assign(&mut self, plain: Token, assign: Token) -> Token {
        if self.at(0) == Some(b'=') {
            self.index += 1;
            assign
        } else {
            plain
        }
    }

    pub fn next(&mut self) {
        self.has_newline_before = false;

        if !self.skip_trivia() {
            self.start = self.index;
            self.index = self.buffer.len();
            self.token = Token::UnterminatedComment;
            return;
        }
        self.start = self.index;

        let Some(byte) = self.at(0) else {
            self.token = Token::EOF;
            return;
        };
        self.index += 1;
        self.token = match byte {
            b'+' => match self.at(0) {
                Some(b'+') => {
                    self.index += 1;
                    Token::Increment
                }
                _ => self.with_assign(Token::Plus, Token::AddAssign),
            },
            b'-' => match self.at(0) {
                Some(b'-') => {
                    self.index += 1;
                    Token::Decrement
                }
                _ => self.with_assign(Token::Minus, Token::SubAssign),
            },
            b'*' => match self.at(0) {
                Some(b'*') => {
                    self.index += 1;
                    self.with_assign(Token::Pow, Token::PowAssign)
                }
                _ => self.with_assign(Token::Mul, Token::MulAssign),
            },
            b'/' => self.with_assign(Token::Div, Token::DivAssign),
            b'%' => self.with_assign(Token::Mod, Token::ModAssign),
            b'^' => self.with_assign(Token::BitXor, Token::BitXorAssign),
            b'<' => match self.at(0) {
                Some(b'<') => {
                    self.index += 1;
                    self.with_assign(Token::BitShiftLeft, Token::BitShiftLeftAssign)
                }
                _ => self.with_assign(Token::Less, Token::LessEqual),
            },
            b'>' => match (self.at(0), self.at(1)) {
                (Some(b'>'), Some(b'>')) => {
                    self.index += 2;
                    self.with_assign(
                        Token::BitUnsignedShiftRight,
                        Token::BitUnsignedShiftRightAssign,
                    )
                }
                (Some(b'>'), _) => {
                    self.index += 1;
                    self.with_assign(Token::BitShiftRight, Token::BitShiftRightAssign)
                }
                _ => self.with_assign(Token::Greater, Token::GreaterEqual),
            },
            b'!' => match (self.at(0), self.at(1)) {
                (Some(b'='), Some(b'=')) => {
                    self.index += 2;
                    Token::NotEqualEqual
                }
                (Some(b'='), _) => {
                    self.index += 1;
                    Token::NotEqual
                }
                _ => Token::Not,
            },
            b'=' => match (self.at(0), self.at(1)) {
                (Some(b'='), Some(b'=')) => {
                    self.index += 2;
                    Token::EqualEqualEqual
                }
                (Some(b'='), _) => {
                    self.index += 1;
                    Token::EqualEqual
                }
                (Some(b'>'), _) => {
                    self.index += 1;
                    Token::Arrow
                }
                _ => Token::Equal,
            },
            b'&' => match self.at(0) {
                Some(b'&') => {
                    self.index += 1;
                    self.with_assign(Token::And, Token::AndAssign)
                }
                _ => self.with_assign(Token::BitAnd, Token::BitAndAssign),
            },
            b'|' => match self.at(0) {
                Some(b'|') => {
                    self.index += 1;
                    self.with_assign(Token::Or, Token::OrAssign)
                }
                _ => self.with_assign(Token::BitOr, Token::BitOrAssign),
            },
            b'?' => match (self.at(0), self.at(1)) {
                (Some(b'?'), _) => {
                    self.index += 1;
                    self.with_assign(Token::Nullish, Token::NullishAssign)
                }
                // `a?.5:b` is a conditional, not an optional chain.
                (Some(b'.'), Some(b'0'..=b'9')) => Token::Question,
                (Some(b'.'), _) => {
                    self.index += 1;
                    Token::QuestionDot
                }
                _ => Token::Question,
            },
            b'~' => Token::BitComplement,
            b',' => Token::Comma,
            b';' => Token::Semi,
            b':' => Token::Colon,
            b'(' => Token::LeftParen,
            b')' => Token::RightParen,
            b'{' => Token::LeftBrace,
            b'}' => Token::RightBrace,
            b'[' => Token::LeftBrack,
            b']' => Token::RightBrack,
            b'.' => match (self.at(0), self.at(1)) {
                (Some(b'0'..=b'9'), _) => {
                    self.index -= 1;
                    self.number();
                    self.token
                }
                (Some(b'.'), Some(b'.')) => {
                    self.index += 2;
                    Token::DotDotDot
                }
                _ => Token::Dot,
            },
            b'0'..=b'9' => {
                self.index -= 1;
                self.number();
                self.token
            }
            b'"' | b'\'' => {
                self.index -= 1;
                self.string(byte);
                self.token
            }
            b'`' => {
                self.template(true);
                self.token
            }
            b'#' => match self.at(0) {
                Some(b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$') => {
                    self.identifier_tail();
                    Token::PrivateIdentifier
                }
                _ => Token::Unknown,
            },
            b'a'..=b'z' | b'A'..=b'Z' | b'_' | b'$' => {
                self.identifier_tail();
                if self.at(0) == Some(b'\\') {
                    // Unicode escapes in identifiers are not supported.
                    self.index += 1;
                    Token::Unknown
                } else {
                    *KEYWORDS.get(self.text()).unwrap_or(&Token::Identifier)
                }
            }
            _ => {
                self.index -= 1;
                match self.char_at_index() {
                    Some(c) if c.is_id_start() => {
                        self.index += c.len_utf8();
                        self.identifier_tail();
                        Token::Identifier
                    }
                    Some(c) => {
                        self.index += c.len_utf8();
                        Token::Unknown
                    }
                    None => {
                        self.index += 1;
                        Token::Unknown
                    }
                }
            }
        };
    }
}

/// Returns the value of a string literal token, without its quotes and with
/// escape sequences resolved. Returns `None` for escapes that cannot be
/// decoded.
pub fn cook_string(raw: &str) -> Option<String> {
    let inner = &raw[1..raw.len() - 1];
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        let escaped = chars.next()?;
        match escaped {
            'n' => value.push('\n'),
            't' => value.push('\t'),
            'r' => value.push('\r'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{C}'),
            'v' => value.push('\u{B}'),
            '0' if !chars.peek().is_some_and(char::is_ascii_digit) => value.push('\0'),
            'x' => {
                let high = chars.next()?.to_digit(16)?;
                let low = chars.next()?.to_digit(16)?;
                value.push(char::from_u32(high * 16 + low)?);
            }
            'u' => {
                let code = if chars.peek() == Some(&'{') {
                    chars.next();
                    let mut code = 0u32;
                    loop {
                        let c = chars.next()?;
                        if c == '}' {
                            break;
                        }
                        code = code.checked_mul(16)?.checked_add(c.to_digit(16)?)?;
                    }
                    code
                } else {
                    let mut code = 0;
                    for _ in 0..4 {
                        code = code * 16 + chars.next()?.to_digit(16)?;
                    }
                    code
                };
                value.push(char::from_u32(code)?);
            }
            // line continuations
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' | LINE_SEPARATOR | PARAGRAPH_SEPARATOR => {}
            '1'..='9' => return None,
            other => value.push(other),
        }
    }
    Some(value)
}

#[cfg(test)]
mod test {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            lexer.next();
            if lexer.token == Token::EOF {
                break;
            }
            tokens.push(lexer.token);
        }
        tokens
    }

    #[test]
    fn punctuators() {
        assert_eq!(
            tokens("a ||= b ?? c?.d => ...e"),
            [
                Token::Identifier,
                Token::OrAssign,
                Token::Identifier,
                Token::Nullish,
                Token::Identifier,
                Token::QuestionDot,
                Token::Identifier,
                Token::Arrow,
                Token::DotDotDot,
                Token::Identifier,
            ]
        );
        assert_eq!(
            tokens("x >>>= 1 !== 2"),
            [
                Token::Identifier,
                Token::BitUnsignedShiftRightAssign,
                Token::NumberLiteral,
                Token::NotEqualEqual,
                Token::NumberLiteral,
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            tokens("0 0x1F 1_000 .5 1e-3 10n"),
            [
                Token::NumberLiteral,
                Token::NumberLiteral,
                Token::NumberLiteral,
                Token::NumberLiteral,
                Token::NumberLiteral,
                Token::BigIntLiteral,
            ]
        );
        assert_eq!(tokens("3px"), [Token::InvalidNumberLiteral, Token::Identifier]);
    }

    #[test]
    fn keywords_and_newlines() {
        let mut lexer = Lexer::new("import\n/* a\nb */ x");
        lexer.next();
        assert_eq!(lexer.token, Token::Keyword(Keyword::Import));
        lexer.next();
        assert_eq!(lexer.token, Token::Identifier);
        assert!(lexer.has_newline_before);
        assert_eq!(lexer.text(), "x");
    }

    #[test]
    fn templates_and_regexes_are_rescanned() {
        let mut lexer = Lexer::new("`a${b}c` /[/]x/g");
        lexer.next();
        assert_eq!(lexer.token, Token::TemplateHead);
        lexer.next();
        assert_eq!(lexer.token, Token::Identifier);
        lexer.next();
        assert_eq!(lexer.token, Token::RightBrace);
        lexer.continue_template();
        assert_eq!(lexer.token, Token::TemplateTail);
        lexer.next();
        assert_eq!(lexer.token, Token::Div);
        lexer.rescan_regex();
        assert_eq!(lexer.token, Token::RegExpLiteral);
        assert_eq!(lexer.text(), "/[/]x/g");
    }

    #[test]
    fn unterminated_input() {
        assert_eq!(tokens("/* never closed"), [Token::UnterminatedComment]);
        assert_eq!(tokens("'abc"), [Token::InvalidStringLiteral]);
        assert_eq!(tokens("`abc"), [Token::InvalidTemplate]);
    }

    #[test]
    fn hashbang_is_skipped() {
        let mut lexer = Lexer::new("#!/usr/bin/env node\nfoo");
        assert_eq!(lexer.hashbang, Some(Span::new(0, 19)));
        lexer.next();
        assert_eq!(lexer.text(), "foo");
    }

    #[test]
    fn cooks_strings() {
        assert_eq!(cook_string(r#""./abc""#).as_deref(), Some("./abc"));
        assert_eq!(cook_string(r"'\x41\n'").as_deref(), Some("A\n"));
        assert_eq!(cook_string(r#""\u{1F600}""#).as_deref(), Some("\u{1F600}"));
        assert_eq!(cook_string(r#""\1""#), None);
    }
}
