//! Tokens of the canonical textual form.
//!
//! Text between tags and the inside of a tag lex differently, so there are
//! two lexers: [`ContentLexeme`] runs until a `<` or `</`, then the lexer
//! morphs into [`MarkupLexeme`] until the tag's `>` or `/>`. Both feed one
//! flat [`Token`] stream with byte spans.

use crate::error::{ReadError, ReadResult};
use logos::{Lexer, Logos};
use std::fmt;
use std::ops::Range;

/// Tokens between tags. Whitespace is significant here.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum ContentLexeme<'src> {
    #[token("<")]
    Open,

    #[token("</")]
    OpenClose,

    #[regex(r"\\[\\<>n]", escape)]
    Escape(char),

    // A backslash that starts no escape stands for itself
    #[token("\\", |lex| lex.slice())]
    #[regex(r"[^<\\ \t\r\n]+", |lex| lex.slice())]
    Word(&'src str),

    #[regex(r"[ \t\r\n]+", |lex| lex.slice())]
    Whitespace(&'src str),
}

/// Tokens inside a tag
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum MarkupLexeme<'src> {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice())]
    Name(&'src str),

    #[token("=")]
    Equals,

    // `(key)`, delimiters included
    #[regex(r"\(([^)\\]|\\.)*\)", |lex| lex.slice())]
    Key(&'src str),

    // `"literal"`, delimiters included
    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice())]
    Literal(&'src str),

    // `{expression}`, holding the text between the outer braces
    #[token("{", expression)]
    Expression(&'src str),

    #[token(">")]
    End,

    #[token("/>")]
    SelfClose,
}

fn escape<'src>(lex: &mut Lexer<'src, ContentLexeme<'src>>) -> Option<char> {
    match lex.slice().chars().nth(1)? {
        'n' => Some('\n'),
        other => Some(other),
    }
}

/// Consume the rest of a `{…}` expression. Braces balance; braces inside
/// string literals do not count.
fn expression<'src>(lex: &mut Lexer<'src, MarkupLexeme<'src>>) -> Option<&'src str> {
    let rest = lex.remainder();
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (index, ch) in rest.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' | '`' => quote = Some(ch),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    lex.bump(index + 1);
                    return Some(&rest[..index]);
                }
            }
            _ => {}
        }
    }
    None
}

/// One token of either mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'src> {
    /// A run of text without whitespace
    Word(&'src str),
    Whitespace(&'src str),
    /// An escaped character, already resolved
    Escape(char),
    Open,
    OpenClose,
    Name(&'src str),
    Equals,
    Key(&'src str),
    Literal(&'src str),
    Expression(&'src str),
    End,
    SelfClose,
}

impl<'src> From<ContentLexeme<'src>> for Token<'src> {
    fn from(lexeme: ContentLexeme<'src>) -> Self {
        match lexeme {
            ContentLexeme::Open => Token::Open,
            ContentLexeme::OpenClose => Token::OpenClose,
            ContentLexeme::Escape(ch) => Token::Escape(ch),
            ContentLexeme::Word(text) => Token::Word(text),
            ContentLexeme::Whitespace(text) => Token::Whitespace(text),
        }
    }
}

impl<'src> From<MarkupLexeme<'src>> for Token<'src> {
    fn from(lexeme: MarkupLexeme<'src>) -> Self {
        match lexeme {
            MarkupLexeme::Name(name) => Token::Name(name),
            MarkupLexeme::Equals => Token::Equals,
            MarkupLexeme::Key(raw) => Token::Key(raw),
            MarkupLexeme::Literal(raw) => Token::Literal(raw),
            MarkupLexeme::Expression(expression) => Token::Expression(expression),
            MarkupLexeme::End => Token::End,
            MarkupLexeme::SelfClose => Token::SelfClose,
        }
    }
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(text) => write!(f, "text '{}'", text),
            Token::Whitespace(_) => write!(f, "whitespace"),
            Token::Escape(ch) => write!(f, "escaped {:?}", ch),
            Token::Open => write!(f, "'<'"),
            Token::OpenClose => write!(f, "'</'"),
            Token::Name(name) => write!(f, "name '{}'", name),
            Token::Equals => write!(f, "'='"),
            Token::Key(raw) => write!(f, "key {}", raw),
            Token::Literal(raw) => write!(f, "literal {}", raw),
            Token::Expression(expression) => write!(f, "expression {{{}}}", expression),
            Token::End => write!(f, "'>'"),
            Token::SelfClose => write!(f, "'/>'"),
        }
    }
}

pub type Spanned<'src> = (Token<'src>, Range<usize>);

/// Tokenize canonical text. Unlike authoring input, nothing is skipped on
/// error: a character neither lexer accepts fails the whole read.
pub fn tokenize(source: &str) -> ReadResult<Vec<Spanned<'_>>> {
    let mut tokens = Vec::new();
    let mut content = ContentLexeme::lexer(source);
    while let Some(lexeme) = content.next() {
        let span = content.span();
        let lexeme = lexeme.map_err(|()| unexpected_char(source, span.start))?;
        let opens_tag = matches!(lexeme, ContentLexeme::Open | ContentLexeme::OpenClose);
        tokens.push((lexeme.into(), span));
        if opens_tag {
            let mut markup = content.morph::<MarkupLexeme>();
            read_markup(&mut markup, source, &mut tokens)?;
            content = markup.morph();
        }
    }
    Ok(tokens)
}

/// Markup tokens up to and including the tag's `>` or `/>`
fn read_markup<'src>(
    markup: &mut Lexer<'src, MarkupLexeme<'src>>,
    source: &'src str,
    tokens: &mut Vec<Spanned<'src>>,
) -> ReadResult<()> {
    while let Some(lexeme) = markup.next() {
        let span = markup.span();
        let lexeme = lexeme.map_err(|()| unexpected_char(source, span.start))?;
        let closes = matches!(lexeme, MarkupLexeme::End | MarkupLexeme::SelfClose);
        tokens.push((lexeme.into(), span));
        if closes {
            return Ok(());
        }
    }
    Err(ReadError::UnexpectedEof)
}

fn unexpected_char(source: &str, offset: usize) -> ReadError {
    match source.get(offset..).and_then(|rest| rest.chars().next()) {
        Some(found) => ReadError::UnexpectedChar { found, offset },
        None => ReadError::UnexpectedEof,
    }
}

/// Strip the delimiters of a `(key)` or `"literal"` and resolve its escapes
pub fn unescape_delimited(raw: &str) -> String {
    let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or_default();
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            value.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some(other) => value.push(other),
            None => value.push('\\'),
        }
    }
    value
}
