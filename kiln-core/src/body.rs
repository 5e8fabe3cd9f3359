//! 方法体：封闭的语句 IR 与文本片段前端
//!
//! 只支持三种语句：
//! - `this.field = $n;`  字段赋值（参数从 1 开始编号）
//! - `System.out.println(a + " " + b);` 或 `println(...)`  诊断输出
//! - `return term;` / `return;`
//!
//! 其余写法一律报 [`BuildError::UnsupportedBodyConstruct`]。

use crate::error::BuildError;

/// 表达式项
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// 读取字段
    Field(String),
    /// 读取参数（1-based，对应 `$1`）
    Param(usize),
    /// 字符串字面量
    Str(String),
    /// 整数字面量
    Int(i32),
}

/// 语句
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `field = $param`
    Assign { field: String, param: usize },
    /// 将各项拼接后输出一行
    Print(Vec<Operand>),
    Return(Option<Operand>),
}

/// 成员体：IR 或待解析的文本片段
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Ir(Vec<Stmt>),
    Source(String),
}

impl Body {
    /// 空方法体
    pub fn empty() -> Self {
        Body::Ir(Vec::new())
    }

    /// 解析为语句序列；`member` 仅用于错误信息
    pub fn statements(&self, member: &str) -> Result<Vec<Stmt>, BuildError> {
        match self {
            Body::Ir(stmts) => Ok(stmts.clone()),
            Body::Source(source) => parse_snippet(member, source),
        }
    }
}

impl From<Vec<Stmt>> for Body {
    fn from(stmts: Vec<Stmt>) -> Self {
        Body::Ir(stmts)
    }
}

impl From<&str> for Body {
    fn from(source: &str) -> Self {
        Body::Source(source.to_string())
    }
}

impl From<String> for Body {
    fn from(source: String) -> Self {
        Body::Source(source)
    }
}

/// 解析文本形式的方法体，如 `{ this.id = $1; this.name = $2; }`
pub fn parse_snippet(member: &str, source: &str) -> Result<Vec<Stmt>, BuildError> {
    let tokens = tokenize(source).map_err(|offset| unsupported(member, source, offset))?;
    Parser {
        src: source,
        member,
        tokens,
        pos: 0,
    }
    .parse()
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// 标识符，可含 `.`（如 `this.id`、`System.out.println`）
    Ident(String),
    Param(usize),
    Str(String),
    Int(i32),
    Plus,
    Assign,
    LParen,
    RParen,
    Semi,
    LBrace,
    RBrace,
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    start: usize,
}

/// 词法分析；失败时返回出错的字节偏移
fn tokenize(src: &str) -> Result<Vec<Spanned>, usize> {
    let mut tokens = Vec::new();
    let mut chars = src.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        let token = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '+' | '=' | '(' | ')' | ';' | '{' | '}' => {
                chars.next();
                match c {
                    '+' => Token::Plus,
                    '=' => Token::Assign,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    ';' => Token::Semi,
                    '{' => Token::LBrace,
                    _ => Token::RBrace,
                }
            }
            '$' => {
                chars.next();
                let digits = take_while(&mut chars, |c| c.is_ascii_digit());
                match digits.parse::<usize>() {
                    Ok(n) if n > 0 => Token::Param(n),
                    _ => return Err(start),
                }
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some((_, '"')) => break,
                        Some((_, '\\')) => match chars.next() {
                            Some((_, 'n')) => text.push('\n'),
                            Some((_, 't')) => text.push('\t'),
                            Some((_, '"')) => text.push('"'),
                            Some((_, '\\')) => text.push('\\'),
                            _ => return Err(start),
                        },
                        Some((_, ch)) => text.push(ch),
                        None => return Err(start),
                    }
                }
                Token::Str(text)
            }
            c if c.is_ascii_digit() => {
                let digits = take_while(&mut chars, |c| c.is_ascii_digit());
                Token::Int(digits.parse::<i32>().map_err(|_| start)?)
            }
            c if c.is_alphabetic() || c == '_' => {
                let ident = take_while(&mut chars, |c| c.is_alphanumeric() || c == '_' || c == '.');
                Token::Ident(ident)
            }
            _ => return Err(start),
        };
        tokens.push(Spanned { token, start });
    }

    Ok(tokens)
}

fn take_while(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    pred: impl Fn(char) -> bool,
) -> String {
    let mut out = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if !pred(c) {
            break;
        }
        out.push(c);
        chars.next();
    }
    out
}

struct Parser<'a> {
    src: &'a str,
    member: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser<'_> {
    fn parse(mut self) -> Result<Vec<Stmt>, BuildError> {
        let mut stmts = Vec::new();
        let braced = self.eat(&Token::LBrace);

        loop {
            match self.peek() {
                None if braced => return Err(self.error()),
                None => break,
                Some(Token::RBrace) if braced => {
                    self.pos += 1;
                    if self.peek().is_some() {
                        return Err(self.error());
                    }
                    break;
                }
                Some(Token::Semi) => self.pos += 1,
                Some(_) => stmts.push(self.statement()?),
            }
        }

        Ok(stmts)
    }

    fn statement(&mut self) -> Result<Stmt, BuildError> {
        let head = match self.advance() {
            Some(Token::Ident(name)) => name,
            _ => return Err(self.error_at_previous()),
        };

        match head.as_str() {
            "return" => {
                if self.eat(&Token::Semi) {
                    return Ok(Stmt::Return(None));
                }
                let value = self.term()?;
                self.expect(&Token::Semi)?;
                Ok(Stmt::Return(Some(value)))
            }
            "System.out.println" | "println" => {
                self.expect(&Token::LParen)?;
                let mut parts = Vec::new();
                if !self.eat(&Token::RParen) {
                    parts.push(self.term()?);
                    while self.eat(&Token::Plus) {
                        parts.push(self.term()?);
                    }
                    self.expect(&Token::RParen)?;
                }
                self.expect(&Token::Semi)?;
                Ok(Stmt::Print(parts))
            }
            _ => {
                let field = self.field_name(&head)?;
                self.expect(&Token::Assign)?;
                let param = match self.advance() {
                    Some(Token::Param(n)) => n,
                    _ => return Err(self.error_at_previous()),
                };
                self.expect(&Token::Semi)?;
                Ok(Stmt::Assign { field, param })
            }
        }
    }

    fn term(&mut self) -> Result<Operand, BuildError> {
        match self.advance() {
            Some(Token::Ident(name)) => Ok(Operand::Field(self.field_name(&name)?)),
            Some(Token::Param(n)) => Ok(Operand::Param(n)),
            Some(Token::Str(s)) => Ok(Operand::Str(s)),
            Some(Token::Int(n)) => Ok(Operand::Int(n)),
            _ => Err(self.error_at_previous()),
        }
    }

    /// `this.x` 或 `x`；其余带点的名字（方法调用、静态字段）不支持
    fn field_name(&self, ident: &str) -> Result<String, BuildError> {
        let name = ident.strip_prefix("this.").unwrap_or(ident);
        if name.is_empty() || name.contains('.') || name == "return" {
            return Err(self.error_at_previous());
        }
        Ok(name.to_string())
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|t| t.token.clone());
        self.pos += 1;
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), BuildError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn offset_of(&self, index: usize) -> usize {
        self.tokens
            .get(index)
            .map(|t| t.start)
            .unwrap_or(self.src.len())
    }

    fn error(&self) -> BuildError {
        unsupported(self.member, self.src, self.offset_of(self.pos))
    }

    fn error_at_previous(&self) -> BuildError {
        unsupported(self.member, self.src, self.offset_of(self.pos.saturating_sub(1)))
    }
}

/// 截取出错位置所在的语句作为错误上下文
fn unsupported(member: &str, src: &str, offset: usize) -> BuildError {
    let offset = offset.min(src.len());
    let start = src[..offset]
        .rfind([';', '{'])
        .map(|i| i + 1)
        .unwrap_or(0);
    let end = src[offset..]
        .find(';')
        .map(|i| offset + i + 1)
        .unwrap_or(src.len());
    let mut snippet = src[start..end].trim();
    if snippet.is_empty() {
        snippet = src.trim();
    }
    BuildError::UnsupportedBodyConstruct {
        member: member.to_string(),
        snippet: snippet.to_string(),
    }
}
