//! Template rendering.
//!
//! Templates are literal text interleaved with three tag kinds:
//!
//! - `<%= expr %>` — interpolation, HTML-escaped (the default)
//! - `<%- expr %>` — raw interpolation, inserted verbatim
//! - `<% stmt %>` — control flow: `if`/`else if`/`else`, `for x in xs`, `end`
//!
//! `<%%` emits a literal `<%`. Text outside tags passes through unchanged,
//! including whitespace and line breaks.
//!
//! Expressions support dotted variable paths, string/number/bool literals,
//! helper calls, `!`, `==`, `!=`, `+`, `&&` and `||`. Rendering is a pure
//! function of the template and its context: any error returns no output at
//! all.

use serde_json::Value;

use crate::context::{escape_html, RenderContext};
use crate::error::{TemplateError, TemplateResult};

/// Template renderer.
///
/// Stateless; a single instance may be shared across any number of renders.
#[derive(Debug, Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    /// Create a new template renderer.
    pub fn new() -> Self {
        Self
    }

    /// Render a template source against a context.
    pub fn render(&self, source: &str, ctx: &RenderContext) -> TemplateResult<String> {
        let chunks = scan(source)?;
        let nodes = Parser::new(&chunks).parse_template()?;
        let mut out = String::with_capacity(source.len());
        let mut scope = Scope {
            ctx,
            locals: Vec::new(),
        };
        exec(&nodes, &mut scope, &mut out)?;
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Scanning: split the source into text and tag chunks
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Chunk {
    line: usize,
    kind: ChunkKind,
}

#[derive(Debug)]
enum ChunkKind {
    Text(String),
    Output { code: String, raw: bool },
    Script(String),
}

fn scan(source: &str) -> TemplateResult<Vec<Chunk>> {
    let mut chunks = Vec::new();
    let mut rest = source;
    let mut line = 1;

    loop {
        let Some(start) = rest.find("<%") else {
            if !rest.is_empty() {
                chunks.push(Chunk {
                    line,
                    kind: ChunkKind::Text(rest.to_string()),
                });
            }
            return Ok(chunks);
        };

        let (text, after) = rest.split_at(start);
        if !text.is_empty() {
            chunks.push(Chunk {
                line,
                kind: ChunkKind::Text(text.to_string()),
            });
            line += text.matches('\n').count();
        }

        let after = &after[2..];
        if let Some(stripped) = after.strip_prefix('%') {
            // <%% is a literal "<%"
            chunks.push(Chunk {
                line,
                kind: ChunkKind::Text("<%".to_string()),
            });
            rest = stripped;
            continue;
        }

        let tag_line = line;
        let (marker, body) = match after.chars().next() {
            Some('=') => (Some(false), &after[1..]),
            Some('-') => (Some(true), &after[1..]),
            _ => (None, after),
        };

        let end = body
            .find("%>")
            .ok_or(TemplateError::UnterminatedTag { line: tag_line })?;
        let code = &body[..end];
        line += code.matches('\n').count();

        let kind = match marker {
            Some(raw) => ChunkKind::Output {
                code: code.trim().to_string(),
                raw,
            },
            None => ChunkKind::Script(code.trim().to_string()),
        };
        chunks.push(Chunk {
            line: tag_line,
            kind,
        });
        rest = &body[end + 2..];
    }
}

// ---------------------------------------------------------------------------
// Parsing: chunks into a block tree
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Node {
    Text(String),
    Output {
        expr: Expr,
        raw: bool,
        line: usize,
    },
    If {
        arms: Vec<(Expr, Vec<Node>)>,
        else_body: Vec<Node>,
        line: usize,
    },
    For {
        var: String,
        seq: Expr,
        body: Vec<Node>,
        line: usize,
    },
}

#[derive(Debug)]
enum Stmt {
    If(Expr),
    ElseIf(Expr),
    Else,
    End,
    For { var: String, seq: Expr },
}

/// Block terminator reached while parsing a body.
#[derive(Debug)]
enum Term {
    End,
    Else,
    ElseIf(Expr),
}

struct Parser<'a> {
    chunks: &'a [Chunk],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(chunks: &'a [Chunk]) -> Self {
        Self { chunks, pos: 0 }
    }

    fn parse_template(mut self) -> TemplateResult<Vec<Node>> {
        let (nodes, term) = self.parse_body()?;
        match term {
            None => Ok(nodes),
            Some((_, line)) => Err(TemplateError::UnbalancedBlock {
                line,
                message: "no open block to close".to_string(),
            }),
        }
    }

    /// Parse nodes until a terminator scriptlet or end of input.
    fn parse_body(&mut self) -> TemplateResult<(Vec<Node>, Option<(Term, usize)>)> {
        let mut nodes = Vec::new();
        while self.pos < self.chunks.len() {
            let chunk = &self.chunks[self.pos];
            let line = chunk.line;
            self.pos += 1;
            match &chunk.kind {
                ChunkKind::Text(t) => nodes.push(Node::Text(t.clone())),
                ChunkKind::Output { code, raw } => {
                    let expr = parse_expr(code, line)?;
                    nodes.push(Node::Output {
                        expr,
                        raw: *raw,
                        line,
                    });
                }
                ChunkKind::Script(code) => match parse_statement(code, line)? {
                    Stmt::If(cond) => nodes.push(self.parse_if(cond, line)?),
                    Stmt::For { var, seq } => nodes.push(self.parse_for(var, seq, line)?),
                    Stmt::End => return Ok((nodes, Some((Term::End, line)))),
                    Stmt::Else => return Ok((nodes, Some((Term::Else, line)))),
                    Stmt::ElseIf(cond) => return Ok((nodes, Some((Term::ElseIf(cond), line)))),
                },
            }
        }
        Ok((nodes, None))
    }

    fn parse_if(&mut self, cond: Expr, line: usize) -> TemplateResult<Node> {
        let mut arms = Vec::new();
        let mut current = cond;
        loop {
            let (body, term) = self.parse_body()?;
            match term {
                Some((Term::ElseIf(next), _)) => {
                    arms.push((current, body));
                    current = next;
                }
                Some((Term::Else, _)) => {
                    arms.push((current, body));
                    let (else_body, term) = self.parse_body()?;
                    return match term {
                        Some((Term::End, _)) => Ok(Node::If {
                            arms,
                            else_body,
                            line,
                        }),
                        Some((_, l)) => Err(TemplateError::UnbalancedBlock {
                            line: l,
                            message: "'else' branch already open".to_string(),
                        }),
                        None => Err(TemplateError::UnbalancedBlock {
                            line,
                            message: "'if' without matching 'end'".to_string(),
                        }),
                    };
                }
                Some((Term::End, _)) => {
                    arms.push((current, body));
                    return Ok(Node::If {
                        arms,
                        else_body: Vec::new(),
                        line,
                    });
                }
                None => {
                    return Err(TemplateError::UnbalancedBlock {
                        line,
                        message: "'if' without matching 'end'".to_string(),
                    })
                }
            }
        }
    }

    fn parse_for(&mut self, var: String, seq: Expr, line: usize) -> TemplateResult<Node> {
        let (body, term) = self.parse_body()?;
        match term {
            Some((Term::End, _)) => Ok(Node::For {
                var,
                seq,
                body,
                line,
            }),
            Some((_, l)) => Err(TemplateError::UnbalancedBlock {
                line: l,
                message: "'else' is not valid inside 'for'".to_string(),
            }),
            None => Err(TemplateError::UnbalancedBlock {
                line,
                message: "'for' without matching 'end'".to_string(),
            }),
        }
    }
}

fn parse_statement(code: &str, line: usize) -> TemplateResult<Stmt> {
    let code = code.trim();
    if code == "end" {
        return Ok(Stmt::End);
    }
    if code == "else" {
        return Ok(Stmt::Else);
    }
    if let Some(rest) = strip_keyword(code, "else") {
        let rest = rest.trim_start();
        if let Some(cond) = strip_keyword(rest, "if") {
            return Ok(Stmt::ElseIf(parse_expr(cond, line)?));
        }
        return Err(TemplateError::Syntax {
            line,
            message: format!("expected 'else' or 'else if', found '{code}'"),
        });
    }
    if let Some(cond) = strip_keyword(code, "if") {
        return Ok(Stmt::If(parse_expr(cond, line)?));
    }
    if let Some(rest) = strip_keyword(code, "for") {
        let (var, seq) = rest.split_once(" in ").ok_or_else(|| TemplateError::Syntax {
            line,
            message: "expected 'for <name> in <sequence>'".to_string(),
        })?;
        let var = var.trim();
        if !is_identifier(var) {
            return Err(TemplateError::Syntax {
                line,
                message: format!("invalid loop variable name '{var}'"),
            });
        }
        return Ok(Stmt::For {
            var: var.to_string(),
            seq: parse_expr(seq, line)?,
        });
    }
    Err(TemplateError::Syntax {
        line,
        message: format!("unknown statement '{code}'"),
    })
}

/// Strip a leading keyword, requiring a non-identifier boundary after it.
fn strip_keyword<'s>(code: &'s str, keyword: &str) -> Option<&'s str> {
    let rest = code.strip_prefix(keyword)?;
    match rest.chars().next() {
        Some(c) if c.is_alphanumeric() || c == '_' => None,
        Some(_) => Some(rest),
        None => None,
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Expr {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Path(Vec<String>),
    Call { name: String, args: Vec<Expr> },
    Not(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinOp {
    Eq,
    Ne,
    Add,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    Dot,
    Comma,
    LParen,
    RParen,
    Bang,
    Plus,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
}

fn parse_expr(code: &str, line: usize) -> TemplateResult<Expr> {
    let toks = lex_expr(code, line)?;
    let mut p = ExprParser {
        toks: &toks,
        pos: 0,
        line,
    };
    let expr = p.parse_or()?;
    if p.pos != toks.len() {
        return Err(TemplateError::Syntax {
            line,
            message: format!("unexpected trailing tokens in '{code}'"),
        });
    }
    Ok(expr)
}

fn lex_expr(code: &str, line: usize) -> TemplateResult<Vec<Tok>> {
    let mut toks = Vec::new();
    let mut chars = code.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '.' => {
                chars.next();
                toks.push(Tok::Dot);
            }
            ',' => {
                chars.next();
                toks.push(Tok::Comma);
            }
            '(' => {
                chars.next();
                toks.push(Tok::LParen);
            }
            ')' => {
                chars.next();
                toks.push(Tok::RParen);
            }
            '+' => {
                chars.next();
                toks.push(Tok::Plus);
            }
            '=' => {
                chars.next();
                if chars.next_if_eq(&'=').is_none() {
                    return Err(TemplateError::Syntax {
                        line,
                        message: "expected '==' (assignment is not supported)".to_string(),
                    });
                }
                toks.push(Tok::EqEq);
            }
            '!' => {
                chars.next();
                if chars.next_if_eq(&'=').is_some() {
                    toks.push(Tok::NotEq);
                } else {
                    toks.push(Tok::Bang);
                }
            }
            '&' => {
                chars.next();
                if chars.next_if_eq(&'&').is_none() {
                    return Err(TemplateError::Syntax {
                        line,
                        message: "expected '&&'".to_string(),
                    });
                }
                toks.push(Tok::AndAnd);
            }
            '|' => {
                chars.next();
                if chars.next_if_eq(&'|').is_none() {
                    return Err(TemplateError::Syntax {
                        line,
                        message: "expected '||'".to_string(),
                    });
                }
                toks.push(Tok::OrOr);
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        None => {
                            return Err(TemplateError::Syntax {
                                line,
                                message: "unterminated string literal".to_string(),
                            })
                        }
                        Some(ch) if ch == quote => break,
                        Some('\\') => match chars.next() {
                            Some('n') => s.push('\n'),
                            Some('t') => s.push('\t'),
                            Some(other) => s.push(other),
                            None => {
                                return Err(TemplateError::Syntax {
                                    line,
                                    message: "unterminated string literal".to_string(),
                                })
                            }
                        },
                        Some(ch) => s.push(ch),
                    }
                }
                toks.push(Tok::Str(s));
            }
            c if c.is_ascii_digit() => {
                let mut num = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        num.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let mut is_float = false;
                if chars.peek() == Some(&'.') {
                    // Only consume the dot when a digit follows, so paths
                    // like `1.x` stay a lex error rather than a float.
                    let mut ahead = chars.clone();
                    ahead.next();
                    if ahead.peek().is_some_and(|d| d.is_ascii_digit()) {
                        is_float = true;
                        num.push('.');
                        chars.next();
                        while let Some(&d) = chars.peek() {
                            if d.is_ascii_digit() {
                                num.push(d);
                                chars.next();
                            } else {
                                break;
                            }
                        }
                    }
                }
                if is_float {
                    let f: f64 = num.parse().map_err(|_| TemplateError::Syntax {
                        line,
                        message: format!("invalid number '{num}'"),
                    })?;
                    toks.push(Tok::Float(f));
                } else {
                    let n: i64 = num.parse().map_err(|_| TemplateError::Syntax {
                        line,
                        message: format!("invalid number '{num}'"),
                    })?;
                    toks.push(Tok::Int(n));
                }
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let mut ident = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' || d == '$' {
                        ident.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                toks.push(Tok::Ident(ident));
            }
            other => {
                return Err(TemplateError::Syntax {
                    line,
                    message: format!("unexpected character '{other}'"),
                })
            }
        }
    }
    Ok(toks)
}

struct ExprParser<'a> {
    toks: &'a [Tok],
    pos: usize,
    line: usize,
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn bump(&mut self) -> Option<&Tok> {
        let tok = self.toks.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn syntax(&self, message: impl Into<String>) -> TemplateError {
        TemplateError::Syntax {
            line: self.line,
            message: message.into(),
        }
    }

    fn parse_or(&mut self) -> TemplateResult<Expr> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Tok::OrOr) {
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> TemplateResult<Expr> {
        let mut lhs = self.parse_equality()?;
        while self.eat(&Tok::AndAnd) {
            let rhs = self.parse_equality()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> TemplateResult<Expr> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Tok::EqEq) => BinOp::Eq,
                Some(Tok::NotEq) => BinOp::Ne,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> TemplateResult<Expr> {
        let mut lhs = self.parse_unary()?;
        while self.eat(&Tok::Plus) {
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(BinOp::Add, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> TemplateResult<Expr> {
        if self.eat(&Tok::Bang) {
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> TemplateResult<Expr> {
        match self.bump().cloned() {
            Some(Tok::Str(s)) => Ok(Expr::Str(s)),
            Some(Tok::Int(n)) => Ok(Expr::Int(n)),
            Some(Tok::Float(f)) => Ok(Expr::Float(f)),
            Some(Tok::LParen) => {
                let inner = self.parse_or()?;
                if !self.eat(&Tok::RParen) {
                    return Err(self.syntax("expected ')'"));
                }
                Ok(inner)
            }
            Some(Tok::Ident(name)) => match name.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                _ => {
                    if self.eat(&Tok::LParen) {
                        let args = self.parse_args()?;
                        return Ok(Expr::Call { name, args });
                    }
                    let mut path = vec![name];
                    while self.eat(&Tok::Dot) {
                        match self.bump().cloned() {
                            Some(Tok::Ident(seg)) => path.push(seg),
                            _ => return Err(self.syntax("expected field name after '.'")),
                        }
                    }
                    Ok(Expr::Path(path))
                }
            },
            Some(other) => Err(self.syntax(format!("unexpected token {other:?}"))),
            None => Err(self.syntax("unexpected end of expression")),
        }
    }

    fn parse_args(&mut self) -> TemplateResult<Vec<Expr>> {
        let mut args = Vec::new();
        if self.eat(&Tok::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_or()?);
            if self.eat(&Tok::Comma) {
                continue;
            }
            if self.eat(&Tok::RParen) {
                return Ok(args);
            }
            return Err(self.syntax("expected ',' or ')' in argument list"));
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

struct Scope<'a> {
    ctx: &'a RenderContext,
    /// Loop bindings, innermost last; shadow context variables.
    locals: Vec<(String, Value)>,
}

impl Scope<'_> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.locals
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .or_else(|| self.ctx.get(name))
    }
}

fn exec(nodes: &[Node], scope: &mut Scope, out: &mut String) -> TemplateResult<()> {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Output { expr, raw, line } => {
                let value = eval(expr, scope, *line)?;
                let s = stringify(&value);
                if *raw {
                    out.push_str(&s);
                } else {
                    out.push_str(&escape_html(&s));
                }
            }
            Node::If {
                arms,
                else_body,
                line,
            } => {
                let mut taken = false;
                for (cond, body) in arms {
                    if truthy(&eval(cond, scope, *line)?) {
                        exec(body, scope, out)?;
                        taken = true;
                        break;
                    }
                }
                if !taken {
                    exec(else_body, scope, out)?;
                }
            }
            Node::For {
                var,
                seq,
                body,
                line,
            } => {
                let value = eval(seq, scope, *line)?;
                let Value::Array(items) = value else {
                    return Err(TemplateError::NotIterable {
                        line: *line,
                        value_kind: value_kind(&value),
                    });
                };
                for item in items {
                    scope.locals.push((var.clone(), item));
                    let result = exec(body, scope, out);
                    scope.locals.pop();
                    result?;
                }
            }
        }
    }
    Ok(())
}

fn eval(expr: &Expr, scope: &Scope, line: usize) -> TemplateResult<Value> {
    match expr {
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Int(n) => Ok(Value::from(*n)),
        Expr::Float(f) => Ok(Value::from(*f)),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Path(segments) => {
            let mut value = scope
                .lookup(&segments[0])
                .ok_or_else(|| TemplateError::MissingVariable(segments[0].clone()))?;
            for (i, segment) in segments.iter().enumerate().skip(1) {
                value = value
                    .get(segment)
                    .ok_or_else(|| TemplateError::MissingVariable(segments[..=i].join(".")))?;
            }
            Ok(value.clone())
        }
        Expr::Call { name, args } => {
            let helper = scope
                .ctx
                .helper(name)
                .ok_or_else(|| TemplateError::UnknownHelper(name.clone()))?;
            if args.len() != 1 {
                return Err(TemplateError::Syntax {
                    line,
                    message: format!("helper '{name}' takes exactly one argument"),
                });
            }
            let arg = eval(&args[0], scope, line)?;
            Ok(Value::String(helper(&stringify(&arg))))
        }
        Expr::Not(inner) => Ok(Value::Bool(!truthy(&eval(inner, scope, line)?))),
        Expr::Binary(op, lhs, rhs) => match op {
            BinOp::And => {
                let l = eval(lhs, scope, line)?;
                if !truthy(&l) {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(truthy(&eval(rhs, scope, line)?)))
            }
            BinOp::Or => {
                let l = eval(lhs, scope, line)?;
                if truthy(&l) {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(truthy(&eval(rhs, scope, line)?)))
            }
            BinOp::Eq => {
                let l = eval(lhs, scope, line)?;
                let r = eval(rhs, scope, line)?;
                Ok(Value::Bool(l == r))
            }
            BinOp::Ne => {
                let l = eval(lhs, scope, line)?;
                let r = eval(rhs, scope, line)?;
                Ok(Value::Bool(l != r))
            }
            BinOp::Add => {
                let l = eval(lhs, scope, line)?;
                let r = eval(rhs, scope, line)?;
                Ok(add_values(&l, &r))
            }
        },
    }
}

/// `+` adds numbers and concatenates everything else as strings.
fn add_values(l: &Value, r: &Value) -> Value {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
                Value::from(x + y)
            } else {
                Value::from(a.as_f64().unwrap_or(0.0) + b.as_f64().unwrap_or(0.0))
            }
        }
        _ => Value::String(stringify(l) + &stringify(r)),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(_) => true,
    }
}

/// Convert a value to its rendered string form. Strings are inserted
/// verbatim, sequences comma-join their elements, mappings render as JSON.
pub(crate) fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(stringify)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(source: &str, ctx: &RenderContext) -> TemplateResult<String> {
        TemplateRenderer::new().render(source, ctx)
    }

    #[test]
    fn test_literal_text_passthrough() {
        let ctx = RenderContext::new();
        let source = "hello\n  world\t!";
        assert_eq!(render(source, &ctx).unwrap(), source);
    }

    #[test]
    fn test_escaped_interpolation() {
        let ctx = RenderContext::new().with_var("name", "my-app");
        assert_eq!(render("App: <%= name %>", &ctx).unwrap(), "App: my-app");
    }

    #[test]
    fn test_escaped_interpolation_escapes_html() {
        let ctx = RenderContext::new().with_var("v", "<b>\"x\" & 'y'</b>");
        let out = render("<%= v %>", &ctx).unwrap();
        assert_eq!(out, "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;");
        assert!(!out.contains('<') && !out.contains('>'));
    }

    #[test]
    fn test_raw_interpolation_is_verbatim() {
        let ctx = RenderContext::new().with_var("v", "<b>&</b>");
        assert_eq!(render("<%- v %>", &ctx).unwrap(), "<b>&</b>");
    }

    #[test]
    fn test_literal_tag_escape() {
        let ctx = RenderContext::new();
        assert_eq!(render("a <%% b", &ctx).unwrap(), "a <% b");
    }

    #[test]
    fn test_if_else() {
        let source = "<% if flag %>A<% else %>B<% end %>";
        let ctx = RenderContext::new().with_var("flag", true);
        assert_eq!(render(source, &ctx).unwrap(), "A");
        let ctx = RenderContext::new().with_var("flag", false);
        assert_eq!(render(source, &ctx).unwrap(), "B");
    }

    #[test]
    fn test_else_if_chain() {
        let source = "<% if db == \"postgres\" %>P<% else if db == \"mysql\" %>M<% else %>N<% end %>";
        for (db, expected) in [("postgres", "P"), ("mysql", "M"), ("mongodb", "N")] {
            let ctx = RenderContext::new().with_var("db", db);
            assert_eq!(render(source, &ctx).unwrap(), expected);
        }
    }

    #[test]
    fn test_for_loop() {
        let source = "<% for item in items %><%= item %>,<% end %>";
        let ctx = RenderContext::new().with_var("items", json!(["x", "y"]));
        assert_eq!(render(source, &ctx).unwrap(), "x,y,");
    }

    #[test]
    fn test_nested_blocks() {
        let source = "<% for s in svcs %><% if s.enabled %><%= s.name %>;<% end %><% end %>";
        let ctx = RenderContext::new().with_var(
            "svcs",
            json!([
                {"name": "api", "enabled": true},
                {"name": "ui", "enabled": false},
                {"name": "db", "enabled": true},
            ]),
        );
        assert_eq!(render(source, &ctx).unwrap(), "api;db;");
    }

    #[test]
    fn test_loop_variable_shadows_context() {
        let source = "<% for x in xs %><%= x %><% end %><%= x %>";
        let ctx = RenderContext::new()
            .with_var("x", "outer")
            .with_var("xs", json!(["a", "b"]));
        assert_eq!(render(source, &ctx).unwrap(), "abouter");
    }

    #[test]
    fn test_helper_calls() {
        let ctx = RenderContext::new().with_var("name", "my-cool-app");
        assert_eq!(render("<%= camelCase(name) %>", &ctx).unwrap(), "myCoolApp");
        assert_eq!(render("<%= pascalCase(name) %>", &ctx).unwrap(), "MyCoolApp");
        assert_eq!(render("<%= capitalize(name) %>", &ctx).unwrap(), "My-cool-app");
    }

    #[test]
    fn test_dotted_path_lookup() {
        let ctx = RenderContext::new().with_var("app", json!({"db": {"name": "shop"}}));
        assert_eq!(render("<%= app.db.name %>", &ctx).unwrap(), "shop");
    }

    #[test]
    fn test_concatenation_and_addition() {
        let ctx = RenderContext::new().with_var("name", "app").with_var("n", 2);
        assert_eq!(render("<%= name + \"-v\" + n %>", &ctx).unwrap(), "app-v2");
        assert_eq!(render("<%= n + 3 %>", &ctx).unwrap(), "5");
    }

    #[test]
    fn test_boolean_operators() {
        let ctx = RenderContext::new().with_var("a", true).with_var("b", false);
        assert_eq!(render("<% if a && !b %>yes<% end %>", &ctx).unwrap(), "yes");
        assert_eq!(render("<% if b || a %>yes<% end %>", &ctx).unwrap(), "yes");
        assert_eq!(render("<% if b && missing %>no<% end %>", &ctx).unwrap(), "");
    }

    #[test]
    fn test_missing_variable_fails() {
        let ctx = RenderContext::new();
        let err = render("<%= nope %>", &ctx).unwrap_err();
        assert!(matches!(err, TemplateError::MissingVariable(name) if name == "nope"));
    }

    #[test]
    fn test_missing_nested_key_reports_full_path() {
        let ctx = RenderContext::new().with_var("app", json!({"name": "x"}));
        let err = render("<%= app.port %>", &ctx).unwrap_err();
        assert!(matches!(err, TemplateError::MissingVariable(path) if path == "app.port"));
    }

    #[test]
    fn test_unknown_helper_fails() {
        let ctx = RenderContext::new();
        let err = render("<%= snakeCase(\"x\") %>", &ctx).unwrap_err();
        assert!(matches!(err, TemplateError::UnknownHelper(name) if name == "snakeCase"));
    }

    #[test]
    fn test_shadowed_helper_is_not_callable() {
        let mut base = serde_json::Map::new();
        base.insert("capitalize".to_string(), json!("USER_OVERRIDE"));
        let ctx = RenderContext::build(base);
        assert_eq!(render("<%= capitalize %>", &ctx).unwrap(), "USER_OVERRIDE");
        let err = render("<%= capitalize(\"x\") %>", &ctx).unwrap_err();
        assert!(matches!(err, TemplateError::UnknownHelper(_)));
    }

    #[test]
    fn test_unterminated_tag() {
        let ctx = RenderContext::new();
        let err = render("line1\nline2 <%= name", &ctx).unwrap_err();
        assert!(matches!(err, TemplateError::UnterminatedTag { line: 2 }));
    }

    #[test]
    fn test_unbalanced_blocks() {
        let ctx = RenderContext::new().with_var("flag", true);
        assert!(matches!(
            render("<% if flag %>A", &ctx).unwrap_err(),
            TemplateError::UnbalancedBlock { .. }
        ));
        assert!(matches!(
            render("A<% end %>", &ctx).unwrap_err(),
            TemplateError::UnbalancedBlock { .. }
        ));
        assert!(matches!(
            render("<% for x in xs %><% else %><% end %>", &ctx).unwrap_err(),
            TemplateError::UnbalancedBlock { .. }
        ));
    }

    #[test]
    fn test_for_over_non_sequence_fails() {
        let ctx = RenderContext::new().with_var("xs", "not-a-list");
        let err = render("<% for x in xs %><% end %>", &ctx).unwrap_err();
        assert!(matches!(
            err,
            TemplateError::NotIterable {
                value_kind: "string",
                ..
            }
        ));
    }

    #[test]
    fn test_error_returns_no_partial_output() {
        let ctx = RenderContext::new();
        // The leading text must not leak out when the later tag fails
        assert!(render("prefix <%= missing %>", &ctx).is_err());
    }

    #[test]
    fn test_stringify_values() {
        assert_eq!(stringify(&json!(null)), "");
        assert_eq!(stringify(&json!(true)), "true");
        assert_eq!(stringify(&json!(42)), "42");
        assert_eq!(stringify(&json!(["a", 1])), "a,1");
    }

    #[test]
    fn test_multiline_template_keeps_line_breaks() {
        let source = "server:\n  name: <%= name %>\n  port: 8080\n";
        let ctx = RenderContext::new().with_var("name", "api");
        assert_eq!(
            render(source, &ctx).unwrap(),
            "server:\n  name: api\n  port: 8080\n"
        );
    }
}
