use crate::error::ParseError;
use crate::token::{Lexer, Marker, Token};

/// A typed literal argument
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Argument {
    pub fn as_text(&self) -> String {
        match self {
            Argument::Text(s) => s.clone(),
            Argument::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Argument::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Argument::Number(n) => Some(*n),
            Argument::Text(s) => s.parse().ok(),
            Argument::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        }
    }
}

/// Coerce a literal argument token into a typed value.
///
/// Quoted text is always a string; `true`/`false` become booleans;
/// finite numeric text becomes a number; anything else stays text
/// (bare identifiers such as column names included).
pub fn coerce_argument(text: &str, quoted: bool) -> Argument {
    if quoted {
        return Argument::Text(text.to_string());
    }
    match text {
        "true" => return Argument::Bool(true),
        "false" => return Argument::Bool(false),
        _ => {}
    }
    match text.parse::<f64>() {
        Ok(n) if n.is_finite() => Argument::Number(n),
        _ => Argument::Text(text.to_string()),
    }
}

/// One function call within a command block
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Argument>,
}

/// A parsed command block: column key, optional type marker, call chain
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub column_key: String,
    pub marker: Option<Marker>,
    pub calls: Vec<FunctionCall>,
    /// The exact original command text, echoed when the expression is
    /// not executed
    pub source_text: String,
}

impl Expression {
    fn new() -> Self {
        Expression {
            column_key: String::new(),
            marker: None,
            calls: Vec::new(),
            source_text: String::new(),
        }
    }
}

/// A cell's text split into interleaved literal segments and command
/// expressions.
///
/// Invariant: reassembling `segments[0] + expr[0] + segments[1] + …`
/// (echoing `source_text` for unexecuted expressions) reproduces the
/// original text. `segments.len()` is `expressions.len()` or one more.
#[derive(Debug, Clone, Default)]
pub struct ParsedCell {
    pub segments: Vec<String>,
    pub expressions: Vec<Expression>,
    pub raw: String,
}

impl ParsedCell {
    /// Reassemble literal segments with one rendered value per
    /// expression; `outputs` shorter than `expressions` echoes nothing
    /// for the tail
    pub fn assemble(&self, outputs: &[String]) -> String {
        let mut text = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            text.push_str(segment);
            if let Some(output) = outputs.get(i) {
                text.push_str(output);
            }
        }
        text
    }
}

/// Whether cell text contains command syntax at all
pub fn has_command(text: &str) -> bool {
    text.contains('{') && text.contains('}')
}

/// The consumer registered for the next text token inside a command
enum Pending {
    ColumnKey,
    CallName,
    Arg,
}

/// Parse one cell's raw text into literal segments and expressions
pub fn parse_cell(text: &str) -> Result<ParsedCell, ParseError> {
    let tokens = Lexer::new(text).tokenize()?;

    let mut segments: Vec<String> = Vec::new();
    let mut expressions: Vec<Expression> = Vec::new();

    let mut expr: Option<Expression> = None;
    let mut call: Option<FunctionCall> = None;
    let mut pending: Option<Pending> = None;
    let mut cmd_mode = false;
    let mut open_at = 0usize;
    // True when a literal segment is already in place for the next
    // expression slot; adjacent command blocks need an empty one.
    let mut slot_filled = false;

    for token in tokens {
        match token {
            Token::Open { at } => {
                cmd_mode = true;
                open_at = at;
                expr = Some(Expression::new());
                pending = Some(Pending::ColumnKey);
                if !slot_filled {
                    segments.push(String::new());
                }
                slot_filled = false;
            }
            Token::Close { end } => {
                if let Some(mut e) = expr.take() {
                    if let Some(c) = call.take() {
                        e.calls.push(c);
                    }
                    e.source_text = text[open_at..end].to_string();
                    expressions.push(e);
                }
                pending = None;
                cmd_mode = false;
            }
            Token::Marker(marker) => {
                if let Some(e) = expr.as_mut() {
                    e.marker = Some(marker);
                }
            }
            Token::Dot => {
                if let (Some(e), Some(c)) = (expr.as_mut(), call.take()) {
                    e.calls.push(c);
                }
                call = Some(FunctionCall::default());
                pending = Some(Pending::CallName);
            }
            Token::ParenOpen | Token::Comma => {
                pending = Some(Pending::Arg);
            }
            Token::ParenClose => {
                if let (Some(e), Some(c)) = (expr.as_mut(), call.take()) {
                    e.calls.push(c);
                }
                pending = Some(Pending::CallName);
            }
            Token::Text { text: t, quoted } => {
                if !cmd_mode {
                    segments.push(t);
                    slot_filled = true;
                    continue;
                }
                match pending.take() {
                    Some(Pending::ColumnKey) => {
                        if let Some(e) = expr.as_mut() {
                            e.column_key = t;
                        }
                    }
                    Some(Pending::CallName) => {
                        call.get_or_insert_with(FunctionCall::default).name = t;
                    }
                    Some(Pending::Arg) => {
                        call.get_or_insert_with(FunctionCall::default)
                            .args
                            .push(coerce_argument(&t, quoted));
                    }
                    None => {
                        return Err(ParseError::UnexpectedText {
                            text: t,
                            cell_text: text.to_string(),
                        });
                    }
                }
            }
            Token::End => break,
        }
    }

    Ok(ParsedCell {
        segments,
        expressions,
        raw: text.to_string(),
    })
}
