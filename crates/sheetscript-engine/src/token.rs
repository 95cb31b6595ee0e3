use crate::error::ParseError;

/// Escape prefix: preserves the following character literally in any state
pub const ESCAPE_CHAR: char = '\\';
/// Quote character: toggles verbatim mode inside a command block
pub const QUOTE_CHAR: char = '"';

/// Type marker following `{`, selecting the evaluation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `$` - evaluated during the primary pass
    Dollar,
    /// `@` - evaluated during the post-process pass
    At,
    /// `#` - evaluated during the primary pass
    Hash,
}

impl Marker {
    pub fn from_char(c: char) -> Option<Marker> {
        match c {
            '$' => Some(Marker::Dollar),
            '@' => Some(Marker::At),
            '#' => Some(Marker::Hash),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Marker::Dollar => '$',
            Marker::At => '@',
            Marker::Hash => '#',
        }
    }
}

/// Token types for cell text
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A run of text; `quoted` marks text read in string-literal mode
    Text { text: String, quoted: bool },
    /// `{`, carrying its byte offset in the cell text
    Open { at: usize },
    /// `}`, carrying the byte offset one past it
    Close { end: usize },
    /// Type marker directly after `{`
    Marker(Marker),
    ParenOpen,
    ParenClose,
    Dot,
    Comma,
    /// End of input
    End,
}

/// Lexer for cell text.
///
/// Three states: literal text (default), command mode between an
/// unescaped `{` and the matching `}`, and string-literal mode toggled
/// by `"` inside a command.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().collect(),
            position: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).map(|&(_, c)| c)
    }

    /// Tokenize the entire input
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        let mut buffer = String::new();
        let mut buffer_quoted = false;
        let mut cmd_mode = false;
        let mut string_mode = false;

        let flush = |tokens: &mut Vec<Token>, buffer: &mut String, quoted: &mut bool| {
            tokens.push(Token::Text {
                text: std::mem::take(buffer),
                quoted: std::mem::replace(quoted, false),
            });
        };

        while let Some(&(offset, c)) = self.chars.get(self.position) {
            self.position += 1;

            if c == ESCAPE_CHAR {
                if let Some(next) = self.peek() {
                    buffer.push(next);
                    if string_mode {
                        buffer_quoted = true;
                    }
                    self.position += 1;
                }
                continue;
            }
            if !cmd_mode && c != '{' {
                buffer.push(c);
                continue;
            }
            if string_mode && c != QUOTE_CHAR {
                buffer.push(c);
                buffer_quoted = true;
                continue;
            }

            match c {
                '{' => {
                    if !buffer.is_empty() {
                        flush(&mut tokens, &mut buffer, &mut buffer_quoted);
                    }
                    tokens.push(Token::Open { at: offset });
                    if let Some(marker) = self.peek().and_then(Marker::from_char) {
                        tokens.push(Token::Marker(marker));
                        self.position += 1;
                    }
                    cmd_mode = true;
                }
                '}' => {
                    if !buffer.is_empty() {
                        flush(&mut tokens, &mut buffer, &mut buffer_quoted);
                    }
                    tokens.push(Token::Close {
                        end: offset + c.len_utf8(),
                    });
                    cmd_mode = false;
                }
                '(' => {
                    flush(&mut tokens, &mut buffer, &mut buffer_quoted);
                    tokens.push(Token::ParenOpen);
                }
                ')' => {
                    if !buffer.is_empty() {
                        flush(&mut tokens, &mut buffer, &mut buffer_quoted);
                    }
                    tokens.push(Token::ParenClose);
                }
                '.' => {
                    if !buffer.is_empty() {
                        flush(&mut tokens, &mut buffer, &mut buffer_quoted);
                    }
                    tokens.push(Token::Dot);
                }
                ',' => {
                    flush(&mut tokens, &mut buffer, &mut buffer_quoted);
                    tokens.push(Token::Comma);
                }
                _ if c == QUOTE_CHAR => {
                    string_mode = !string_mode;
                    buffer_quoted = true;
                }
                _ => buffer.push(c),
            }
        }

        if cmd_mode || string_mode {
            return Err(ParseError::UnterminatedCommand(self.input.to_string()));
        }
        if !buffer.is_empty() {
            flush(&mut tokens, &mut buffer, &mut buffer_quoted);
        }
        tokens.push(Token::End);
        Ok(tokens)
    }
}
