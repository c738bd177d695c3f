//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! The tokenizer knows nothing about the grammar beyond classifying
//! operators into their precedence families (additive, multiplicative,
//! relational). Multi-character punctuators are matched before
//! single-character ones to avoid ambiguity. Lexically malformed input
//! never aborts the scan: it surfaces as `Unknown` tokens and is rejected
//! by whichever grammar layer meets it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Eof,
  Unknown,
  Number,
  Ident,
  StringConst,
  LBracket,
  RBracket,
  LParen,
  RParen,
  Comma,
  Semicolon,
  Dot,
  Colon,
  AddOp,
  MulOp,
  RelOp,
  Not,
  Assign,
  Keyword,
}

/// Reserved words, resolved from a `Keyword` token's lexeme by exact match.
/// Unmatched lexemes map to the `Unknown` sentinel, which every caller
/// treats as a syntax error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
  If,
  Then,
  Else,
  While,
  Do,
  For,
  To,
  Begin,
  End,
  Display,
  Var,
  Boolean,
  Integer,
  Char,
  Double,
  Unknown,
}

impl Keyword {
  pub fn from_lexeme(lexeme: &str) -> Self {
    match lexeme {
      "IF" => Keyword::If,
      "THEN" => Keyword::Then,
      "ELSE" => Keyword::Else,
      "WHILE" => Keyword::While,
      "DO" => Keyword::Do,
      "FOR" => Keyword::For,
      "TO" => Keyword::To,
      "BEGIN" => Keyword::Begin,
      "END" => Keyword::End,
      "DISPLAY" => Keyword::Display,
      "VAR" => Keyword::Var,
      "BOOLEAN" => Keyword::Boolean,
      "INTEGER" => Keyword::Integer,
      "CHAR" => Keyword::Char,
      "DOUBLE" => Keyword::Double,
      _ => Keyword::Unknown,
    }
  }
}

/// Thin wrapper for lexical information needed by later stages. The lexeme
/// text is recovered by slicing the source with `loc`/`len`.
#[derive(Debug, Clone)]
pub struct Token {
  pub kind: TokenKind,
  pub value: Option<u64>,
  pub loc: usize,
  pub len: usize,
  pub line: usize,
}

impl Token {
  fn new(kind: TokenKind, loc: usize, len: usize, line: usize) -> Self {
    Self {
      kind,
      value: None,
      loc,
      len,
      line,
    }
  }
}

/// Lex the input into a flat vector of tokens terminated by an `Eof` marker.
pub fn tokenize(input: &str) -> Vec<Token> {
  let mut tokens = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;
  let mut line = 1;

  while i < bytes.len() {
    let c = bytes[i];
    if c == b'\n' {
      line += 1;
      i += 1;
      continue;
    }
    if c.is_ascii_whitespace() {
      i += 1;
      continue;
    }

    if c.is_ascii_digit() {
      let start = i;
      i += 1;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      let mut token = Token::new(TokenKind::Number, start, i - start, line);
      // A digit run too large for u64 is lexically malformed.
      match input[start..i].parse::<u64>() {
        Ok(value) => token.value = Some(value),
        Err(_) => token.kind = TokenKind::Unknown,
      }
      tokens.push(token);
      continue;
    }

    if c.is_ascii_alphabetic() {
      let start = i;
      i += 1;
      while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
      }
      let kind = if Keyword::from_lexeme(&input[start..i]) != Keyword::Unknown {
        TokenKind::Keyword
      } else {
        TokenKind::Ident
      };
      tokens.push(Token::new(kind, start, i - start, line));
      continue;
    }

    if c == b'"' {
      let start = i;
      i += 1;
      while i < bytes.len() && bytes[i] != b'"' && bytes[i] != b'\n' {
        i += 1;
      }
      let kind = if i < bytes.len() && bytes[i] == b'"' {
        i += 1;
        TokenKind::StringConst
      } else {
        TokenKind::Unknown // unterminated string
      };
      tokens.push(Token::new(kind, start, i - start, line));
      continue;
    }

    let multi = [
      ("==", TokenKind::RelOp),
      ("!=", TokenKind::RelOp),
      ("<=", TokenKind::RelOp),
      (">=", TokenKind::RelOp),
      ("&&", TokenKind::MulOp),
      ("||", TokenKind::AddOp),
      (":=", TokenKind::Assign),
    ];
    if let Some((op, kind)) = multi
      .into_iter()
      .find(|(op, _)| bytes[i..].starts_with(op.as_bytes()))
    {
      tokens.push(Token::new(kind, i, op.len(), line));
      i += op.len();
      continue;
    }

    let (kind, len) = match c {
      b'[' => (TokenKind::LBracket, 1),
      b']' => (TokenKind::RBracket, 1),
      b'(' => (TokenKind::LParen, 1),
      b')' => (TokenKind::RParen, 1),
      b',' => (TokenKind::Comma, 1),
      b';' => (TokenKind::Semicolon, 1),
      b'.' => (TokenKind::Dot, 1),
      b':' => (TokenKind::Colon, 1),
      b'+' | b'-' => (TokenKind::AddOp, 1),
      b'*' | b'/' | b'%' => (TokenKind::MulOp, 1),
      b'<' | b'>' => (TokenKind::RelOp, 1),
      b'!' => (TokenKind::Not, 1),
      b'=' => (TokenKind::Assign, 1),
      // An Unknown token must cover the whole codepoint so every token's
      // loc/len stays on a char boundary.
      _ => {
        let width = input[i..].chars().next().map_or(1, char::len_utf8);
        (TokenKind::Unknown, width)
      }
    };
    tokens.push(Token::new(kind, i, len, line));
    i += len;
  }

  tokens.push(Token::new(TokenKind::Eof, input.len(), 0, line));
  tokens
}

/// Return the slice from the source that produced this token.
pub fn token_text<'a>(token: &Token, source: &'a str) -> &'a str {
  let end = token.loc + token.len;
  &source[token.loc..end]
}

/// Pull-based cursor over the token vector: the compiler only ever looks at
/// the current token and never re-reads a consumed one. The trailing `Eof`
/// marker makes `peek` total; `advance` saturates there.
pub struct TokenStream<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
}

impl<'a> TokenStream<'a> {
  pub fn new(tokens: Vec<Token>, source: &'a str) -> Self {
    debug_assert!(matches!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof)));
    Self {
      tokens,
      source,
      pos: 0,
    }
  }

  pub fn peek(&self) -> &Token {
    &self.tokens[self.pos.min(self.tokens.len() - 1)]
  }

  /// Consume the current token.
  pub fn advance(&mut self) {
    if self.pos + 1 < self.tokens.len() {
      self.pos += 1;
    }
  }

  pub fn kind(&self) -> TokenKind {
    self.peek().kind
  }

  /// Source line of the current token, 1-based.
  pub fn line(&self) -> usize {
    self.peek().line
  }

  /// Raw text of the current token; "end of input" at `Eof`.
  pub fn lexeme(&self) -> &'a str {
    let token = self.peek();
    if token.kind == TokenKind::Eof {
      "end of input"
    } else {
      token_text(token, self.source)
    }
  }

  /// Resolve the current token's lexeme as a keyword. Only meaningful when
  /// `kind()` is `Keyword`; anything else yields the `Unknown` sentinel.
  pub fn keyword(&self) -> Keyword {
    if self.kind() == TokenKind::Keyword {
      Keyword::from_lexeme(self.lexeme())
    } else {
      Keyword::Unknown
    }
  }

  pub fn is_eof(&self) -> bool {
    self.kind() == TokenKind::Eof
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(input: &str) -> Vec<TokenKind> {
    tokenize(input).into_iter().map(|t| t.kind).collect()
  }

  #[test]
  fn declaration_and_assignment_tokens() {
    use TokenKind::*;
    assert_eq!(
      kinds("VAR x : INTEGER . x = 5 ."),
      vec![Keyword, Ident, Colon, Keyword, Dot, Ident, Assign, Number, Dot, Eof]
    );
  }

  #[test]
  fn operator_families() {
    use TokenKind::*;
    assert_eq!(
      kinds("+ - || * / % && == != < > <= >= ! ="),
      vec![
        AddOp, AddOp, AddOp, MulOp, MulOp, MulOp, MulOp, RelOp, RelOp, RelOp, RelOp, RelOp,
        RelOp, Not, Assign, Eof
      ]
    );
  }

  #[test]
  fn bracket_form_tokens() {
    use TokenKind::*;
    assert_eq!(
      kinds("[a,b] a=2+3."),
      vec![
        LBracket, Ident, Comma, Ident, RBracket, Ident, Assign, Number, AddOp, Number, Dot, Eof
      ]
    );
  }

  #[test]
  fn keywords_are_exact_uppercase_matches() {
    let tokens = tokenize("WHILE while Whilst");
    assert_eq!(tokens[0].kind, TokenKind::Keyword);
    assert_eq!(tokens[1].kind, TokenKind::Ident);
    assert_eq!(tokens[2].kind, TokenKind::Ident);
    assert_eq!(Keyword::from_lexeme("WHILE"), Keyword::While);
    assert_eq!(Keyword::from_lexeme("while"), Keyword::Unknown);
  }

  #[test]
  fn malformed_input_becomes_unknown_tokens() {
    let tokens = tokenize("a = #");
    assert_eq!(tokens[2].kind, TokenKind::Unknown);
    // single & and | are not operators
    assert_eq!(kinds("&")[0], TokenKind::Unknown);
    assert_eq!(kinds("|")[0], TokenKind::Unknown);
    // digit run that overflows u64
    assert_eq!(kinds("99999999999999999999999999")[0], TokenKind::Unknown);
  }

  #[test]
  fn non_ascii_bytes_become_unknown_tokens() {
    let source = "é == 1";
    let tokens = tokenize(source);
    assert_eq!(tokens[0].kind, TokenKind::Unknown);
    assert_eq!(token_text(&tokens[0], source), "é");
    // the operator scan keeps working past the multi-byte codepoint
    assert_eq!(tokens[1].kind, TokenKind::RelOp);
    assert_eq!(tokens[2].kind, TokenKind::Number);
  }

  #[test]
  fn lines_are_tracked() {
    let tokens = tokenize("a\n=\n\n5");
    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[1].line, 2);
    assert_eq!(tokens[2].line, 4);
  }

  #[test]
  fn number_values_are_parsed_at_lex_time() {
    let tokens = tokenize("42");
    assert_eq!(tokens[0].value, Some(42));
  }

  #[test]
  fn stream_cursor_saturates_at_eof() {
    let mut stream = TokenStream::new(tokenize("x"), "x");
    assert_eq!(stream.lexeme(), "x");
    stream.advance();
    assert!(stream.is_eof());
    stream.advance();
    assert!(stream.is_eof());
    assert_eq!(stream.lexeme(), "end of input");
  }
}
