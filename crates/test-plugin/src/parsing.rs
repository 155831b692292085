use anyhow::bail;
use anyhow::Result;

/// A parsed source file. Statements are separated by newlines at the
/// top level and inside braced blocks. Newlines inside parentheses are
/// plain whitespace, which is what makes formatting idempotent when a
/// call gets broken across lines.
pub struct File {
  pub statements: Vec<Statement>,
}

pub struct Statement {
  /// Whether the source had a blank line before this statement.
  pub blank_line_before: bool,
  pub nodes: Vec<Node>,
}

pub enum Node {
  Expr(Expr),
  Block(Vec<Statement>),
}

pub enum Expr {
  Word(String),
  Call { callee: String, args: Vec<Expr> },
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
  Word(String),
  OpenParen,
  CloseParen,
  Comma,
  OpenBrace,
  CloseBrace,
  NewLine,
  BlankLine,
}

pub fn parse(text: &str) -> Result<File> {
  let tokens = tokenize(text)?;
  let mut parser = Parser { tokens, position: 0 };
  let statements = parser.parse_statements(false)?;
  if parser.position < parser.tokens.len() {
    bail!("Unexpected '}}'.");
  }
  Ok(File { statements })
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
  let mut tokens = Vec::new();
  let mut paren_depth = 0u32;
  let mut chars = text.chars().peekable();
  while let Some(character) = chars.next() {
    match character {
      ' ' | '\t' | '\r' => {}
      '\n' => {
        if paren_depth > 0 {
          continue;
        }
        let mut newline_count = 1;
        while let Some(next) = chars.peek() {
          match next {
            ' ' | '\t' | '\r' => {
              chars.next();
            }
            '\n' => {
              newline_count += 1;
              chars.next();
            }
            _ => break,
          }
        }
        tokens.push(if newline_count > 1 { Token::BlankLine } else { Token::NewLine });
      }
      '(' => {
        paren_depth += 1;
        tokens.push(Token::OpenParen);
      }
      ')' => {
        if paren_depth == 0 {
          bail!("Unexpected ')'.");
        }
        paren_depth -= 1;
        tokens.push(Token::CloseParen);
      }
      ',' => tokens.push(Token::Comma),
      '{' => tokens.push(Token::OpenBrace),
      '}' => tokens.push(Token::CloseBrace),
      _ => {
        let mut word = String::new();
        word.push(character);
        while let Some(next) = chars.peek() {
          if matches!(next, ' ' | '\t' | '\r' | '\n' | '(' | ')' | ',' | '{' | '}') {
            break;
          }
          word.push(*next);
          chars.next();
        }
        tokens.push(Token::Word(word));
      }
    }
  }
  if paren_depth > 0 {
    bail!("Unclosed '('.");
  }
  Ok(tokens)
}

struct Parser {
  tokens: Vec<Token>,
  position: usize,
}

impl Parser {
  fn parse_statements(&mut self, inside_block: bool) -> Result<Vec<Statement>> {
    let mut statements = Vec::new();
    // separators before the first statement carry no blank line
    while matches!(self.peek(), Some(Token::NewLine) | Some(Token::BlankLine)) {
      self.position += 1;
    }
    let mut blank_line_before = false;
    loop {
      match self.peek() {
        None => {
          if inside_block {
            bail!("Unclosed '{{'.");
          }
          return Ok(statements);
        }
        // left for the caller to consume, or to report at the top level
        Some(Token::CloseBrace) => return Ok(statements),
        _ => {}
      }
      let nodes = self.parse_statement_nodes()?;
      statements.push(Statement { blank_line_before, nodes });
      blank_line_before = false;
      while let Some(token) = self.peek() {
        match token {
          Token::NewLine => {
            self.position += 1;
          }
          Token::BlankLine => {
            blank_line_before = true;
            self.position += 1;
          }
          _ => break,
        }
      }
    }
  }

  fn parse_statement_nodes(&mut self) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    loop {
      match self.peek() {
        None | Some(Token::NewLine) | Some(Token::BlankLine) | Some(Token::CloseBrace) => break,
        Some(Token::Word(_)) => {
          let expr = self.parse_expr()?;
          nodes.push(Node::Expr(expr));
        }
        Some(Token::OpenBrace) => {
          self.position += 1;
          let statements = self.parse_statements(true)?;
          match self.peek() {
            Some(Token::CloseBrace) => self.position += 1,
            _ => bail!("Unclosed '{{'."),
          }
          nodes.push(Node::Block(statements));
        }
        Some(token) => bail!("Unexpected token: {:?}", token),
      }
    }
    if nodes.is_empty() {
      bail!("Expected a statement.");
    }
    Ok(nodes)
  }

  fn parse_expr(&mut self) -> Result<Expr> {
    let callee = match self.next() {
      Some(Token::Word(word)) => word.clone(),
      token => bail!("Expected a word, found {:?}.", token),
    };
    if self.peek() != Some(&Token::OpenParen) {
      return Ok(Expr::Word(callee));
    }
    self.position += 1;
    let mut args = Vec::new();
    loop {
      match self.peek() {
        Some(Token::CloseParen) => {
          self.position += 1;
          break;
        }
        Some(Token::Word(_)) => {
          args.push(self.parse_expr()?);
          match self.peek() {
            Some(Token::Comma) => {
              self.position += 1;
            }
            Some(Token::CloseParen) => {}
            token => bail!("Expected ',' or ')', found {:?}.", token),
          }
        }
        token => bail!("Expected an argument or ')', found {:?}.", token),
      }
    }
    Ok(Expr::Call { callee, args })
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.position)
  }

  fn next(&mut self) -> Option<&Token> {
    let token = self.tokens.get(self.position);
    if token.is_some() {
      self.position += 1;
    }
    token
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn parses_words_and_calls() {
    let file = parse("let value be compute(alpha, nested(beta))").unwrap();
    assert_eq!(file.statements.len(), 1);
    let nodes = &file.statements[0].nodes;
    assert_eq!(nodes.len(), 4);
    match &nodes[3] {
      Node::Expr(Expr::Call { callee, args }) => {
        assert_eq!(callee, "compute");
        assert_eq!(args.len(), 2);
        assert!(matches!(&args[1], Expr::Call { .. }));
      }
      _ => panic!("expected a call"),
    }
  }

  #[test]
  fn newlines_inside_parens_are_whitespace() {
    let file = parse("compute(\n  alpha,\n  beta\n)").unwrap();
    assert_eq!(file.statements.len(), 1);
  }

  #[test]
  fn blank_lines_are_tracked() {
    let file = parse("first\n\nsecond\nthird").unwrap();
    assert_eq!(file.statements.len(), 3);
    assert!(!file.statements[0].blank_line_before);
    assert!(file.statements[1].blank_line_before);
    assert!(!file.statements[2].blank_line_before);
  }

  #[test]
  fn parses_blocks() {
    let file = parse("task build {\n  run(compile)\n  run(link)\n}").unwrap();
    assert_eq!(file.statements.len(), 1);
    match &file.statements[0].nodes[2] {
      Node::Block(statements) => assert_eq!(statements.len(), 2),
      _ => panic!("expected a block"),
    }
  }

  #[test]
  fn errors_on_unbalanced_input() {
    assert!(parse("compute(alpha").is_err());
    assert!(parse("compute)").is_err());
    assert!(parse("task {").is_err());
    assert!(parse("}").is_err());
    assert!(parse("compute(alpha beta)").is_err());
  }
}
