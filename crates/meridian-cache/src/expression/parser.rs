//! Recursive-descent parser producing the template syntax tree.
//!
//! Precedence, lowest first: `or`, `and`, `not`, comparison, `+`, accessors.

use super::lexer::Token;
use crate::invocation::OperationSignature;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Literal(Value),
    Reference { target: Target, path: Vec<Accessor> },
    Not(Box<Node>),
    Binary { op: BinaryOp, lhs: Box<Node>, rhs: Box<Node> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    /// `#name`, resolved against the signature after parsing.
    Variable(String),
    Positional(usize),
    Result,
    MethodName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Accessor {
    Field(String),
    Index(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    And,
    Or,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        Some(token)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(ident)) if ident == word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), String> {
        match self.bump() {
            Some(ref token) if token == expected => Ok(()),
            Some(token) => Err(format!("expected '{}' but found '{}'", expected, token)),
            None => Err(format!("expected '{}' but reached end of input", expected)),
        }
    }

    fn or(&mut self) -> Result<Node, String> {
        let mut lhs = self.and()?;
        while self.eat(&Token::OrOr) || self.eat_word("or") {
            let rhs = self.and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Node, String> {
        let mut lhs = self.not()?;
        while self.eat(&Token::AndAnd) || self.eat_word("and") {
            let rhs = self.not()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn not(&mut self) -> Result<Node, String> {
        if self.eat(&Token::Bang) || self.eat_word("not") {
            return Ok(Node::Not(Box::new(self.not()?)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Node, String> {
        let lhs = self.additive()?;
        let op = match self.peek() {
            Some(Token::EqEq) => Some(BinaryOp::Eq),
            Some(Token::NotEq) => Some(BinaryOp::Ne),
            Some(Token::Gt) => Some(BinaryOp::Gt),
            Some(Token::Ge) => Some(BinaryOp::Ge),
            Some(Token::Lt) => Some(BinaryOp::Lt),
            Some(Token::Le) => Some(BinaryOp::Le),
            Some(Token::Ident(word)) => match word.as_str() {
                "eq" => Some(BinaryOp::Eq),
                "ne" => Some(BinaryOp::Ne),
                "gt" => Some(BinaryOp::Gt),
                "ge" => Some(BinaryOp::Ge),
                "lt" => Some(BinaryOp::Lt),
                "le" => Some(BinaryOp::Le),
                _ => None,
            },
            _ => None,
        };
        let Some(op) = op else {
            return Ok(lhs);
        };
        self.pos += 1;
        let rhs = self.additive()?;
        Ok(binary(op, lhs, rhs))
    }

    fn additive(&mut self) -> Result<Node, String> {
        let mut lhs = self.primary()?;
        while self.eat(&Token::Plus) {
            let rhs = self.primary()?;
            lhs = binary(BinaryOp::Add, lhs, rhs);
        }
        Ok(lhs)
    }

    fn primary(&mut self) -> Result<Node, String> {
        match self.bump() {
            Some(Token::Variable(name)) => self.reference(name),
            Some(Token::Str(s)) => Ok(Node::Literal(Value::String(s))),
            Some(Token::Int(n)) => Ok(Node::Literal(Value::from(n))),
            Some(Token::Float(n)) => Ok(Node::Literal(Value::from(n))),
            Some(Token::Ident(word)) => match word.as_str() {
                "true" => Ok(Node::Literal(Value::Bool(true))),
                "false" => Ok(Node::Literal(Value::Bool(false))),
                "null" => Ok(Node::Literal(Value::Null)),
                _ => Err(format!(
                    "unexpected word '{}'; arguments are referenced as '#{}'",
                    word, word
                )),
            },
            Some(Token::LParen) => {
                let inner = self.or()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(token) => Err(format!("unexpected '{}'", token)),
            None => Err("unexpected end of input".to_string()),
        }
    }

    fn index(&mut self) -> Result<usize, String> {
        self.expect(&Token::LBracket)?;
        let index = match self.bump() {
            Some(Token::Int(n)) => {
                usize::try_from(n).map_err(|_| format!("index {} must not be negative", n))?
            }
            Some(token) => return Err(format!("expected an index but found '{}'", token)),
            None => return Err("expected an index but reached end of input".to_string()),
        };
        self.expect(&Token::RBracket)?;
        Ok(index)
    }

    fn reference(&mut self, name: String) -> Result<Node, String> {
        let target = match name.as_str() {
            "result" => Target::Result,
            "root" => {
                self.expect(&Token::Dot)?;
                match self.bump() {
                    Some(Token::Ident(field)) if field == "args" => {
                        Target::Positional(self.index()?)
                    }
                    Some(Token::Ident(field)) if field == "methodName" => Target::MethodName,
                    Some(token) => {
                        return Err(format!("'#root.{}' is not supported", token));
                    }
                    None => return Err("expected a field after '#root.'".to_string()),
                }
            }
            "arg" | "args" if self.peek() == Some(&Token::LBracket) => {
                Target::Positional(self.index()?)
            }
            _ => Target::Variable(name),
        };

        let mut path = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.pos += 1;
                    match self.bump() {
                        Some(Token::Ident(field)) => path.push(Accessor::Field(field)),
                        Some(token) => {
                            return Err(format!("expected a field name but found '{}'", token))
                        }
                        None => return Err("expected a field name after '.'".to_string()),
                    }
                }
                Some(Token::LBracket) => path.push(Accessor::Index(self.index()?)),
                _ => break,
            }
        }
        Ok(Node::Reference { target, path })
    }
}

fn binary(op: BinaryOp, lhs: Node, rhs: Node) -> Node {
    Node::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

/// Parses a token stream into a syntax tree; the whole stream must be consumed.
pub(crate) fn parse(tokens: Vec<Token>) -> Result<Node, String> {
    if tokens.is_empty() {
        return Err("template is empty".to_string());
    }
    let mut parser = Parser { tokens, pos: 0 };
    let node = parser.or()?;
    match parser.peek() {
        None => Ok(node),
        Some(token) => Err(format!("unexpected trailing '{}'", token)),
    }
}

/// Binds every reference to an argument position and checks it exists.
pub(crate) fn resolve(node: &mut Node, signature: &OperationSignature) -> Result<(), String> {
    match node {
        Node::Literal(_) => Ok(()),
        Node::Not(inner) => resolve(inner, signature),
        Node::Binary { lhs, rhs, .. } => {
            resolve(lhs, signature)?;
            resolve(rhs, signature)
        }
        Node::Reference { target, .. } => {
            if let Target::Variable(name) = target {
                let position = signature
                    .position(name)
                    .or_else(|| positional_alias(name))
                    .ok_or_else(|| {
                        format!(
                            "'#{}' is not a parameter of '{}' (parameters: {:?})",
                            name,
                            signature.name(),
                            signature.params()
                        )
                    })?;
                *target = Target::Positional(position);
            }
            match target {
                Target::Positional(index) if *index >= signature.arity() => Err(format!(
                    "argument index {} is out of range; '{}' takes {} argument(s)",
                    index,
                    signature.name(),
                    signature.arity()
                )),
                _ => Ok(()),
            }
        }
    }
}

/// `#a0`, `#p1`, ...
fn positional_alias(name: &str) -> Option<usize> {
    let digits = name.strip_prefix('a').or_else(|| name.strip_prefix('p'))?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Returns true if the tree reads the operation's result.
pub(crate) fn references_result(node: &Node) -> bool {
    match node {
        Node::Literal(_) => false,
        Node::Reference { target, .. } => *target == Target::Result,
        Node::Not(inner) => references_result(inner),
        Node::Binary { lhs, rhs, .. } => references_result(lhs) || references_result(rhs),
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::tokenize;
    use super::*;

    fn parse_str(source: &str) -> Result<Node, String> {
        parse(tokenize(source)?)
    }

    fn reference(target: Target, path: Vec<Accessor>) -> Node {
        Node::Reference { target, path }
    }

    #[test]
    fn test_reference_forms() {
        assert_eq!(
            parse_str("#arg[1]").unwrap(),
            reference(Target::Positional(1), vec![])
        );
        assert_eq!(
            parse_str("#root.args[0]").unwrap(),
            reference(Target::Positional(0), vec![])
        );
        assert_eq!(
            parse_str("#root.methodName").unwrap(),
            reference(Target::MethodName, vec![])
        );
        assert_eq!(
            parse_str("#result.dept[2].name").unwrap(),
            reference(
                Target::Result,
                vec![
                    Accessor::Field("dept".to_string()),
                    Accessor::Index(2),
                    Accessor::Field("name".to_string()),
                ]
            )
        );
    }

    #[test]
    fn test_precedence() {
        let node = parse_str("#a or #b and not #c").unwrap();
        let Node::Binary { op: BinaryOp::Or, rhs, .. } = node else {
            panic!("expected 'or' at the root");
        };
        let Node::Binary { op: BinaryOp::And, rhs: inner, .. } = *rhs else {
            panic!("expected 'and' under 'or'");
        };
        assert!(matches!(*inner, Node::Not(_)));
    }

    #[test]
    fn test_word_comparisons() {
        let node = parse_str("#id gt 10").unwrap();
        assert!(matches!(node, Node::Binary { op: BinaryOp::Gt, .. }));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse_str("").is_err());
        assert!(parse_str("#a +").is_err());
        assert!(parse_str("(#a").is_err());
        assert!(parse_str("#a #b").is_err());
        assert!(parse_str("#root.target").is_err());
        assert!(parse_str("#arg[-1]").is_err());
        assert!(parse_str("lastName").is_err());
    }

    #[test]
    fn test_resolve_named_and_aliases() {
        let signature = OperationSignature::new("find", ["id", "name"]);

        let mut node = parse_str("#name").unwrap();
        resolve(&mut node, &signature).unwrap();
        assert_eq!(node, reference(Target::Positional(1), vec![]));

        let mut node = parse_str("#p0").unwrap();
        resolve(&mut node, &signature).unwrap();
        assert_eq!(node, reference(Target::Positional(0), vec![]));
    }

    #[test]
    fn test_resolve_rejects_unknown_and_out_of_range() {
        let signature = OperationSignature::new("find", ["id"]);

        let mut unknown = parse_str("#lastName").unwrap();
        assert!(resolve(&mut unknown, &signature).is_err());

        let mut out_of_range = parse_str("#arg[1]").unwrap();
        assert!(resolve(&mut out_of_range, &signature).is_err());

        let mut alias_out_of_range = parse_str("#a3").unwrap();
        assert!(resolve(&mut alias_out_of_range, &signature).is_err());
    }

    #[test]
    fn test_references_result() {
        assert!(references_result(&parse_str("#result.id").unwrap()));
        assert!(references_result(&parse_str("#a0 == 1 or #result == null").unwrap()));
        assert!(!references_result(&parse_str("#a0 + 'x'").unwrap()));
    }
}
