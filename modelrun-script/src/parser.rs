//! Recursive descent parser with precedence climbing for expressions.
//!
//! Binding power, loosest first:
//!
//! | operators              | associativity |
//! |------------------------|---------------|
//! | `\|\|`                 | left          |
//! | `&&`                   | left          |
//! | `==` `!=`              | left          |
//! | `<` `<=` `>` `>=`      | left          |
//! | `+` `-`                | left          |
//! | `*` `/` `%`            | left          |
//! | unary `-` `!`          | prefix        |
//! | `^`                    | right         |
//! | call, `[index]`        | postfix       |

use crate::ast::{BinaryOp, Expr, Stmt, StmtKind, UnaryOp};
use crate::error::{ScriptLangError, ScriptLangResult};
use crate::lexer::{tokenize, LineToken, Token};

const PREFIX_POWER: u8 = 13;

/// Deepest nesting of blocks and expressions accepted
pub const MAX_NESTING: usize = 256;

/// An expression with the height of its tree
type Parsed = (Expr, usize);

/// Parse a whole script.
pub fn parse(source: &str) -> ScriptLangResult<Vec<Stmt>> {
    let tokens = tokenize(source)?;
    Parser::new(&tokens).program()
}

fn binary_op(token: &Token) -> Option<(BinaryOp, u8, u8)> {
    // (operator, left binding power, right binding power)
    let entry = match token {
        Token::OrOr => (BinaryOp::Or, 1, 2),
        Token::AndAnd => (BinaryOp::And, 3, 4),
        Token::EqEq => (BinaryOp::Eq, 5, 6),
        Token::NotEq => (BinaryOp::Ne, 5, 6),
        Token::Lt => (BinaryOp::Lt, 7, 8),
        Token::LtEq => (BinaryOp::Le, 7, 8),
        Token::Gt => (BinaryOp::Gt, 7, 8),
        Token::GtEq => (BinaryOp::Ge, 7, 8),
        Token::Plus => (BinaryOp::Add, 9, 10),
        Token::Minus => (BinaryOp::Sub, 9, 10),
        Token::Star => (BinaryOp::Mul, 11, 12),
        Token::Slash => (BinaryOp::Div, 11, 12),
        Token::Percent => (BinaryOp::Rem, 11, 12),
        Token::Caret => (BinaryOp::Pow, 16, 15),
        _ => return None,
    };
    Some(entry)
}

/// Token cursor over a tokenized script.
struct Parser<'src> {
    tokens: &'src [LineToken],
    pos: usize,
    depth: usize,
}

impl<'src> Parser<'src> {
    fn new(tokens: &'src [LineToken]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|t| &t.token)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos).map(|t| &t.token);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, expected: &Token) -> bool {
        self.peek() == Some(expected)
    }

    /// Line of the current token, or of the last token at the end of input.
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn error(&self, message: impl Into<String>) -> ScriptLangError {
        ScriptLangError::Parse {
            line: self.line(),
            message: message.into(),
        }
    }

    fn unexpected(&self, context: &str) -> ScriptLangError {
        match self.peek() {
            Some(token) => self.error(format!("unexpected {token} {context}")),
            None => self.error(format!("unexpected end of input {context}")),
        }
    }

    fn expect(&mut self, expected: Token) -> ScriptLangResult<()> {
        if self.check(&expected) {
            self.advance();
            Ok(())
        } else {
            let found = match self.peek() {
                Some(token) => token.to_string(),
                None => "end of input".to_string(),
            };
            Err(self.error(format!("expected {expected}, found {found}")))
        }
    }

    fn expect_ident(&mut self, context: &str) -> ScriptLangResult<String> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(context)),
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(&Token::Newline) {
            self.advance();
        }
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek(), Some(Token::Newline | Token::Semicolon)) {
            self.advance();
        }
    }

    fn program(&mut self) -> ScriptLangResult<Vec<Stmt>> {
        let statements = self.statements()?;
        if self.peek().is_some() {
            return Err(self.unexpected("at top level"));
        }
        Ok(statements)
    }

    /// Statements up to the end of input or a closing `}`.
    fn statements(&mut self) -> ScriptLangResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        loop {
            self.skip_separators();
            match self.peek() {
                None | Some(Token::RBrace) => return Ok(statements),
                _ => {}
            }
            statements.push(self.statement()?);
            match self.peek() {
                None | Some(Token::RBrace | Token::Newline | Token::Semicolon) => {}
                _ => return Err(self.unexpected("after statement")),
            }
        }
    }

    /// Run `parse` one nesting level deeper, failing past [`MAX_NESTING`].
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> ScriptLangResult<T>,
    ) -> ScriptLangResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.too_deep());
        }
        self.depth += 1;
        let parsed = parse(self);
        self.depth -= 1;
        parsed
    }

    fn too_deep(&self) -> ScriptLangError {
        self.error(format!("nested more than {MAX_NESTING} levels deep"))
    }

    /// Height of a node whose tallest child is `child` high.
    fn node_height(&self, child: usize) -> ScriptLangResult<usize> {
        if child >= MAX_NESTING {
            Err(self.too_deep())
        } else {
            Ok(child + 1)
        }
    }

    fn block(&mut self) -> ScriptLangResult<Vec<Stmt>> {
        self.nested(|parser| {
            parser.expect(Token::LBrace)?;
            let body = parser.statements()?;
            parser.expect(Token::RBrace)?;
            Ok(body)
        })
    }

    fn statement(&mut self) -> ScriptLangResult<Stmt> {
        let line = self.line();
        let kind = match self.peek() {
            Some(Token::For) => self.for_loop()?,
            Some(Token::If) => self.conditional()?,
            _ => self.assignment()?,
        };
        Ok(Stmt { kind, line })
    }

    fn for_loop(&mut self) -> ScriptLangResult<StmtKind> {
        self.expect(Token::For)?;
        let var = self.expect_ident("after 'for'")?;
        self.expect(Token::In)?;
        let (start, _) = self.expression(0)?;
        self.expect(Token::DotDot)?;
        let (end, _) = self.expression(0)?;
        let body = self.block()?;
        Ok(StmtKind::For {
            var,
            start,
            end,
            body,
        })
    }

    fn conditional(&mut self) -> ScriptLangResult<StmtKind> {
        self.expect(Token::If)?;
        let (condition, _) = self.expression(0)?;
        let then_body = self.block()?;

        let else_body = if self.check(&Token::Else) {
            self.advance();
            if self.check(&Token::If) {
                vec![self.nested(Self::statement)?]
            } else {
                self.block()?
            }
        } else {
            Vec::new()
        };

        Ok(StmtKind::If {
            condition,
            then_body,
            else_body,
        })
    }

    fn assignment(&mut self) -> ScriptLangResult<StmtKind> {
        let (target, _) = self.expression(0)?;
        if !self.check(&Token::Assign) {
            return Ok(StmtKind::Expr(target));
        }
        self.advance();
        let (value, _) = self.expression(0)?;

        match target {
            Expr::Variable(name) => Ok(StmtKind::Assign { name, value }),
            Expr::Index { target, index } => match *target {
                Expr::Variable(name) => Ok(StmtKind::AssignIndex {
                    name,
                    index: *index,
                    value,
                }),
                _ => Err(self.error("only a named series can be assigned by index")),
            },
            _ => Err(self.error("invalid assignment target")),
        }
    }

    fn expression(&mut self, min_power: u8) -> ScriptLangResult<Parsed> {
        self.nested(|parser| parser.binary(min_power))
    }

    fn binary(&mut self, min_power: u8) -> ScriptLangResult<Parsed> {
        let (mut lhs, mut height) = self.prefix()?;

        loop {
            let Some((op, left_power, right_power)) = self.peek().and_then(binary_op) else {
                break;
            };
            if left_power < min_power {
                break;
            }
            self.advance();
            self.skip_newlines();
            let (rhs, rhs_height) = self.expression(right_power)?;
            height = self.node_height(height.max(rhs_height))?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok((lhs, height))
    }

    fn prefix(&mut self) -> ScriptLangResult<Parsed> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Bang) => UnaryOp::Not,
            _ => return self.postfix(),
        };
        self.advance();
        let (operand, height) = self.expression(PREFIX_POWER)?;
        let expr = Expr::Unary {
            op,
            operand: Box::new(operand),
        };
        Ok((expr, self.node_height(height)?))
    }

    fn postfix(&mut self) -> ScriptLangResult<Parsed> {
        let (mut expr, mut height) = self.primary()?;
        while self.check(&Token::LBracket) {
            self.advance();
            self.skip_newlines();
            let (index, index_height) = self.expression(0)?;
            self.skip_newlines();
            self.expect(Token::RBracket)?;
            height = self.node_height(height.max(index_height))?;
            expr = Expr::Index {
                target: Box::new(expr),
                index: Box::new(index),
            };
        }
        Ok((expr, height))
    }

    fn primary(&mut self) -> ScriptLangResult<Parsed> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.unexpected("in expression"));
        };

        let leaf = match token {
            Token::Number(value) => Expr::Number(value),
            Token::True => Expr::Bool(true),
            Token::False => Expr::Bool(false),
            Token::Ident(name) => {
                self.advance();
                if !self.check(&Token::LParen) {
                    return Ok((Expr::Variable(name), 1));
                }
                self.advance();
                let (args, height) = self.list(Token::RParen)?;
                return Ok((Expr::Call { name, args }, self.node_height(height)?));
            }
            Token::LParen => {
                self.advance();
                self.skip_newlines();
                let (inner, height) = self.expression(0)?;
                self.skip_newlines();
                self.expect(Token::RParen)?;
                return Ok((inner, height));
            }
            Token::LBracket => {
                self.advance();
                let (items, height) = self.list(Token::RBracket)?;
                return Ok((Expr::Array(items), self.node_height(height)?));
            }
            _ => return Err(self.unexpected("in expression")),
        };
        self.advance();
        Ok((leaf, 1))
    }

    /// Comma separated expressions up to `close`, which is consumed, with the height of
    /// the tallest.
    fn list(&mut self, close: Token) -> ScriptLangResult<(Vec<Expr>, usize)> {
        let mut items = Vec::new();
        let mut height = 0;
        self.skip_newlines();
        if self.check(&close) {
            self.advance();
            return Ok((items, height));
        }
        loop {
            let (item, item_height) = self.expression(0)?;
            items.push(item);
            height = height.max(item_height);
            self.skip_newlines();
            if self.check(&Token::Comma) {
                self.advance();
                self.skip_newlines();
                if self.check(&close) {
                    break;
                }
                continue;
            }
            break;
        }
        self.expect(close)?;
        Ok((items, height))
    }
}
