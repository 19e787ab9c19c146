//! Expression productions.
//!
//! Precedence climbing, highest to lowest: unary `NOT`/`+`/`-`, `^`,
//! `*`/`/`/`\`/`MOD`, `+`/`-`, comparisons, `AND`/`OR`, `ANDALSO`/`ORELSE`.
//! String concatenation reuses `+`; the semantic analyzer disambiguates.

use basic_ir::{builtin_by_name, BinaryOp, Expr, ExprKind, UnaryOp};
use basic_lexer::{Keyword, TokenKind};
use smallvec::SmallVec;

use crate::Parser;

/// Binary operator levels for the climb; level 0 binds loosest.
const LEVELS: u8 = 6;

impl<'a> Parser<'a> {
    pub(crate) fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_binary(0)
    }

    fn parse_binary(&mut self, level: u8) -> Option<Expr> {
        if level >= LEVELS {
            return self.parse_unary();
        }
        let mut lhs = self.parse_binary(level + 1)?;
        while let Some(op) = self.binary_op_at(level) {
            self.cursor.advance();
            let rhs = self.parse_binary(level + 1)?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Some(lhs)
    }

    fn binary_op_at(&self, level: u8) -> Option<BinaryOp> {
        let kind = &self.cursor.current().kind;
        match level {
            0 => match kind {
                TokenKind::Keyword(Keyword::AndAlso) => Some(BinaryOp::AndAlso),
                TokenKind::Keyword(Keyword::OrElse) => Some(BinaryOp::OrElse),
                _ => None,
            },
            1 => match kind {
                TokenKind::Keyword(Keyword::And) => Some(BinaryOp::And),
                TokenKind::Keyword(Keyword::Or) => Some(BinaryOp::Or),
                _ => None,
            },
            2 => match kind {
                TokenKind::Eq => Some(BinaryOp::Eq),
                TokenKind::Ne => Some(BinaryOp::Ne),
                TokenKind::Lt => Some(BinaryOp::Lt),
                TokenKind::Le => Some(BinaryOp::Le),
                TokenKind::Gt => Some(BinaryOp::Gt),
                TokenKind::Ge => Some(BinaryOp::Ge),
                _ => None,
            },
            3 => match kind {
                TokenKind::Plus => Some(BinaryOp::Add),
                TokenKind::Minus => Some(BinaryOp::Sub),
                _ => None,
            },
            4 => match kind {
                TokenKind::Star => Some(BinaryOp::Mul),
                TokenKind::Slash => Some(BinaryOp::Div),
                TokenKind::Backslash => Some(BinaryOp::IDiv),
                TokenKind::Keyword(Keyword::Mod) => Some(BinaryOp::Mod),
                _ => None,
            },
            5 => match kind {
                TokenKind::Caret => Some(BinaryOp::Pow),
                _ => None,
            },
            _ => None,
        }
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        let op = match &self.cursor.current().kind {
            TokenKind::Keyword(Keyword::Not) => Some(UnaryOp::LogicalNot),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Negate),
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_postfix();
        };
        let start = self.cursor.current_span();
        self.cursor.advance();
        let operand = self.parse_unary()?;
        let span = start.merge(operand.span);
        Some(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    pub(crate) fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match &self.cursor.current().kind {
                TokenKind::Dot => {
                    self.cursor.advance();
                    let Some((member, member_span)) = self.cursor.eat_ident() else {
                        self.unexpected("a member name after '.'");
                        return Some(expr);
                    };
                    let span = expr.span.merge(member_span);
                    if matches!(self.cursor.current().kind, TokenKind::LParen) {
                        self.cursor.advance();
                        let args = self.parse_args();
                        let end = self.cursor.previous_span();
                        expr = Expr::new(
                            ExprKind::MethodCall {
                                base: Box::new(expr),
                                method: member,
                                args,
                            },
                            span.merge(end),
                        );
                    } else {
                        expr = Expr::new(
                            ExprKind::Member {
                                base: Box::new(expr),
                                member,
                            },
                            span,
                        );
                    }
                }
                TokenKind::Keyword(Keyword::Is) => {
                    self.cursor.advance();
                    let type_name = self.parse_dotted_name("a type name after IS");
                    let span = expr.span.merge(self.cursor.previous_span());
                    expr = Expr::new(
                        ExprKind::Is {
                            value: Box::new(expr),
                            type_name,
                        },
                        span,
                    );
                }
                TokenKind::Keyword(Keyword::As) if self.allow_as_cast => {
                    self.cursor.advance();
                    let type_name = self.parse_dotted_name("a type name after AS");
                    let span = expr.span.merge(self.cursor.previous_span());
                    expr = Expr::new(
                        ExprKind::As {
                            value: Box::new(expr),
                            type_name,
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        Some(expr)
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let span = self.cursor.current_span();
        match self.cursor.current().kind.clone() {
            TokenKind::Int(value) => {
                self.cursor.advance();
                Some(Expr::int(value, span))
            }
            TokenKind::Float(value) => {
                self.cursor.advance();
                Some(Expr::float(value, span))
            }
            TokenKind::Str(value) => {
                self.cursor.advance();
                Some(Expr::string(value, span))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.cursor.advance();
                Some(Expr::bool(true, span))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.cursor.advance();
                Some(Expr::bool(false, span))
            }
            TokenKind::Keyword(Keyword::Me) => {
                self.cursor.advance();
                Some(Expr::new(ExprKind::Me, span))
            }
            TokenKind::LParen => {
                self.cursor.advance();
                let inner = self.parse_expr()?;
                if !self.cursor.eat(&TokenKind::RParen) {
                    self.unexpected("')'");
                }
                Some(inner)
            }
            TokenKind::Keyword(Keyword::New) => {
                self.cursor.advance();
                let path = self.parse_dotted_name("a class name after NEW");
                let args = if self.cursor.eat(&TokenKind::LParen) {
                    self.parse_args()
                } else {
                    Vec::new()
                };
                let end = self.cursor.previous_span();
                let class_name = path.last().cloned().unwrap_or_default();
                let qualified = if path.len() > 1 { path } else { Vec::new() };
                Some(Expr::new(
                    ExprKind::New {
                        class_name,
                        qualified,
                        args,
                    },
                    span.merge(end),
                ))
            }
            TokenKind::Keyword(Keyword::AddressOf) => {
                self.cursor.advance();
                let Some((name, name_span)) = self.cursor.eat_ident() else {
                    self.unexpected("a procedure name after ADDRESSOF");
                    return None;
                };
                Some(Expr::new(
                    ExprKind::AddressOf(name),
                    span.merge(name_span),
                ))
            }
            TokenKind::Keyword(kw @ (Keyword::Lbound | Keyword::Ubound)) => {
                self.cursor.advance();
                if !self.cursor.eat(&TokenKind::LParen) {
                    self.unexpected("'('");
                    return None;
                }
                let Some((name, _)) = self.cursor.eat_ident() else {
                    self.unexpected("an array name");
                    return None;
                };
                if !self.cursor.eat(&TokenKind::RParen) {
                    self.unexpected("')'");
                }
                let end = self.cursor.previous_span();
                let kind = if kw == Keyword::Lbound {
                    ExprKind::LBound(name)
                } else {
                    ExprKind::UBound(name)
                };
                Some(Expr::new(kind, span.merge(end)))
            }
            TokenKind::Ident(name) => {
                self.cursor.advance();
                self.ident_expr(name, span)
            }
            _ => {
                self.unexpected("an expression");
                None
            }
        }
    }

    /// An identifier in expression position: array access, builtin call,
    /// user call, or a plain variable reference.
    fn ident_expr(&mut self, name: String, span: basic_ir::Span) -> Option<Expr> {
        if !matches!(self.cursor.current().kind, TokenKind::LParen) {
            return Some(Expr::new(ExprKind::Var(name), span));
        }
        self.cursor.advance();
        let args = self.parse_args();
        let end = self.cursor.previous_span();
        let full = span.merge(end);

        if self.known_arrays.contains(&name) {
            let indices: SmallVec<[Box<Expr>; 2]> = args.into_iter().map(Box::new).collect();
            return Some(Expr::new(ExprKind::Array { name, indices }, full));
        }
        if let Some(builtin) = builtin_by_name(&name) {
            return Some(Expr::new(ExprKind::Builtin { builtin, args }, full));
        }
        Some(Expr::new(
            ExprKind::Call {
                callee: name,
                qualified: Vec::new(),
                args,
            },
            full,
        ))
    }

    /// Comma-separated argument list; the opening parenthesis is already
    /// consumed, the closing one is consumed here.
    pub(crate) fn parse_args(&mut self) -> Vec<Expr> {
        let mut args = Vec::new();
        if self.cursor.eat(&TokenKind::RParen) {
            return args;
        }
        loop {
            match self.parse_expr() {
                Some(arg) => args.push(arg),
                None => {
                    self.sync_to_eol();
                    return args;
                }
            }
            if self.cursor.eat(&TokenKind::Comma) {
                continue;
            }
            if !self.cursor.eat(&TokenKind::RParen) {
                self.unexpected("')' or ','");
                self.sync_to_eol();
            }
            return args;
        }
    }

    /// Dotted name path (`A.B.C`). Reports and returns what was parsed so
    /// far when a segment is missing.
    pub(crate) fn parse_dotted_name(&mut self, what: &str) -> Vec<String> {
        let mut path = Vec::new();
        match self.cursor.eat_ident() {
            Some((first, _)) => path.push(first),
            None => {
                self.unexpected(what);
                return path;
            }
        }
        while matches!(self.cursor.current().kind, TokenKind::Dot)
            && matches!(self.cursor.peek(1).kind, TokenKind::Ident(_))
        {
            self.cursor.advance();
            if let Some((segment, _)) = self.cursor.eat_ident() {
                path.push(segment);
            }
        }
        path
    }
}
