//! Statement productions.

use basic_ir::{
    CaseArm, DoCond, DoTestPos, ElseIf, ExitKind, Expr, ExprKind, OpenMode, PrintChMode,
    PrintItem, ResumeMode, Span, Stmt, StmtKind,
};
use basic_diagnostic::ErrorCode;
use basic_lexer::{Keyword, TokenKind};
use smallvec::SmallVec;

use super::Term;
use crate::Parser;

impl<'a> Parser<'a> {
    /// Build a statement at the current BASIC line.
    fn stmt(&self, kind: StmtKind, span: Span) -> Stmt {
        Stmt::new(kind, self.line, span)
    }

    /// Parse one statement. Returns `None` after reporting and syncing on
    /// junk that does not start a statement.
    pub(crate) fn parse_stmt(&mut self) -> Option<Stmt> {
        let span = self.cursor.current_span();
        let kind = self.cursor.current().kind.clone();
        match &kind {
            TokenKind::Keyword(kw) => match kw {
                Keyword::Let => {
                    self.cursor.advance();
                    self.parse_assign_or_call(span)
                }
                Keyword::Print => self.parse_print(span),
                Keyword::Write => self.parse_write(span),
                Keyword::Input => self.parse_input(span),
                Keyword::Line => self.parse_line_input(span),
                Keyword::Open => self.parse_open(span),
                Keyword::Close => self.parse_close(span),
                Keyword::Seek => self.parse_seek(span),
                Keyword::Dim => self.parse_dim(span),
                Keyword::ReDim => self.parse_redim(span),
                Keyword::Const => self.parse_const(span),
                Keyword::Static => self.parse_static(span),
                Keyword::Shared => self.parse_shared(span),
                Keyword::Swap => self.parse_swap(span),
                Keyword::If => self.parse_if(span),
                Keyword::Select => self.parse_select_case(span),
                Keyword::While => self.parse_while(span),
                Keyword::Do => self.parse_do(span),
                Keyword::For => self.parse_for(span),
                Keyword::Next => self.parse_next(span),
                Keyword::Exit => self.parse_exit(span),
                Keyword::Goto => self.parse_goto(span),
                Keyword::Gosub => self.parse_gosub(span),
                Keyword::Return => self.parse_return(span),
                Keyword::End => self.parse_end(span),
                Keyword::On => self.parse_on_error(span),
                Keyword::Resume => self.parse_resume(span),
                Keyword::Try => self.parse_try(span),
                Keyword::Cls => self.parse_simple(span, StmtKind::Cls),
                Keyword::Beep => self.parse_simple(span, StmtKind::Beep),
                Keyword::Color => self.parse_color(span),
                Keyword::Locate => self.parse_locate(span),
                Keyword::Sleep => self.parse_sleep(span),
                Keyword::Cursor => self.parse_cursor(span),
                Keyword::AltScreen => self.parse_altscreen(span),
                Keyword::Randomize => self.parse_randomize(span),
                Keyword::Function => self.parse_function(span),
                Keyword::Sub => self.parse_sub(span),
                Keyword::Class => self.parse_class(span),
                Keyword::Type => self.parse_type_decl(span),
                Keyword::Interface => self.parse_interface(span),
                Keyword::Using => self.parse_using(span),
                Keyword::Delete => self.parse_delete(span),
                Keyword::Constructor => self.parse_constructor(span),
                Keyword::Destructor => self.parse_destructor(span),
                Keyword::Method => self.parse_method(span),
                Keyword::Property => self.parse_property(span),
                Keyword::Me => self.parse_assign_or_call(span),
                _ => {
                    self.unexpected("a statement");
                    self.sync_to_eol();
                    None
                }
            },
            TokenKind::Ident(_) => self.parse_assign_or_call(span),
            _ => {
                self.unexpected("a statement");
                self.sync_to_eol();
                None
            }
        }
    }

    fn parse_simple(&mut self, span: Span, kind: StmtKind) -> Option<Stmt> {
        self.cursor.advance();
        Some(self.stmt(kind, span))
    }

    // Assignment and calls -------------------------------------------------

    /// `LET target = expr`, implicit assignment, or a call statement.
    fn parse_assign_or_call(&mut self, span: Span) -> Option<Stmt> {
        let target = self.parse_postfix()?;
        if self.cursor.eat(&TokenKind::Eq) {
            let target = self.into_lvalue(target);
            let value = self.parse_expr()?;
            let full = span.merge(value.span);
            return Some(self.stmt(StmtKind::Let { target, value }, full));
        }
        match target.kind {
            ExprKind::Call { .. } | ExprKind::MethodCall { .. } => {
                let full = span.merge(target.span);
                Some(self.stmt(
                    StmtKind::CallStmt {
                        call: Some(target),
                    },
                    full,
                ))
            }
            _ => {
                self.unexpected("'=' or a call");
                self.sync_to_eol();
                None
            }
        }
    }

    /// Reinterpret an expression in assignment-target position. `NAME(...)`
    /// parsed as a call becomes an array access.
    fn into_lvalue(&mut self, expr: Expr) -> Expr {
        match expr.kind {
            ExprKind::Var(_) | ExprKind::Array { .. } | ExprKind::Member { .. } => expr,
            ExprKind::Call {
                callee,
                qualified: _,
                args,
            } => {
                let indices: SmallVec<[Box<Expr>; 2]> = args.into_iter().map(Box::new).collect();
                Expr::new(
                    ExprKind::Array {
                        name: callee,
                        indices,
                    },
                    expr.span,
                )
            }
            _ => {
                self.report(
                    ErrorCode::B1103,
                    expr.span,
                    "expected variable on the left of '='",
                );
                expr
            }
        }
    }

    // I/O ------------------------------------------------------------------

    fn parse_print(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        if self.cursor.eat(&TokenKind::Hash) {
            return self.parse_print_channel(span, PrintChMode::Print);
        }
        let mut items = Vec::new();
        loop {
            match &self.cursor.current().kind {
                TokenKind::Comma => {
                    self.cursor.advance();
                    items.push(PrintItem::Comma);
                }
                TokenKind::Semicolon => {
                    self.cursor.advance();
                    items.push(PrintItem::Semicolon);
                }
                TokenKind::Eol | TokenKind::Eof | TokenKind::Colon => break,
                TokenKind::Keyword(Keyword::Else) => break,
                _ => {
                    let expr = self.parse_expr()?;
                    items.push(PrintItem::Expr(expr));
                }
            }
        }
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::Print { items }, span.merge(end)))
    }

    fn parse_write(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        if !self.cursor.eat(&TokenKind::Hash) {
            self.unexpected("'#' after WRITE");
            self.sync_to_eol();
            return None;
        }
        self.parse_print_channel(span, PrintChMode::Write)
    }

    /// Shared tail of `PRINT #` / `WRITE #`: channel, arguments, optional
    /// trailing `;` suppressing the newline.
    fn parse_print_channel(&mut self, span: Span, mode: PrintChMode) -> Option<Stmt> {
        let channel = self.parse_expr();
        let mut args = Vec::new();
        let mut trailing_newline = true;
        while self.cursor.eat(&TokenKind::Comma) {
            if self.cursor.at_line_end() {
                break;
            }
            if let Some(arg) = self.parse_expr() {
                args.push(arg);
            } else {
                self.sync_to_eol();
                break;
            }
        }
        if self.cursor.eat(&TokenKind::Semicolon) {
            trailing_newline = false;
        }
        let end = self.cursor.previous_span();
        Some(self.stmt(
            StmtKind::PrintCh {
                mode,
                channel,
                args,
                trailing_newline,
            },
            span.merge(end),
        ))
    }

    fn parse_input(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        if self.cursor.eat(&TokenKind::Hash) {
            let channel = self.parse_expr()?;
            if !self.cursor.eat(&TokenKind::Comma) {
                self.unexpected("',' after the channel");
            }
            let mut targets = Vec::new();
            loop {
                match self.cursor.eat_ident() {
                    Some((name, _)) => targets.push(name),
                    None => {
                        self.unexpected("a variable name");
                        self.sync_to_eol();
                        break;
                    }
                }
                if !self.cursor.eat(&TokenKind::Comma) {
                    break;
                }
            }
            let end = self.cursor.previous_span();
            return Some(self.stmt(StmtKind::InputCh { channel, targets }, span.merge(end)));
        }

        let mut prompt = None;
        if let TokenKind::Str(_) = self.cursor.current().kind {
            if matches!(
                self.cursor.peek(1).kind,
                TokenKind::Comma | TokenKind::Semicolon
            ) {
                prompt = self.parse_expr();
                self.cursor.advance();
            }
        }
        let mut vars = Vec::new();
        loop {
            match self.cursor.eat_ident() {
                Some((name, _)) => vars.push(name),
                None => {
                    self.unexpected("a variable name");
                    self.sync_to_eol();
                    break;
                }
            }
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::Input { prompt, vars }, span.merge(end)))
    }

    fn parse_line_input(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        if !self.cursor.eat_keyword(Keyword::Input) {
            self.unexpected("INPUT after LINE");
            self.sync_to_eol();
            return None;
        }
        if !self.cursor.eat(&TokenKind::Hash) {
            self.unexpected("'#' after LINE INPUT");
        }
        let channel = self.parse_expr();
        if !self.cursor.eat(&TokenKind::Comma) {
            self.unexpected("',' after the channel");
        }
        let target = self.parse_postfix();
        if let Some(target) = &target {
            if !matches!(target.kind, ExprKind::Var(_) | ExprKind::Array { .. }) {
                self.report(
                    ErrorCode::B1103,
                    target.span,
                    "expected variable as LINE INPUT # target",
                );
            }
        }
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::LineInputCh { channel, target }, span.merge(end)))
    }

    fn parse_open(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let path = self.parse_expr();
        if !self.cursor.eat_keyword(Keyword::For) {
            self.unexpected("FOR in OPEN statement");
        }
        let mode = if self.cursor.eat_keyword(Keyword::Input) {
            OpenMode::Input
        } else if self.cursor.at_ident_ci("OUTPUT") {
            self.cursor.advance();
            OpenMode::Output
        } else if self.cursor.at_ident_ci("APPEND") {
            self.cursor.advance();
            OpenMode::Append
        } else if self.cursor.at_ident_ci("BINARY") {
            self.cursor.advance();
            OpenMode::Binary
        } else if self.cursor.at_ident_ci("RANDOM") {
            self.cursor.advance();
            OpenMode::Random
        } else {
            self.unexpected("a file mode (INPUT, OUTPUT, APPEND, BINARY, RANDOM)");
            OpenMode::Input
        };
        if !self.cursor.eat_keyword(Keyword::As) {
            self.unexpected("AS in OPEN statement");
        }
        let _ = self.cursor.eat(&TokenKind::Hash);
        let channel = self.parse_expr();
        let end = self.cursor.previous_span();
        Some(self.stmt(
            StmtKind::Open {
                mode,
                path,
                channel,
            },
            span.merge(end),
        ))
    }

    fn parse_close(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let channel = if self.cursor.at_line_end() {
            None
        } else {
            let _ = self.cursor.eat(&TokenKind::Hash);
            self.parse_expr()
        };
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::Close { channel }, span.merge(end)))
    }

    fn parse_seek(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let _ = self.cursor.eat(&TokenKind::Hash);
        let channel = self.parse_expr();
        let position = if self.cursor.eat(&TokenKind::Comma) {
            self.parse_expr()
        } else {
            None
        };
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::Seek { channel, position }, span.merge(end)))
    }

    // Declarations (variable-level) ----------------------------------------

    fn parse_dim(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let Some((name, _)) = self.cursor.eat_ident() else {
            self.unexpected("a variable name after DIM");
            self.sync_to_eol();
            return None;
        };
        let mut is_array = false;
        let mut size = None;
        if self.cursor.eat(&TokenKind::LParen) {
            is_array = true;
            size = self.parse_expr();
            if !self.cursor.eat(&TokenKind::RParen) {
                self.unexpected("')'");
            }
            self.known_arrays.insert(name.clone());
        }
        let ty = if self.cursor.eat_keyword(Keyword::As) {
            self.parse_type_name().unwrap_or_else(|| Self::sigil_type(&name))
        } else {
            Self::sigil_type(&name)
        };
        let end = self.cursor.previous_span();
        Some(self.stmt(
            StmtKind::Dim {
                name,
                is_array,
                size,
                ty,
            },
            span.merge(end),
        ))
    }

    fn parse_redim(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let Some((name, _)) = self.cursor.eat_ident() else {
            self.unexpected("an array name after REDIM");
            self.sync_to_eol();
            return None;
        };
        let size = if self.cursor.eat(&TokenKind::LParen) {
            let size = self.parse_expr();
            if !self.cursor.eat(&TokenKind::RParen) {
                self.unexpected("')'");
            }
            size
        } else {
            None
        };
        self.known_arrays.insert(name.clone());
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::ReDim { name, size }, span.merge(end)))
    }

    fn parse_const(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let Some((name, _)) = self.cursor.eat_ident() else {
            self.unexpected("a constant name after CONST");
            self.sync_to_eol();
            return None;
        };
        if !self.cursor.eat(&TokenKind::Eq) {
            self.unexpected("'=' in CONST");
            self.sync_to_eol();
            return None;
        }
        // `AS` after the initializer is the type clause, not a cast.
        self.allow_as_cast = false;
        let value = self.parse_expr();
        self.allow_as_cast = true;
        let value = value?;
        let ty = if self.cursor.eat_keyword(Keyword::As) {
            self.parse_type_name().unwrap_or_else(|| Self::sigil_type(&name))
        } else {
            Self::sigil_type(&name)
        };
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::Const { name, value, ty }, span.merge(end)))
    }

    fn parse_static(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let Some((name, _)) = self.cursor.eat_ident() else {
            self.unexpected("a variable name after STATIC");
            self.sync_to_eol();
            return None;
        };
        let ty = if self.cursor.eat_keyword(Keyword::As) {
            self.parse_type_name().unwrap_or_else(|| Self::sigil_type(&name))
        } else {
            Self::sigil_type(&name)
        };
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::Static { name, ty }, span.merge(end)))
    }

    fn parse_shared(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let mut names = Vec::new();
        loop {
            match self.cursor.eat_ident() {
                Some((name, _)) => names.push(name),
                None => {
                    self.unexpected("a variable name after SHARED");
                    break;
                }
            }
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::Shared { names }, span.merge(end)))
    }

    fn parse_swap(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let lhs = self.parse_postfix()?;
        let lhs = self.into_lvalue(lhs);
        if !self.cursor.eat(&TokenKind::Comma) {
            self.unexpected("',' in SWAP");
        }
        let rhs = self.parse_postfix()?;
        let rhs = self.into_lvalue(rhs);
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::Swap { lhs, rhs }, span.merge(end)))
    }

    // Control flow ---------------------------------------------------------

    fn parse_if(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let cond = self.parse_expr()?;
        if !self.cursor.eat_keyword(Keyword::Then) {
            self.unexpected("THEN");
            self.sync_to_eol();
            return None;
        }

        if self.cursor.at_line_end() {
            return self.parse_block_if(span, cond);
        }

        // Single-line form: IF c THEN stmts [ELSE stmts]
        let then_branch = Box::new(self.parse_inline_branch(true)?);
        let else_branch = if self.cursor.eat_keyword(Keyword::Else) {
            Some(Box::new(self.parse_inline_branch(false)?))
        } else {
            None
        };
        let end = self.cursor.previous_span();
        Some(self.stmt(
            StmtKind::If {
                cond,
                then_branch,
                elseifs: Vec::new(),
                else_branch,
            },
            span.merge(end),
        ))
    }

    /// Colon-separated statements up to end of line (or `ELSE` when
    /// `stop_at_else`). A single statement stays bare; several fold into a
    /// `StmtList`.
    fn parse_inline_branch(&mut self, stop_at_else: bool) -> Option<Stmt> {
        let line = self.line;
        let span = self.cursor.current_span();
        let mut stmts = Vec::new();
        loop {
            if self.cursor.at_line_end() {
                break;
            }
            if stop_at_else && self.cursor.at_keyword(Keyword::Else) {
                break;
            }
            if self.cursor.eat(&TokenKind::Colon) {
                continue;
            }
            match self.parse_stmt() {
                Some(stmt) => stmts.push(stmt),
                None => break,
            }
        }
        match stmts.len() {
            0 => {
                self.unexpected("a statement after THEN");
                None
            }
            1 => stmts.pop(),
            _ => Some(Stmt::new(StmtKind::StmtList(stmts), line, span)),
        }
    }

    /// Multi-line IF block: bodies run to `ELSEIF` / `ELSE` / `END IF`.
    fn parse_block_if(&mut self, span: Span, cond: Expr) -> Option<Stmt> {
        const CLAUSES: &[Term] = &[
            Term::Kw(Keyword::ElseIf),
            Term::Kw(Keyword::Else),
            Term::End(Keyword::If),
        ];
        let then_branch = Box::new(self.block_branch(CLAUSES));
        let mut elseifs = Vec::new();
        let mut else_branch = None;
        loop {
            if self.cursor.eat_keyword(Keyword::ElseIf) {
                let Some(elseif_cond) = self.parse_expr() else {
                    self.sync_to_eol();
                    continue;
                };
                if !self.cursor.eat_keyword(Keyword::Then) {
                    self.unexpected("THEN after ELSEIF");
                }
                let branch = Box::new(self.block_branch(CLAUSES));
                elseifs.push(ElseIf {
                    cond: elseif_cond,
                    then_branch: branch,
                });
                continue;
            }
            if self.cursor.eat_keyword(Keyword::Else) {
                else_branch = Some(Box::new(
                    self.block_branch(&[Term::End(Keyword::If)]),
                ));
            }
            break;
        }
        self.expect_end(Keyword::If, "END IF");
        let end = self.cursor.previous_span();
        Some(self.stmt(
            StmtKind::If {
                cond,
                then_branch,
                elseifs,
                else_branch,
            },
            span.merge(end),
        ))
    }

    /// A block-IF branch body as a single statement node.
    fn block_branch(&mut self, terms: &[Term]) -> Stmt {
        let line = self.line;
        let span = self.cursor.current_span();
        let mut body = self.parse_body(terms);
        match body.len() {
            1 => body.remove(0),
            _ => Stmt::new(StmtKind::StmtList(body), line, span),
        }
    }

    fn parse_select_case(&mut self, span: Span) -> Option<Stmt> {
        let select_span = self.cursor.current_span();
        self.cursor.advance();
        if !self.cursor.eat_keyword(Keyword::Case) {
            self.unexpected("CASE after SELECT");
        }
        let selector = self.parse_expr();

        let mut arms: Vec<CaseArm> = Vec::new();
        let mut else_body: Vec<Stmt> = Vec::new();
        let mut seen_else = false;
        const ARM_BODY: &[Term] = &[Term::Kw(Keyword::Case), Term::End(Keyword::Select)];

        loop {
            // Position at the next CASE / END SELECT.
            let _ = self.parse_body(ARM_BODY);
            if self.cursor.at_keyword(Keyword::End)
                && self.cursor.peek(1).kind.is_keyword(Keyword::Select)
            {
                self.cursor.advance();
                self.cursor.advance();
                break;
            }
            if self.cursor.at_eof() {
                self.report(
                    ErrorCode::SelectCaseMissingEndSelect,
                    select_span,
                    "SELECT CASE missing END SELECT terminator",
                );
                break;
            }
            let case_span = self.cursor.current_span();
            if !self.cursor.eat_keyword(Keyword::Case) {
                // parse_body only stops on CASE, END SELECT, or EOF.
                break;
            }

            if self.cursor.at_keyword(Keyword::Else) {
                let else_span = self.cursor.current_span();
                self.cursor.advance();
                let body = self.parse_body(ARM_BODY);
                if seen_else {
                    self.report(
                        ErrorCode::SelectCaseDuplicateElse,
                        else_span,
                        "Duplicate CASE ELSE arm",
                    );
                } else {
                    seen_else = true;
                    else_body = body;
                }
                continue;
            }

            let labels = self.parse_case_labels(case_span);
            let body = self.parse_body(ARM_BODY);
            arms.push(CaseArm { labels, body });
        }

        let end = self.cursor.previous_span();
        Some(self.stmt(
            StmtKind::SelectCase {
                selector,
                arms,
                else_body,
            },
            span.merge(end),
        ))
    }

    /// Integer labels of a `CASE` arm. An empty list and non-integer labels
    /// are diagnosed with the arm's dedicated codes.
    fn parse_case_labels(&mut self, case_span: Span) -> SmallVec<[i64; 4]> {
        let mut labels = SmallVec::new();
        if self.cursor.at_line_end() {
            self.report(
                ErrorCode::CaseEmptyLabelList,
                case_span,
                "CASE arm requires at least one label",
            );
            return labels;
        }
        loop {
            let negative = self.cursor.eat(&TokenKind::Minus);
            match self.cursor.eat_int() {
                Some((value, _)) => labels.push(if negative { -value } else { value }),
                None => {
                    let span = self.cursor.current_span();
                    self.report(
                        ErrorCode::CaseInvalidLabel,
                        span,
                        "CASE labels must be integer literals",
                    );
                    self.sync_to_eol();
                    break;
                }
            }
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        labels
    }

    fn parse_while(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let cond = self.parse_expr()?;
        let body = self.parse_body(&[Term::Kw(Keyword::Wend), Term::End(Keyword::While)]);
        if self.cursor.eat_keyword(Keyword::Wend) {
            // Classic terminator.
        } else {
            self.expect_end(Keyword::While, "WEND or END WHILE");
        }
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::While { cond, body }, span.merge(end)))
    }

    fn parse_do(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let mut test_pos = DoTestPos::Pre;
        let mut cond_kind = DoCond::None;
        let mut cond = None;
        if self.cursor.eat_keyword(Keyword::While) {
            cond_kind = DoCond::While;
            cond = self.parse_expr();
        } else if self.cursor.eat_keyword(Keyword::Until) {
            cond_kind = DoCond::Until;
            cond = self.parse_expr();
        }
        let body = self.parse_body(&[Term::Kw(Keyword::Loop)]);
        if !self.cursor.eat_keyword(Keyword::Loop) {
            self.report(
                ErrorCode::B1104,
                span,
                "DO missing LOOP terminator",
            );
        } else if cond_kind == DoCond::None {
            if self.cursor.eat_keyword(Keyword::While) {
                test_pos = DoTestPos::Post;
                cond_kind = DoCond::While;
                cond = self.parse_expr();
            } else if self.cursor.eat_keyword(Keyword::Until) {
                test_pos = DoTestPos::Post;
                cond_kind = DoCond::Until;
                cond = self.parse_expr();
            }
        }
        let end = self.cursor.previous_span();
        Some(self.stmt(
            StmtKind::Do {
                test_pos,
                cond_kind,
                cond,
                body,
            },
            span.merge(end),
        ))
    }

    fn parse_for(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let Some((var, _)) = self.cursor.eat_ident() else {
            self.unexpected("a loop variable after FOR");
            self.sync_to_eol();
            return None;
        };
        if !self.cursor.eat(&TokenKind::Eq) {
            self.unexpected("'=' in FOR");
        }
        let start = self.parse_expr()?;
        if !self.cursor.eat_keyword(Keyword::To) {
            self.unexpected("TO in FOR");
        }
        let to = self.parse_expr()?;
        let step = if self.cursor.eat_keyword(Keyword::Step) {
            self.parse_expr()
        } else {
            None
        };
        let body = self.parse_body(&[Term::Kw(Keyword::Next)]);
        if self.cursor.eat_keyword(Keyword::Next) {
            // Optional loop variable after NEXT is consumed and ignored.
            let _ = self.cursor.eat_ident();
        } else {
            self.report(ErrorCode::B1104, span, "FOR missing NEXT terminator");
        }
        let end = self.cursor.previous_span();
        Some(self.stmt(
            StmtKind::For {
                var,
                start,
                end: to,
                step,
                body,
            },
            span.merge(end),
        ))
    }

    /// A `NEXT` with no enclosing `FOR` (the loop form consumes its own).
    fn parse_next(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let var = self
            .cursor
            .eat_ident()
            .map(|(name, _)| name)
            .unwrap_or_default();
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::Next { var }, span.merge(end)))
    }

    fn parse_exit(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let kind = if self.cursor.eat_keyword(Keyword::For) {
            ExitKind::For
        } else if self.cursor.eat_keyword(Keyword::While) {
            ExitKind::While
        } else if self.cursor.eat_keyword(Keyword::Do) {
            ExitKind::Do
        } else {
            self.unexpected("FOR, WHILE, or DO after EXIT");
            ExitKind::Do
        };
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::Exit { kind }, span.merge(end)))
    }

    fn parse_goto(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let target = self.parse_jump_target("GOTO")?;
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::Goto { target }, span.merge(end)))
    }

    fn parse_gosub(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let target_line = self.parse_jump_target("GOSUB")?;
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::Gosub { target_line }, span.merge(end)))
    }

    /// Numeric label, or a named label resolved to its synthetic integer.
    fn parse_jump_target(&mut self, what: &str) -> Option<i64> {
        if let Some((value, _)) = self.cursor.eat_int() {
            return Some(value);
        }
        if let Some((name, _)) = self.cursor.eat_ident() {
            return Some(self.label_id(&name));
        }
        self.unexpected(&format!("a line number or label after {what}"));
        self.sync_to_eol();
        None
    }

    fn parse_return(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let value = if self.cursor.at_line_end()
            || matches!(self.cursor.current().kind, TokenKind::Colon)
        {
            None
        } else {
            self.parse_expr()
        };
        let is_gosub_return = value.is_none() && self.proc_depth == 0;
        let end = self.cursor.previous_span();
        Some(self.stmt(
            StmtKind::Return {
                is_gosub_return,
                value,
            },
            span.merge(end),
        ))
    }

    /// A stray `END <block-kw>` is consumed whole and parsed as `End` so
    /// the input still makes progress.
    fn parse_end(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        const BLOCK_KWS: &[Keyword] = &[
            Keyword::If,
            Keyword::Select,
            Keyword::Try,
            Keyword::While,
            Keyword::Function,
            Keyword::Sub,
            Keyword::Class,
            Keyword::Type,
            Keyword::Interface,
            Keyword::Constructor,
            Keyword::Destructor,
            Keyword::Method,
            Keyword::Property,
            Keyword::Get,
            Keyword::Set,
        ];
        if let TokenKind::Keyword(kw) = self.cursor.current().kind {
            if BLOCK_KWS.contains(&kw) {
                self.cursor.advance();
            }
        }
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::End, span.merge(end)))
    }

    // Error handling -------------------------------------------------------

    fn parse_on_error(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        if !self.cursor.eat_keyword(Keyword::Error) {
            self.unexpected("ERROR after ON");
            self.sync_to_eol();
            return None;
        }
        if !self.cursor.eat_keyword(Keyword::Goto) {
            self.unexpected("GOTO after ON ERROR");
            self.sync_to_eol();
            return None;
        }
        let target = self.parse_jump_target("ON ERROR GOTO")?;
        let end = self.cursor.previous_span();
        Some(self.stmt(
            StmtKind::OnErrorGoto {
                target,
                to_zero: target == 0,
            },
            span.merge(end),
        ))
    }

    fn parse_resume(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let (mode, target) = if self.cursor.eat_keyword(Keyword::Next) {
            (ResumeMode::Next, 0)
        } else if self.cursor.at_line_end()
            || matches!(self.cursor.current().kind, TokenKind::Colon)
        {
            (ResumeMode::Same, 0)
        } else {
            let target = self.parse_jump_target("RESUME")?;
            (ResumeMode::Label, target)
        };
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::Resume { mode, target }, span.merge(end)))
    }

    fn parse_try(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        const TRY_BODY: &[Term] = &[Term::Kw(Keyword::Catch), Term::End(Keyword::Try)];
        let try_body = self.parse_body(TRY_BODY);

        let mut catch_var = None;
        let mut catch_body = Vec::new();
        if self.cursor.eat_keyword(Keyword::Catch) {
            if let Some((name, _)) = self.cursor.eat_ident() {
                catch_var = Some(name);
            }
            catch_body = self.parse_body(&[Term::End(Keyword::Try)]);
        } else {
            self.report(ErrorCode::B1104, span, "TRY block has no CATCH clause");
        }

        if self.cursor.at_keyword(Keyword::End)
            && self.cursor.peek(1).kind.is_keyword(Keyword::Try)
        {
            self.cursor.advance();
            self.cursor.advance();
        } else {
            self.report(ErrorCode::B1104, span, "TRY missing END TRY terminator");
        }
        let end = self.cursor.previous_span();
        Some(self.stmt(
            StmtKind::TryCatch {
                try_body,
                catch_var,
                catch_body,
            },
            span.merge(end),
        ))
    }

    // Terminal / console ---------------------------------------------------

    fn parse_color(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let fg = if self.cursor.at_line_end()
            || matches!(self.cursor.current().kind, TokenKind::Comma)
        {
            None
        } else {
            self.parse_expr()
        };
        let bg = if self.cursor.eat(&TokenKind::Comma) {
            self.parse_expr()
        } else {
            None
        };
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::Color { fg, bg }, span.merge(end)))
    }

    fn parse_locate(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let row = if self.cursor.at_line_end()
            || matches!(self.cursor.current().kind, TokenKind::Comma)
        {
            None
        } else {
            self.parse_expr()
        };
        let col = if self.cursor.eat(&TokenKind::Comma) {
            self.parse_expr()
        } else {
            None
        };
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::Locate { row, col }, span.merge(end)))
    }

    fn parse_sleep(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let ms = if self.cursor.at_line_end() {
            None
        } else {
            self.parse_expr()
        };
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::Sleep { ms }, span.merge(end)))
    }

    fn parse_cursor(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let visible = self.parse_on_off("CURSOR")?;
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::Cursor { visible }, span.merge(end)))
    }

    fn parse_altscreen(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let enabled = self.parse_on_off("ALTSCREEN")?;
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::AltScreen { enabled }, span.merge(end)))
    }

    fn parse_on_off(&mut self, what: &str) -> Option<bool> {
        if self.cursor.eat_keyword(Keyword::On) {
            return Some(true);
        }
        if self.cursor.at_ident_ci("OFF") {
            self.cursor.advance();
            return Some(false);
        }
        self.unexpected(&format!("ON or OFF after {what}"));
        self.sync_to_eol();
        None
    }

    fn parse_randomize(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let seed = self.parse_expr()?;
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::Randomize { seed }, span.merge(end)))
    }

    fn parse_delete(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let target = self.parse_postfix()?;
        let end = self.cursor.previous_span();
        Some(self.stmt(StmtKind::Delete { target }, span.merge(end)))
    }
}
