//! Declaration productions: procedures, classes, types, interfaces.

use basic_ir::{
    Access, ClassDecl, ClassField, ConstructorDecl, DeclType, DestructorDecl, Field, FunctionDecl,
    InterfaceDecl, MethodDecl, Param, PropertyDecl, PropertyGetter, PropertySetter, Span, Stmt,
    StmtKind, SubDecl, TypeDecl,
};
use basic_lexer::{Keyword, TokenKind};

use super::Term;
use crate::Parser;

impl<'a> Parser<'a> {
    fn mk(&self, kind: StmtKind, span: Span) -> Stmt {
        Stmt::new(kind, self.line, span)
    }

    /// `( name[()] {, name[()]} )` parameter list. Array parameters are
    /// registered so their subscripted uses parse as array accesses.
    fn parse_params(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        if !self.cursor.eat(&TokenKind::LParen) {
            self.unexpected("'(' before the parameter list");
            return params;
        }
        if self.cursor.eat(&TokenKind::RParen) {
            return params;
        }
        loop {
            match self.cursor.eat_ident() {
                Some((name, _)) => {
                    let mut is_array = false;
                    if self.cursor.eat(&TokenKind::LParen) {
                        if !self.cursor.eat(&TokenKind::RParen) {
                            self.unexpected("')' in array parameter");
                        }
                        is_array = true;
                        self.known_arrays.insert(name.clone());
                    }
                    params.push(Param { name, is_array });
                }
                None => {
                    self.unexpected("a parameter name");
                    self.sync_to_eol();
                    return params;
                }
            }
            if self.cursor.eat(&TokenKind::Comma) {
                continue;
            }
            if !self.cursor.eat(&TokenKind::RParen) {
                self.unexpected("')' after the parameter list");
            }
            return params;
        }
    }

    /// Explicit return annotation (`AS DOUBLE`), kept verbatim for dumps.
    fn parse_explicit_ret(&mut self) -> DeclType {
        if !self.cursor.eat_keyword(Keyword::As) {
            return DeclType::Unknown;
        }
        let decl = if self.cursor.at_ident_ci("INTEGER") || self.cursor.at_ident_ci("LONG") {
            DeclType::I64
        } else if self.cursor.at_ident_ci("SINGLE") || self.cursor.at_ident_ci("DOUBLE") {
            DeclType::F64
        } else if self.cursor.at_ident_ci("STRING") {
            DeclType::Str
        } else if self.cursor.at_ident_ci("BOOLEAN") {
            DeclType::Bool
        } else {
            self.unexpected("a type name after AS");
            return DeclType::Unknown;
        };
        self.cursor.advance();
        decl
    }

    pub(super) fn parse_function(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let Some((name, _)) = self.cursor.eat_ident() else {
            self.unexpected("a function name");
            self.sync_to_eol();
            return None;
        };
        let params = self.parse_params();
        let explicit_ret = self.parse_explicit_ret();
        let ret = explicit_ret
            .resolve()
            .unwrap_or_else(|| Self::sigil_type(&name));

        self.proc_depth += 1;
        let body = self.parse_body(&[Term::End(Keyword::Function)]);
        self.proc_depth -= 1;
        self.expect_end(Keyword::Function, "END FUNCTION");

        let end = self.cursor.previous_span();
        Some(self.mk(
            StmtKind::Function(FunctionDecl {
                name,
                qualified_name: None,
                params,
                ret,
                explicit_ret,
                body,
            }),
            span.merge(end),
        ))
    }

    pub(super) fn parse_sub(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let Some((name, _)) = self.cursor.eat_ident() else {
            self.unexpected("a subroutine name");
            self.sync_to_eol();
            return None;
        };
        let params = self.parse_params();

        self.proc_depth += 1;
        let body = self.parse_body(&[Term::End(Keyword::Sub)]);
        self.proc_depth -= 1;
        self.expect_end(Keyword::Sub, "END SUB");

        let end = self.cursor.previous_span();
        Some(self.mk(
            StmtKind::Sub(SubDecl {
                name,
                qualified_name: None,
                params,
                body,
            }),
            span.merge(end),
        ))
    }

    pub(super) fn parse_class(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let Some((name, _)) = self.cursor.eat_ident() else {
            self.unexpected("a class name");
            self.sync_to_eol();
            return None;
        };
        let mut implements = Vec::new();
        if self.cursor.eat_keyword(Keyword::Implements) {
            loop {
                let path = self.parse_dotted_name("an interface name");
                if path.is_empty() {
                    break;
                }
                implements.push(path);
                if !self.cursor.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }

        self.proc_depth += 1;
        let raw_members = self.parse_body(&[Term::End(Keyword::Class)]);
        self.proc_depth -= 1;
        self.expect_end(Keyword::Class, "END CLASS");

        // DIM/STATIC inside the class body declare fields; everything else
        // is a member.
        let mut fields = Vec::new();
        let mut members = Vec::new();
        for stmt in raw_members {
            match stmt.kind {
                StmtKind::Dim {
                    name,
                    is_array: false,
                    ty,
                    ..
                } => fields.push(ClassField {
                    name,
                    ty,
                    is_static: false,
                }),
                StmtKind::Static { name, ty } => fields.push(ClassField {
                    name,
                    ty,
                    is_static: true,
                }),
                _ => members.push(stmt),
            }
        }

        let end = self.cursor.previous_span();
        Some(self.mk(
            StmtKind::Class(ClassDecl {
                name,
                qualified_name: None,
                fields,
                implements,
                members,
            }),
            span.merge(end),
        ))
    }

    pub(super) fn parse_constructor(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let is_static = self.eat_static();
        let params = if matches!(self.cursor.current().kind, TokenKind::LParen) {
            self.parse_params()
        } else {
            Vec::new()
        };
        let body = self.parse_body(&[Term::End(Keyword::Constructor)]);
        self.expect_end(Keyword::Constructor, "END CONSTRUCTOR");
        let end = self.cursor.previous_span();
        Some(self.mk(
            StmtKind::Constructor(ConstructorDecl {
                is_static,
                params,
                body,
            }),
            span.merge(end),
        ))
    }

    pub(super) fn parse_destructor(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let body = self.parse_body(&[Term::End(Keyword::Destructor)]);
        self.expect_end(Keyword::Destructor, "END DESTRUCTOR");
        let end = self.cursor.previous_span();
        Some(self.mk(StmtKind::Destructor(DestructorDecl { body }), span.merge(end)))
    }

    pub(super) fn parse_method(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let is_static = self.eat_static();
        let Some((name, _)) = self.cursor.eat_ident() else {
            self.unexpected("a method name");
            self.sync_to_eol();
            return None;
        };
        let params = self.parse_params();
        let ret = if self.cursor.at_keyword(Keyword::As) {
            self.cursor.advance();
            self.parse_type_name()
        } else {
            None
        };
        let body = self.parse_body(&[Term::End(Keyword::Method)]);
        self.expect_end(Keyword::Method, "END METHOD");
        let end = self.cursor.previous_span();
        Some(self.mk(
            StmtKind::Method(MethodDecl {
                is_static,
                name,
                ret,
                params,
                body,
            }),
            span.merge(end),
        ))
    }

    pub(super) fn parse_property(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let is_static = self.eat_static();
        let Some((name, _)) = self.cursor.eat_ident() else {
            self.unexpected("a property name");
            self.sync_to_eol();
            return None;
        };
        let ty = if self.cursor.eat_keyword(Keyword::As) {
            self.parse_type_name().unwrap_or_else(|| Self::sigil_type(&name))
        } else {
            Self::sigil_type(&name)
        };

        let mut get = None;
        let mut set = None;
        loop {
            self.skip_to_content();
            if self.cursor.at_eof() || self.at_terminator(&[Term::End(Keyword::Property)]) {
                break;
            }
            let access = if self.cursor.eat_keyword(Keyword::Public) {
                Access::Public
            } else if self.cursor.eat_keyword(Keyword::Private) {
                Access::Private
            } else {
                Access::Public
            };
            if self.cursor.eat_keyword(Keyword::Get) {
                let body = self.parse_body(&[Term::End(Keyword::Get)]);
                self.expect_end(Keyword::Get, "END GET");
                get = Some(PropertyGetter { access, body });
            } else if self.cursor.eat_keyword(Keyword::Set) {
                let param_name = if self.cursor.eat(&TokenKind::LParen) {
                    let name = self
                        .cursor
                        .eat_ident()
                        .map(|(n, _)| n)
                        .unwrap_or_default();
                    if !self.cursor.eat(&TokenKind::RParen) {
                        self.unexpected("')' after the SET parameter");
                    }
                    name
                } else {
                    String::new()
                };
                let body = self.parse_body(&[Term::End(Keyword::Set)]);
                self.expect_end(Keyword::Set, "END SET");
                set = Some(PropertySetter {
                    access,
                    param_name,
                    body,
                });
            } else {
                self.unexpected("GET or SET in PROPERTY");
                self.sync_to_eol();
            }
        }
        self.expect_end(Keyword::Property, "END PROPERTY");

        let end = self.cursor.previous_span();
        Some(self.mk(
            StmtKind::Property(PropertyDecl {
                is_static,
                name,
                ty,
                access: Access::Public,
                get,
                set,
            }),
            span.merge(end),
        ))
    }

    pub(super) fn parse_type_decl(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let Some((name, _)) = self.cursor.eat_ident() else {
            self.unexpected("a type name after TYPE");
            self.sync_to_eol();
            return None;
        };
        let mut fields = Vec::new();
        loop {
            self.skip_to_content();
            if self.cursor.at_eof() || self.at_terminator(&[Term::End(Keyword::Type)]) {
                break;
            }
            let Some((field_name, _)) = self.cursor.eat_ident() else {
                self.unexpected("a field name");
                self.sync_to_eol();
                continue;
            };
            let ty = if self.cursor.eat_keyword(Keyword::As) {
                self.parse_type_name()
                    .unwrap_or_else(|| Self::sigil_type(&field_name))
            } else {
                Self::sigil_type(&field_name)
            };
            fields.push(Field {
                name: field_name,
                ty,
            });
        }
        self.expect_end(Keyword::Type, "END TYPE");
        let end = self.cursor.previous_span();
        Some(self.mk(StmtKind::TypeDecl(TypeDecl { name, fields }), span.merge(end)))
    }

    pub(super) fn parse_interface(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let qualified_name = self.parse_dotted_name("an interface name");
        let mut members = Vec::new();
        loop {
            self.skip_to_content();
            if self.cursor.at_eof() || self.at_terminator(&[Term::End(Keyword::Interface)]) {
                break;
            }
            let member_span = self.cursor.current_span();
            if !self.cursor.eat_keyword(Keyword::Method) {
                self.unexpected("METHOD in INTERFACE");
                self.sync_to_eol();
                continue;
            }
            let Some((name, _)) = self.cursor.eat_ident() else {
                self.unexpected("a method name");
                self.sync_to_eol();
                continue;
            };
            let params = self.parse_params();
            let ret = if self.cursor.at_keyword(Keyword::As) {
                self.cursor.advance();
                self.parse_type_name()
            } else {
                None
            };
            let end = self.cursor.previous_span();
            members.push(Stmt::new(
                StmtKind::Method(MethodDecl {
                    is_static: false,
                    name,
                    ret,
                    params,
                    body: Vec::new(),
                }),
                self.line,
                member_span.merge(end),
            ));
        }
        self.expect_end(Keyword::Interface, "END INTERFACE");
        let end = self.cursor.previous_span();
        Some(self.mk(
            StmtKind::Interface(InterfaceDecl {
                qualified_name,
                members,
            }),
            span.merge(end),
        ))
    }

    pub(super) fn parse_using(&mut self, span: Span) -> Option<Stmt> {
        self.cursor.advance();
        let mut alias = None;
        if let TokenKind::Ident(_) = self.cursor.current().kind {
            if matches!(self.cursor.peek(1).kind, TokenKind::Eq) {
                if let Some((name, _)) = self.cursor.eat_ident() {
                    alias = Some(name);
                }
                self.cursor.advance();
            }
        }
        let path = self.parse_dotted_name("a namespace path after USING");
        let end = self.cursor.previous_span();
        Some(self.mk(StmtKind::Using { alias, path }, span.merge(end)))
    }

    /// `STATIC` marker on class members.
    fn eat_static(&mut self) -> bool {
        self.cursor.eat_keyword(Keyword::Static)
    }

    /// Skip end-of-line tokens and leading line numbers inside
    /// member-declaration bodies (TYPE fields, PROPERTY accessors).
    fn skip_to_content(&mut self) {
        loop {
            if matches!(self.cursor.current().kind, TokenKind::Eol) {
                self.cursor.advance();
                continue;
            }
            // A leading integer on a member line is its line number.
            if let TokenKind::Int(value) = self.cursor.current().kind {
                self.line = value;
                self.cursor.advance();
                continue;
            }
            break;
        }
    }
}
