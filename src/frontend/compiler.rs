// This module implements the single-pass compiler for Bulan: a recursive-descent parser that
// emits IR instructions directly while it reads tokens, without building a syntax tree. Each
// function gets a flat variable scope (parameters and `var` locals) that is
// searched linearly by name and cleared when the next function starts. Expressions are a
// flat left-to-right chain of binary operators folded into one temporary local. `if` chains
// and `while` loops are lowered to LABEL/BRANCH/JMP sequences using per-function labels.
// String literals are appended, NUL terminated, to a program-wide static data blob that is
// handed to the backend after the last function. Functions are generated as soon as they
// are parsed, so a failure later in the file still leaves the earlier output in place.

//! Parser, IR builder and program driver.

use super::lexer::Lexer;
use super::token::{Token, TokenKind, TokenValue};
use crate::codegen::Backend;
use crate::core::{CompilationSession, CompileError, CompileResult, Loc};
use crate::ir::{Arg, Function, Inst, InstKind, Program};

/// A local visible in the function being compiled.
#[derive(Debug, Clone, Copy)]
struct Var<'a> {
    name: &'a str,
    index: usize,
}

/// Compiles one source file into IR and drives a [`Backend`] over it.
pub struct Compiler<'s, 'a> {
    session: &'s CompilationSession<'a>,
    lexer: Lexer<'s>,
    /// The most recently consumed token.
    token: Token,
    /// Scope of the function being compiled.
    vars: Vec<Var<'a>>,
    /// Top-level `extern`s waiting for the next function.
    pending_externs: Vec<(Loc, &'a str)>,
    static_data: Vec<u8>,
    functions: Vec<Function<'a>>,
}

fn binop_kind(kind: TokenKind) -> Option<InstKind> {
    match kind {
        TokenKind::Plus => Some(InstKind::Add),
        TokenKind::Minus => Some(InstKind::Sub),
        TokenKind::Less => Some(InstKind::Lt),
        TokenKind::LessEq => Some(InstKind::Le),
        TokenKind::Greater => Some(InstKind::Gt),
        TokenKind::GreaterEq => Some(InstKind::Ge),
        TokenKind::EqEq => Some(InstKind::Eq),
        TokenKind::NotEq => Some(InstKind::Ne),
        _ => None,
    }
}

impl<'s, 'a> Compiler<'s, 'a> {
    pub fn new(session: &'s CompilationSession<'a>, lexer: Lexer<'s>) -> Self {
        let token = Token::new(TokenKind::Eof, TokenValue::None, lexer.loc());
        Self {
            session,
            lexer,
            token,
            vars: Vec::new(),
            pending_externs: Vec::new(),
            static_data: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn into_program(self) -> Program<'a> {
        Program {
            functions: self.functions,
            static_data: self.static_data,
        }
    }

    /// Consume the next token. Lexical errors surface here.
    fn advance(&mut self) -> CompileResult<()> {
        let token = self.lexer.next_token();
        if token.kind == TokenKind::ParseError {
            let loc = token.loc.clone();
            return Err(token.into_error().unwrap_or(CompileError::Lex {
                loc,
                message: "invalid token".to_string(),
                literal_start: None,
            }));
        }
        self.token = token;
        Ok(())
    }

    /// Kind of the next token without consuming it.
    fn peek_kind(&mut self) -> TokenKind {
        let point = self.lexer.save();
        let kind = self.lexer.next_token().kind;
        self.lexer.restore(point);
        kind
    }

    fn expect(&self, kind: TokenKind) -> CompileResult<()> {
        if self.token.kind != kind {
            return Err(self.unexpected(kind.display()));
        }
        Ok(())
    }

    fn advance_expect(&mut self, kind: TokenKind) -> CompileResult<()> {
        self.advance()?;
        self.expect(kind)
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        CompileError::UnexpectedToken {
            loc: self.token.loc.clone(),
            expected: expected.to_string(),
            found: self.token.kind,
        }
    }

    /// Name carried by the current identifier token, interned.
    fn ident(&self) -> &'a str {
        self.session.intern_str(self.token.ident().unwrap_or_default())
    }

    fn find_var(&self, name: &str) -> Option<&Var<'a>> {
        self.vars.iter().find(|var| var.name == name)
    }

    fn resolve_local(&self, name: &str, loc: &Loc) -> CompileResult<usize> {
        self.find_var(name)
            .map(|var| var.index)
            .ok_or_else(|| CompileError::UnknownIdentifier {
                loc: loc.clone(),
                name: name.to_string(),
            })
    }

    /// Bind a fresh local slot to `name`, rejecting duplicates.
    fn declare_local(&mut self, func: &mut Function<'a>, name: &'a str, loc: &Loc) -> CompileResult<usize> {
        if self.find_var(name).is_some() {
            return Err(CompileError::DuplicateLocal {
                loc: loc.clone(),
                name: name.to_string(),
            });
        }
        let index = func.alloc_local();
        self.vars.push(Var { name, index });
        Ok(index)
    }

    fn compile_primary(&mut self) -> CompileResult<Arg<'a>> {
        self.advance()?;
        match self.token.kind {
            TokenKind::Int | TokenKind::Char => Ok(Arg::Int(self.token.int().unwrap_or_default())),
            TokenKind::Str => {
                let offset = self.static_data.len();
                let bytes = self.token.bytes().unwrap_or_default();
                self.static_data.extend_from_slice(bytes);
                self.static_data.push(0);
                self.session.record_static_data(bytes.len() + 1);
                Ok(Arg::Static(offset))
            }
            TokenKind::Id => {
                let name = self.token.ident().unwrap_or_default();
                let local = self.resolve_local(name, &self.token.loc)?;
                Ok(Arg::Local(local))
            }
            found => Err(CompileError::InvalidExpression {
                loc: self.token.loc.clone(),
                found,
            }),
        }
    }

    /// `primary (op primary)*`, all operators at one precedence, folded left to
    /// right into a single temporary.
    fn compile_expression(&mut self, func: &mut Function<'a>) -> CompileResult<Arg<'a>> {
        let mut lhs = self.compile_primary()?;
        let Some(mut kind) = binop_kind(self.peek_kind()) else {
            return Ok(lhs);
        };

        let result = Arg::Local(func.alloc_local());
        loop {
            self.advance()?;
            let loc = self.token.loc.clone();
            let rhs = self.compile_primary()?;
            func.push_inst(Inst::new(kind, loc, [result.clone(), lhs, rhs]));
            lhs = result.clone();

            match binop_kind(self.peek_kind()) {
                Some(next) => kind = next,
                None => return Ok(result),
            }
        }
    }

    /// `( expr )` after `if` or `while`.
    fn compile_condition(&mut self, func: &mut Function<'a>) -> CompileResult<Arg<'a>> {
        self.advance_expect(TokenKind::OParen)?;
        let cond = self.compile_expression(func)?;
        self.advance_expect(TokenKind::CParen)?;
        Ok(cond)
    }

    /// Statements up to the closing `}`. The opening `{` is the current token.
    fn compile_block(&mut self, func: &mut Function<'a>) -> CompileResult<()> {
        loop {
            self.advance()?;
            match self.token.kind {
                TokenKind::CCurly => return Ok(()),
                TokenKind::Eof => return Err(self.unexpected(TokenKind::CCurly.display())),
                _ => self.compile_statement(func)?,
            }
        }
    }

    fn compile_statement(&mut self, func: &mut Function<'a>) -> CompileResult<()> {
        let loc = self.token.loc.clone();
        match self.token.kind {
            TokenKind::If => self.compile_if(func, loc),
            TokenKind::While => self.compile_while(func, loc),
            TokenKind::Id => {
                let name = self.ident();
                self.advance()?;
                match self.token.kind {
                    TokenKind::Eq => {
                        let dest = self.resolve_local(name, &loc)?;
                        let value = self.compile_expression(func)?;
                        func.push_inst(Inst::new(
                            InstKind::LocalAssign,
                            loc,
                            [Arg::Local(dest), value, Arg::None],
                        ));
                    }
                    TokenKind::OParen => {
                        let args = self.compile_call_args(func)?;
                        func.push_inst(Inst::new(
                            InstKind::Funcall,
                            loc,
                            [Arg::Name(name), Arg::list(args), Arg::None],
                        ));
                    }
                    found => {
                        return Err(CompileError::InvalidFollowUp {
                            loc,
                            name: name.to_string(),
                            found,
                        })
                    }
                }
                self.advance_expect(TokenKind::Semicolon)
            }
            TokenKind::Extern => {
                self.advance_expect(TokenKind::Id)?;
                let name = self.ident();
                // Externs are called by name and never enter the scope.
                func.push_inst(Inst::extern_decl(loc, name));
                self.advance_expect(TokenKind::Semicolon)
            }
            TokenKind::Var => {
                self.advance_expect(TokenKind::Id)?;
                let name = self.ident();
                let id_loc = self.token.loc.clone();
                let local = self.declare_local(func, name, &id_loc)?;
                func.push_inst(Inst::new(
                    InstKind::LocalInit,
                    loc,
                    [Arg::Local(local), Arg::None, Arg::None],
                ));
                self.advance_expect(TokenKind::Semicolon)
            }
            found => Err(CompileError::InvalidStatement { loc, found }),
        }
    }

    /// Arguments after `(` up to and including `)`.
    fn compile_call_args(&mut self, func: &mut Function<'a>) -> CompileResult<Vec<Arg<'a>>> {
        let mut args = Vec::new();
        if self.peek_kind() == TokenKind::CParen {
            self.advance()?;
            return Ok(args);
        }
        loop {
            args.push(self.compile_expression(func)?);
            self.advance()?;
            match self.token.kind {
                TokenKind::CParen => return Ok(args),
                TokenKind::Comma => {}
                _ => {
                    let expected = format!("{} or {}", TokenKind::Comma, TokenKind::CParen);
                    return Err(self.unexpected(&expected));
                }
            }
        }
    }

    fn compile_if(&mut self, func: &mut Function<'a>, loc: Loc) -> CompileResult<()> {
        let cond = self.compile_condition(func)?;
        let then_label = func.alloc_label();
        let mut next_label = func.alloc_label();
        func.push_inst(Inst::branch(loc.clone(), then_label, next_label, cond));
        self.advance_expect(TokenKind::OCurly)?;
        func.push_inst(Inst::label(loc.clone(), then_label));
        self.compile_block(func)?;

        if self.peek_kind() != TokenKind::Else {
            // Single fallthrough point whether or not the branch was taken.
            func.push_inst(Inst::jmp(loc.clone(), next_label));
            func.push_inst(Inst::label(loc, next_label));
            return Ok(());
        }

        let end_label = func.alloc_label();
        func.push_inst(Inst::jmp(loc.clone(), end_label));
        while self.peek_kind() == TokenKind::Else {
            self.advance()?;
            func.push_inst(Inst::label(loc.clone(), next_label));
            self.advance()?;
            if self.token.kind != TokenKind::If {
                self.expect(TokenKind::OCurly)?;
                self.compile_block(func)?;
                func.push_inst(Inst::jmp(loc.clone(), end_label));
                func.push_inst(Inst::label(loc, end_label));
                return Ok(());
            }

            let cond = self.compile_condition(func)?;
            let then_label = func.alloc_label();
            next_label = func.alloc_label();
            func.push_inst(Inst::branch(loc.clone(), then_label, next_label, cond));
            self.advance_expect(TokenKind::OCurly)?;
            func.push_inst(Inst::label(loc.clone(), then_label));
            self.compile_block(func)?;
            func.push_inst(Inst::jmp(loc.clone(), end_label));
        }

        // The last condition's false edge lands here.
        func.push_inst(Inst::label(loc.clone(), next_label));
        func.push_inst(Inst::label(loc, end_label));
        Ok(())
    }

    fn compile_while(&mut self, func: &mut Function<'a>, loc: Loc) -> CompileResult<()> {
        let start_label = func.alloc_label();
        let body_label = func.alloc_label();
        let end_label = func.alloc_label();

        func.push_inst(Inst::label(loc.clone(), start_label));
        let cond = self.compile_condition(func)?;
        func.push_inst(Inst::branch(loc.clone(), body_label, end_label, cond));
        self.advance_expect(TokenKind::OCurly)?;
        func.push_inst(Inst::label(loc.clone(), body_label));
        self.compile_block(func)?;
        func.push_inst(Inst::jmp(loc.clone(), start_label));
        func.push_inst(Inst::label(loc, end_label));
        Ok(())
    }

    /// `function name() [: a, b] { ... }` with `function` as the current token.
    pub fn compile_function(&mut self) -> CompileResult<Function<'a>> {
        let mut func = Function::new("", self.token.loc.clone());
        self.compile_function_into(&mut func)?;
        log::debug!(
            "compiled function `{}`: {} instructions, {} locals, {} labels",
            func.name,
            func.insts.len(),
            func.locals_count,
            func.labels_count
        );
        Ok(func)
    }

    /// Parse into `func`, leaving whatever was emitted before an error in place.
    fn compile_function_into(&mut self, func: &mut Function<'a>) -> CompileResult<()> {
        self.vars.clear();
        self.expect(TokenKind::Function)?;
        self.advance_expect(TokenKind::Id)?;
        func.name = self.ident();
        func.loc = self.token.loc.clone();
        self.advance_expect(TokenKind::OParen)?;
        self.advance_expect(TokenKind::CParen)?;

        self.advance()?;
        if self.token.kind == TokenKind::Colon {
            loop {
                self.advance_expect(TokenKind::Id)?;
                let name = self.ident();
                let loc = self.token.loc.clone();
                self.declare_local(func, name, &loc)?;
                func.params_count += 1;

                self.advance()?;
                if self.token.kind != TokenKind::Comma {
                    break;
                }
            }
        }
        self.expect(TokenKind::OCurly)?;

        for (loc, name) in std::mem::take(&mut self.pending_externs) {
            func.push_inst(Inst::extern_decl(loc, name));
        }
        self.compile_block(func)
    }

    /// `extern name;` outside of any function.
    fn compile_top_level_extern(&mut self) -> CompileResult<()> {
        let loc = self.token.loc.clone();
        self.advance_expect(TokenKind::Id)?;
        let name = self.ident();
        self.pending_externs.push((loc, name));
        self.advance_expect(TokenKind::Semicolon)
    }

    /// Compile the whole input, generating each function as soon as it is
    /// parsed. On error the output holds everything generated before it.
    pub fn compile_program(&mut self, backend: &mut dyn Backend, out: &mut String) -> CompileResult<()> {
        backend.program_prolog(out);
        loop {
            self.advance()?;
            match self.token.kind {
                TokenKind::Eof => break,
                TokenKind::Extern => self.compile_top_level_extern()?,
                _ => {
                    let func = self.compile_function()?;
                    self.session.record_function(&func);
                    backend.function(out, &func)?;
                    self.functions.push(func);
                }
            }
        }

        for (loc, name) in self.pending_externs.drain(..) {
            log::warn!("{loc}: extern `{name}` is not followed by any function and is ignored");
        }

        backend.static_data(out, &self.static_data);
        backend.program_epilog(out);
        Ok(())
    }
}
