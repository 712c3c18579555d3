//! Recursive-descent PIR recognizer.
//!
//! The parser drives a [`Builder`] directly: every recognized construct is
//! handed to the matching builder action and no syntax tree is kept. All
//! decisions need at most [`crate::parser::MAX_LOOKAHEAD`] tokens of
//! lookahead.

use crate::ir::{
    ArgFlags, Argument, BinaryOp, Builder, CallKind, CompilationUnit, ConstValue, Constant,
    Diagnostic, Expression, Fatal, Invocation, Key, PmcObject, Polarity, RelOp, SubFlags, Target,
    TargetFlags, UnaryOp, ValueType,
};
use crate::lexer::{Directive, FlagKind, Keyword, OperatorKind, RegisterClass, Token, TokenKind};
use crate::parser::error::ParseError;
use crate::parser::recovery::{resynchronize, ParseFailure, ParseResult};
use crate::parser::token_stream::TokenStream;

/// Multi-line call block being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Call,
    Return,
    Yield,
}

impl Block {
    fn set_directive(self) -> Directive {
        match self {
            Self::Call => Directive::SetArg,
            Self::Return => Directive::SetReturn,
            Self::Yield => Directive::SetYield,
        }
    }

    fn end_directive(self) -> Directive {
        match self {
            Self::Call => Directive::EndCall,
            Self::Return => Directive::EndReturn,
            Self::Yield => Directive::EndYield,
        }
    }
}

/// Flags collected after a parameter or result target.
#[derive(Debug, Default)]
struct TargetAnnotations {
    flags: TargetFlags,
    alias: Option<String>,
    invocant: Option<String>,
}

/// PIR parser feeding a [`Builder`].
pub struct Parser<'a> {
    tokens: TokenStream<'a>,
    builder: Builder,
}

impl<'a> Parser<'a> {
    /// Creates a parser over `tokens` that reports into `builder`.
    pub fn new(tokens: TokenStream<'a>, builder: Builder) -> Self {
        Self { tokens, builder }
    }

    /// Returns the builder collecting the unit.
    pub fn builder(&self) -> &Builder {
        &self.builder
    }

    /// Consumes the parser, returning the unit and all diagnostics.
    pub fn finish(self) -> (CompilationUnit, Vec<Diagnostic>) {
        self.builder.finish()
    }

    /// Parses the whole input.
    ///
    /// Syntax errors are reported through the builder and parsing resumes at
    /// the next line; only a [`Fatal`] condition stops early.
    pub fn parse_unit(&mut self) -> Result<(), Fatal> {
        loop {
            match self.parse_chunk() {
                Ok(true) => {}
                Ok(false) => return Ok(()),
                Err(failure) => self.recover(failure)?,
            }
        }
    }

    // -----------------------------------------------------------------------
    // Top level
    // -----------------------------------------------------------------------

    /// Parses one top-level item. Returns `false` at end of input.
    fn parse_chunk(&mut self) -> ParseResult<bool> {
        self.skip_newlines()?;
        let Some((kind, line)) = self.peek_info(0)? else {
            return Ok(false);
        };
        self.builder.begin_statement(line);
        match kind {
            TokenKind::Directive(Directive::Sub) => self.parse_sub()?,
            TokenKind::Directive(Directive::Const) => self.parse_const_decl(false)?,
            TokenKind::Directive(Directive::GlobalConst) => self.parse_const_decl(true)?,
            TokenKind::Directive(Directive::Namespace) => self.parse_namespace()?,
            TokenKind::Directive(Directive::Hll) => {
                self.advance()?;
                let name = self.expect_string()?;
                self.end_of_line()?;
                self.builder.set_hll(&name);
            }
            TokenKind::Directive(Directive::HllMap) => {
                self.advance()?;
                let core = self.expect_string()?;
                self.expect_operator(OperatorKind::Assign)?;
                let hll = self.expect_string()?;
                self.end_of_line()?;
                self.builder.set_hll_map(&core, &hll);
            }
            TokenKind::Directive(Directive::Loadlib) => {
                self.advance()?;
                let library = self.expect_string()?;
                self.end_of_line()?;
                self.builder.load_library(&library);
            }
            _ => {
                return Err(self.unexpected(&[
                    ".sub",
                    ".const",
                    ".namespace",
                    ".HLL",
                    ".HLL_map",
                    ".loadlib",
                ]));
            }
        }
        Ok(true)
    }

    /// `.namespace [ "a" ; "b" ]` or a bare `.namespace` for the root.
    fn parse_namespace(&mut self) -> ParseResult<()> {
        self.advance()?;
        let mut entries = Vec::new();
        if self.eat_operator(OperatorKind::LeftBracket)? {
            if !self.at_operator(0, OperatorKind::RightBracket)? {
                loop {
                    entries.push(Expression::Constant(Constant::string(self.expect_string()?)));
                    if !self.eat_operator(OperatorKind::Semicolon)? {
                        break;
                    }
                }
            }
            self.expect_operator(OperatorKind::RightBracket)?;
        }
        self.end_of_line()?;
        self.builder.set_namespace(Key::from_entries(entries));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Subroutines
    // -----------------------------------------------------------------------

    fn parse_sub(&mut self) -> ParseResult<()> {
        self.advance()?;
        match self.parse_sub_name() {
            Ok(name) => {
                self.builder.open_sub(&name);
                if let Err(failure) = self.parse_sub_flags().and_then(|()| self.end_of_line()) {
                    self.recover(failure)?;
                }
            }
            Err(failure) => {
                self.recover(failure)?;
                self.builder.open_sub("");
            }
        }
        self.parse_sub_body()?;
        Ok(())
    }

    fn parse_sub_name(&mut self) -> ParseResult<String> {
        match self.peek_info(0)? {
            Some((TokenKind::StringConst, _)) => self.expect_string(),
            Some((TokenKind::Identifier | TokenKind::Keyword(_), _)) => {
                Ok(self.advance()?.lexeme)
            }
            _ => Err(self.unexpected(&["subroutine name"])),
        }
    }

    fn parse_sub_flags(&mut self) -> ParseResult<()> {
        while let Some((TokenKind::Flag(flag), _)) = self.peek_info(0)? {
            let token = self.advance()?;
            match flag {
                FlagKind::Anon => self.builder.set_sub_flag(SubFlags::ANON),
                FlagKind::Init => self.builder.set_sub_flag(SubFlags::INIT),
                FlagKind::Load => self.builder.set_sub_flag(SubFlags::LOAD),
                FlagKind::Main => self.builder.set_sub_flag(SubFlags::MAIN),
                FlagKind::Method => self.builder.set_sub_flag(SubFlags::METHOD),
                FlagKind::Lex => self.builder.set_sub_flag(SubFlags::LEX),
                FlagKind::Multi => self.builder.set_sub_flag(SubFlags::MULTI),
                FlagKind::Postcomp => self.builder.set_sub_flag(SubFlags::POSTCOMP),
                FlagKind::Immediate => self.builder.set_sub_flag(SubFlags::IMMEDIATE),
                FlagKind::Outer => {
                    self.expect_operator(OperatorKind::LeftParen)?;
                    let outer = self.parse_sub_name()?;
                    self.expect_operator(OperatorKind::RightParen)?;
                    self.builder.set_sub_outer(&outer);
                }
                FlagKind::Vtable => {
                    let name = self.parse_optional_paren_string()?;
                    self.builder.set_sub_vtable(name.as_deref());
                }
                FlagKind::Lexid => {
                    let lexid = self.parse_paren_string()?;
                    self.builder.set_sub_lexid(&lexid);
                }
                FlagKind::Instanceof => {
                    let class = self.parse_paren_string()?;
                    self.builder.set_sub_instanceof(&class);
                }
                _ => {
                    return Err(ParseError::unexpected_token(&token, ["subroutine flag"]).into());
                }
            }
        }
        Ok(())
    }

    /// Parses body lines until `.end`. Each line recovers on its own.
    fn parse_sub_body(&mut self) -> Result<(), Fatal> {
        loop {
            match self.parse_body_line() {
                Ok(true) => {}
                Ok(false) => return Ok(()),
                Err(failure) => self.recover(failure)?,
            }
        }
    }

    fn parse_body_line(&mut self) -> ParseResult<bool> {
        self.skip_newlines()?;
        let Some((kind, line)) = self.peek_info(0)? else {
            self.builder
                .syntax_error("syntax error, unexpected end of file, expecting '.end'")?;
            self.builder.close_sub();
            return Ok(false);
        };
        self.builder.begin_statement(line);
        match kind {
            TokenKind::Directive(Directive::End) => {
                self.advance()?;
                self.builder.close_sub();
                if let Err(failure) = self.end_of_line() {
                    self.recover(failure)?;
                }
                return Ok(false);
            }
            // `.end` went missing; leave `.sub` for the top level.
            TokenKind::Directive(Directive::Sub) => {
                self.builder
                    .syntax_error("syntax error, unexpected '.sub', expecting '.end'")?;
                self.builder.close_sub();
                return Ok(false);
            }
            TokenKind::Directive(Directive::Param) => self.parse_param()?,
            _ => self.parse_instruction()?,
        }
        self.builder.end_statement();
        Ok(true)
    }

    /// `.param type name flags`
    fn parse_param(&mut self) -> ParseResult<()> {
        self.advance()?;
        let ty = self.parse_type()?;
        let name = self.expect_name("parameter name")?;
        let annotations = self.parse_target_flags(true)?;
        self.end_of_line()?;
        self.builder.add_param(
            ty,
            &name,
            annotations.flags,
            annotations.alias,
            annotations.invocant,
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Instructions
    // -----------------------------------------------------------------------

    /// An optional label followed by a statement, or a label on its own.
    fn parse_instruction(&mut self) -> ParseResult<()> {
        if let Some((TokenKind::Label, _)) = self.peek_info(0)? {
            let label = self.advance()?;
            self.builder.set_label(&label.lexeme)?;
            if self.at_end_of_line(0)? {
                return self.end_of_line();
            }
        }
        self.parse_statement()
    }

    fn parse_statement(&mut self) -> ParseResult<()> {
        let Some((kind, _)) = self.peek_info(0)? else {
            return Err(self.unexpected(&["statement"]));
        };
        match kind {
            TokenKind::Keyword(Keyword::If) => self.parse_conditional(Polarity::If),
            TokenKind::Keyword(Keyword::Unless) => self.parse_conditional(Polarity::Unless),
            TokenKind::Keyword(Keyword::Goto) if !self.at_assignment(1)? => {
                self.advance()?;
                let label = self.expect_name("label")?;
                self.end_of_line()?;
                self.builder.goto_label(&label)?;
                Ok(())
            }
            TokenKind::Keyword(Keyword::Null) if !self.at_assignment(1)? => {
                self.advance()?;
                let target = self.parse_target()?;
                self.end_of_line()?;
                self.builder.null_target(target)?;
                Ok(())
            }
            TokenKind::Identifier | TokenKind::Keyword(_) => self.parse_identifier_statement(),
            TokenKind::Register(class) => self.parse_register_statement(class),
            TokenKind::StringConst => {
                let invocation = self.parse_invocation()?;
                self.end_of_line()?;
                self.builder.short_invocation(invocation, Vec::new())?;
                Ok(())
            }
            TokenKind::Operator(OperatorKind::LeftParen) => {
                let results = self.parse_result_targets()?;
                self.expect_operator(OperatorKind::Assign)?;
                let invocation = self.parse_invocation()?;
                self.end_of_line()?;
                self.builder.short_invocation(invocation, results)?;
                Ok(())
            }
            TokenKind::Directive(Directive::Local) => self.parse_local(),
            TokenKind::Directive(Directive::Lex) => self.parse_lex(),
            TokenKind::Directive(Directive::Const) => self.parse_const_decl(false),
            TokenKind::Directive(Directive::GlobalConst) => self.parse_const_decl(true),
            TokenKind::Directive(Directive::Return) => {
                self.advance()?;
                let arguments = self.parse_arguments()?;
                self.end_of_line()?;
                self.builder.return_values(arguments)?;
                Ok(())
            }
            TokenKind::Directive(Directive::Yield) => {
                self.advance()?;
                let arguments = self.parse_arguments()?;
                self.end_of_line()?;
                self.builder.yield_values(arguments)?;
                Ok(())
            }
            TokenKind::Directive(Directive::Tailcall) => {
                self.advance()?;
                let invocation = self.parse_invocation()?;
                self.end_of_line()?;
                self.builder.tailcall(invocation)?;
                Ok(())
            }
            TokenKind::Directive(Directive::GetResults) => {
                self.advance()?;
                let results = self.parse_result_targets()?;
                self.end_of_line()?;
                self.builder.get_results(results)?;
                Ok(())
            }
            TokenKind::Directive(Directive::BeginCall) => self.parse_call_block(Block::Call),
            TokenKind::Directive(Directive::BeginReturn) => self.parse_call_block(Block::Return),
            TokenKind::Directive(Directive::BeginYield) => self.parse_call_block(Block::Yield),
            _ => Err(self.unexpected(&["statement"])),
        }
    }

    /// Statements starting with a name: assignment, call, keyed store, or
    /// `opcode args`.
    fn parse_identifier_statement(&mut self) -> ParseResult<()> {
        let next = self.peek_info(1)?.map(|(kind, _)| kind);
        match next {
            Some(TokenKind::Operator(OperatorKind::Assign)) => {
                let name = self.advance()?.lexeme;
                let target = self.builder.symbol_target(&name)?;
                self.advance()?;
                self.parse_assignment(target)
            }
            Some(TokenKind::Operator(op)) if BinaryOp::from_augmented(op).is_some() => {
                let name = self.advance()?.lexeme;
                let target = self.builder.symbol_target(&name)?;
                self.parse_augmented(target)
            }
            Some(TokenKind::Operator(OperatorKind::LeftParen | OperatorKind::Dot)) => {
                let invocation = self.parse_invocation()?;
                self.end_of_line()?;
                self.builder.short_invocation(invocation, Vec::new())?;
                Ok(())
            }
            Some(TokenKind::Operator(OperatorKind::LeftBracket)) => {
                let name = self.advance()?.lexeme;
                self.parse_keyed_store(PmcObject::Named(name))
            }
            _ => {
                let opcode = self.advance()?.lexeme;
                self.builder.begin_instruction(&opcode);
                for operand in self.parse_op_arguments()? {
                    self.builder.push_operand(operand);
                }
                self.end_of_line()?;
                self.builder.finish_instruction()?;
                Ok(())
            }
        }
    }

    fn parse_register_statement(&mut self, class: RegisterClass) -> ParseResult<()> {
        let next = self.peek_info(1)?.map(|(kind, _)| kind);
        match next {
            Some(TokenKind::Operator(OperatorKind::Assign)) => {
                let target = self.parse_target()?;
                self.advance()?;
                self.parse_assignment(target)
            }
            Some(TokenKind::Operator(op)) if BinaryOp::from_augmented(op).is_some() => {
                let target = self.parse_target()?;
                self.parse_augmented(target)
            }
            Some(TokenKind::Operator(OperatorKind::LeftParen | OperatorKind::Dot)) => {
                let invocation = self.parse_invocation()?;
                self.end_of_line()?;
                self.builder.short_invocation(invocation, Vec::new())?;
                Ok(())
            }
            Some(TokenKind::Operator(OperatorKind::LeftBracket))
                if class == RegisterClass::Pmc =>
            {
                let number = self.expect_register_number()?;
                self.parse_keyed_store(PmcObject::Register(number))
            }
            _ => {
                self.advance()?;
                Err(self.unexpected(&["'='", "'('", "'['"]))
            }
        }
    }

    /// `object[key] = value`, positioned at `[`.
    fn parse_keyed_store(&mut self, object: PmcObject) -> ParseResult<()> {
        let key = self.parse_key()?;
        self.expect_operator(OperatorKind::Assign)?;
        let value = self.parse_value()?;
        self.end_of_line()?;
        self.builder.keyed_store(object, key, value)?;
        Ok(())
    }

    /// `T op= value`, positioned at the operator.
    fn parse_augmented(&mut self, target: Target) -> ParseResult<()> {
        let token = self.advance()?;
        let TokenKind::Operator(operator) = token.kind else {
            return Err(ParseError::unexpected_token(&token, ["assignment operator"]).into());
        };
        let Some(op) = BinaryOp::from_augmented(operator) else {
            return Err(ParseError::unexpected_token(&token, ["assignment operator"]).into());
        };
        let value = self.parse_value()?;
        self.end_of_line()?;
        self.builder.augmented_assign(target, op, value)?;
        Ok(())
    }

    /// Right-hand side of `T = ...`, positioned after `=`.
    fn parse_assignment(&mut self, target: Target) -> ParseResult<()> {
        let Some((kind, _)) = self.peek_info(0)? else {
            return Err(self.unexpected(&["expression"]));
        };
        let next = self.peek_info(1)?.map(|(kind, _)| kind);
        match kind {
            TokenKind::Operator(operator) => {
                let Some(op) = UnaryOp::from_operator(operator) else {
                    return Err(self.unexpected(&["expression"]));
                };
                self.advance()?;
                let value = self.parse_value()?;
                self.end_of_line()?;
                self.builder.assign_unary(target, op, value)?;
            }
            TokenKind::StringConst
                if next == Some(TokenKind::Operator(OperatorKind::LeftParen)) =>
            {
                self.finish_call_assignment(target)?;
            }
            TokenKind::IntConst | TokenKind::NumConst | TokenKind::StringConst => {
                if infix_op(next).is_some() {
                    self.finish_binary_assignment(target)?;
                } else {
                    let token = self.advance()?;
                    self.end_of_line()?;
                    match token.kind {
                        TokenKind::IntConst => {
                            self.builder.assign_int(target, token.int_value().unwrap_or(0))?;
                        }
                        TokenKind::NumConst => {
                            self.builder
                                .assign_num(target, token.num_value().unwrap_or(0.0))?;
                        }
                        _ => {
                            self.builder
                                .assign_string(target, token.string_value().unwrap_or(""))?;
                        }
                    }
                }
            }
            TokenKind::Register(_) | TokenKind::Identifier | TokenKind::Keyword(_) => {
                if next == Some(TokenKind::Operator(OperatorKind::LeftParen))
                    || self.at_method_call()?
                {
                    self.finish_call_assignment(target)?;
                } else if infix_op(next).is_some() {
                    self.finish_binary_assignment(target)?;
                } else if let TokenKind::Register(_) = kind {
                    let value = self.parse_value()?;
                    self.end_of_line()?;
                    self.builder.assign_expression(target, value)?;
                } else {
                    self.finish_op_assignment(target)?;
                }
            }
            _ => return Err(self.unexpected(&["expression"])),
        }
        Ok(())
    }

    /// `T = A op B`
    fn finish_binary_assignment(&mut self, target: Target) -> ParseResult<()> {
        let left = self.parse_value()?;
        let token = self.advance()?;
        let Some(op) = infix_op(Some(token.kind)) else {
            return Err(ParseError::unexpected_token(&token, ["binary operator"]).into());
        };
        let right = self.parse_value()?;
        self.end_of_line()?;
        self.builder.assign_binary(target, left, op, right)?;
        Ok(())
    }

    /// `T = call(...)` or `T = obj.method(...)`
    fn finish_call_assignment(&mut self, target: Target) -> ParseResult<()> {
        let invocation = self.parse_invocation()?;
        self.end_of_line()?;
        self.builder.short_invocation(invocation, vec![target])?;
        Ok(())
    }

    /// `T = name`, `T = op args`, `T = name[key]`, or `T = op [key], args`.
    fn finish_op_assignment(&mut self, target: Target) -> ParseResult<()> {
        let name = self.advance()?.lexeme;
        if self.at_operator(0, OperatorKind::LeftBracket)? {
            let key = self.parse_key()?;
            if self.eat_operator(OperatorKind::Comma)? {
                let mut operands = vec![Expression::Key(key)];
                operands.extend(self.parse_op_arguments()?);
                self.end_of_line()?;
                self.builder.assign_op(target, &name, operands)?;
            } else {
                self.end_of_line()?;
                self.builder.assign_keyed(target, &name, key)?;
            }
            return Ok(());
        }
        let operands = self.parse_op_arguments()?;
        self.end_of_line()?;
        self.builder.assign_op(target, &name, operands)?;
        Ok(())
    }

    /// Comma-separated opcode arguments up to the end of the line.
    fn parse_op_arguments(&mut self) -> ParseResult<Vec<Expression>> {
        let mut operands = Vec::new();
        if self.at_end_of_line(0)? {
            return Ok(operands);
        }
        loop {
            operands.push(self.parse_op_argument()?);
            if !self.eat_operator(OperatorKind::Comma)? {
                break;
            }
        }
        Ok(operands)
    }

    /// Like [`Self::parse_value`], but bare identifiers may be labels and
    /// a key may stand alone.
    fn parse_op_argument(&mut self) -> ParseResult<Expression> {
        match self.peek_info(0)?.map(|(kind, _)| kind) {
            Some(TokenKind::Identifier | TokenKind::Keyword(_))
                if !self.at_operator(1, OperatorKind::LeftBracket)? =>
            {
                let name = self.advance()?.lexeme;
                Ok(self.builder.identifier_operand(&name))
            }
            Some(TokenKind::Operator(OperatorKind::LeftBracket)) => {
                Ok(Expression::Key(self.parse_key()?))
            }
            _ => self.parse_value(),
        }
    }

    // -----------------------------------------------------------------------
    // Conditionals
    // -----------------------------------------------------------------------

    fn parse_conditional(&mut self, polarity: Polarity) -> ParseResult<()> {
        self.advance()?;
        let Some((kind, _)) = self.peek_info(0)? else {
            return Err(self.unexpected(&["condition"]));
        };
        let relation = self
            .peek_info(1)?
            .and_then(|(kind, _)| match kind {
                TokenKind::Operator(operator) => RelOp::from_operator(operator),
                _ => None,
            });

        if kind == TokenKind::Keyword(Keyword::Null) && relation.is_none() {
            // `if null goto L` tests a variable called `null`.
            let joined = matches!(
                self.peek_info(1)?.map(|(kind, _)| kind),
                Some(TokenKind::Keyword(Keyword::Goto) | TokenKind::Operator(OperatorKind::Comma))
            );
            let tests_variable = joined && self.peek_is_name(2)? && self.at_end_of_line(3)?;
            self.advance()?;
            if tests_variable {
                let label = self.parse_branch_label()?;
                self.builder.conditional_var(polarity, false, "null", &label)?;
                return Ok(());
            }
            let target = self.parse_target()?;
            if !matches!(self.peek_info(0)?, Some((TokenKind::Keyword(Keyword::Goto), _))) {
                return Err(self.unexpected(&["'goto'"]));
            }
            let label = self.parse_branch_label()?;
            self.builder.conditional_target(polarity, true, target, &label)?;
            return Ok(());
        }

        if let Some(op) = relation {
            let left = self.parse_value()?;
            self.advance()?;
            let right = self.parse_value()?;
            if !matches!(self.peek_info(0)?, Some((TokenKind::Keyword(Keyword::Goto), _))) {
                return Err(self.unexpected(&["'goto'"]));
            }
            let label = self.parse_branch_label()?;
            self.builder
                .conditional_relation(polarity, left, op, right, &label)?;
            return Ok(());
        }

        match kind {
            TokenKind::IntConst | TokenKind::NumConst | TokenKind::StringConst => {
                let token = self.advance()?;
                let constant = constant_from(&token)
                    .ok_or_else(|| ParseError::unexpected_token(&token, ["constant"]))?;
                let label = self.parse_branch_label()?;
                self.builder.conditional_const(polarity, &constant, &label)?;
            }
            TokenKind::Register(_) => {
                let target = self.parse_target()?;
                let label = self.parse_branch_label()?;
                self.builder.conditional_target(polarity, false, target, &label)?;
            }
            TokenKind::Identifier | TokenKind::Keyword(_) => {
                let name = self.advance()?.lexeme;
                let label = self.parse_branch_label()?;
                self.builder.conditional_var(polarity, false, &name, &label)?;
            }
            _ => return Err(self.unexpected(&["condition"])),
        }
        Ok(())
    }

    /// `goto L` or `, L` ending a conditional line.
    fn parse_branch_label(&mut self) -> ParseResult<String> {
        let joined = self
            .tokens
            .consume_if(|token| {
                token.is_keyword(Keyword::Goto) || token.is_operator(OperatorKind::Comma)
            })?
            .is_some();
        if !joined {
            return Err(self.unexpected(&["'goto'", "','"]));
        }
        let label = self.expect_name("label")?;
        self.end_of_line()?;
        Ok(label)
    }

    // -----------------------------------------------------------------------
    // Declarations
    // -----------------------------------------------------------------------

    /// `.local type name [:unique_reg], ...`
    fn parse_local(&mut self) -> ParseResult<()> {
        self.advance()?;
        let ty = self.parse_type()?;
        let mut names = Vec::new();
        loop {
            let name = self.expect_name("identifier")?;
            let unique_reg = self
                .tokens
                .consume_if(|token| token.kind == TokenKind::Flag(FlagKind::UniqueReg))?
                .is_some();
            names.push((name, unique_reg));
            if !self.eat_operator(OperatorKind::Comma)? {
                break;
            }
        }
        self.end_of_line()?;
        self.builder.declare_locals(ty, &names)?;
        Ok(())
    }

    /// `.lex "name", object`
    fn parse_lex(&mut self) -> ParseResult<()> {
        self.advance()?;
        let name = self.expect_string()?;
        self.expect_operator(OperatorKind::Comma)?;
        let object = self.parse_pmc_object()?;
        self.end_of_line()?;
        self.builder.declare_lexical(&name, object)?;
        Ok(())
    }

    /// `.const type name = value` or `.globalconst ...`
    fn parse_const_decl(&mut self, global: bool) -> ParseResult<()> {
        self.advance()?;
        let ty = self.parse_type()?;
        let name = self.expect_name("constant name")?;
        self.expect_operator(OperatorKind::Assign)?;
        if self.at_end_of_line(0)? {
            return Err(self.unexpected(&["constant"]));
        }
        let token = self.advance()?;
        let value = match (ty, token.kind) {
            (ValueType::Int, TokenKind::IntConst) => token.int_value().map(ConstValue::Int),
            (ValueType::Num, TokenKind::NumConst) => token.num_value().map(ConstValue::Num),
            (ValueType::Num, TokenKind::IntConst) => {
                token.int_value().map(|value| ConstValue::Num(value as f64))
            }
            (ValueType::String, TokenKind::StringConst) => {
                token.string_value().map(|value| ConstValue::String(value.to_string()))
            }
            (ValueType::Pmc, TokenKind::StringConst) => {
                token.string_value().map(|value| ConstValue::Pmc(value.to_string()))
            }
            _ => None,
        };
        let Some(value) = value else {
            let expected = format!("{} constant", ty.name());
            return Err(ParseError::unexpected_token(&token, [expected]).into());
        };
        self.end_of_line()?;
        if global {
            self.builder.declare_global_const(&name, value)?;
        } else {
            self.builder.declare_const(&name, value)?;
        }
        Ok(())
    }

    fn parse_type(&mut self) -> ParseResult<ValueType> {
        if let Some((TokenKind::Keyword(keyword), _)) = self.peek_info(0)? {
            if let Some(ty) = ValueType::from_keyword(keyword) {
                self.advance()?;
                return Ok(ty);
            }
        }
        Err(self.unexpected(&["'int'", "'num'", "'string'", "'pmc'"]))
    }

    // -----------------------------------------------------------------------
    // Invocations
    // -----------------------------------------------------------------------

    /// `sub(args)`, `"sub"(args)`, `$P0(args)`, or `obj.method(args)`.
    fn parse_invocation(&mut self) -> ParseResult<Invocation> {
        let Some((kind, _)) = self.peek_info(0)? else {
            return Err(self.unexpected(&["sub or method call"]));
        };
        if kind == TokenKind::StringConst {
            let callee = Constant::string(self.expect_string()?);
            let arguments = self.parse_arguments()?;
            return Ok(Invocation::sub_call(callee, arguments));
        }
        let object = self.parse_pmc_object()?;
        if self.eat_operator(OperatorKind::Dot)? {
            let invocant = self.builder.invocant_target(object)?;
            let method = self.parse_method()?;
            let arguments = self.parse_arguments()?;
            return Ok(Invocation::method_call(invocant, method, arguments));
        }
        let callee = self.builder.pmc_object(object)?;
        let arguments = self.parse_arguments()?;
        Ok(Invocation::sub_call(callee, arguments))
    }

    /// Method name after `.`: identifier, `$P`/`$S` register, or string.
    fn parse_method(&mut self) -> ParseResult<Expression> {
        match self.peek_info(0)?.map(|(kind, _)| kind) {
            Some(TokenKind::Identifier | TokenKind::Keyword(_)) => {
                let name = self.advance()?.lexeme;
                Ok(self.builder.method_target(&name)?)
            }
            Some(TokenKind::Register(RegisterClass::Pmc | RegisterClass::String)) => {
                Ok(Expression::Target(self.parse_target()?))
            }
            Some(TokenKind::StringConst) => {
                Ok(Expression::Constant(Constant::string(self.expect_string()?)))
            }
            _ => Err(self.unexpected(&["method"])),
        }
    }

    /// `( arg, ... )`
    fn parse_arguments(&mut self) -> ParseResult<Vec<Argument>> {
        self.expect_operator(OperatorKind::LeftParen)?;
        let mut arguments = Vec::new();
        if !self.eat_operator(OperatorKind::RightParen)? {
            loop {
                arguments.push(self.parse_argument()?);
                if !self.eat_operator(OperatorKind::Comma)? {
                    break;
                }
            }
            self.expect_operator(OperatorKind::RightParen)?;
        }
        Ok(arguments)
    }

    /// `value [:flat] [:named("x")]` or `"x" => value`.
    fn parse_argument(&mut self) -> ParseResult<Argument> {
        if self.peek_info(0)?.map(|(kind, _)| kind) == Some(TokenKind::StringConst)
            && self.at_operator(1, OperatorKind::FatArrow)?
        {
            let alias = self.expect_string()?;
            self.advance()?;
            let value = self.parse_value()?;
            return Ok(Argument::named(alias, value));
        }
        let mut argument = Argument::new(self.parse_value()?);
        while let Some((TokenKind::Flag(flag), _)) = self.peek_info(0)? {
            match flag {
                FlagKind::Flat => {
                    self.advance()?;
                    argument = argument.with_flags(ArgFlags::FLAT);
                }
                FlagKind::Named => {
                    self.advance()?;
                    argument = argument.with_flags(ArgFlags::NAMED);
                    argument.alias = self.parse_optional_paren_string()?;
                }
                _ => return Err(self.unexpected(&["':flat'", "':named'"])),
            }
        }
        Ok(argument)
    }

    /// `( target [flags], ... )`
    fn parse_result_targets(&mut self) -> ParseResult<Vec<Target>> {
        self.expect_operator(OperatorKind::LeftParen)?;
        let mut results = Vec::new();
        if !self.eat_operator(OperatorKind::RightParen)? {
            loop {
                results.push(self.parse_result_target()?);
                if !self.eat_operator(OperatorKind::Comma)? {
                    break;
                }
            }
            self.expect_operator(OperatorKind::RightParen)?;
        }
        Ok(results)
    }

    fn parse_result_target(&mut self) -> ParseResult<Target> {
        let target = self.parse_target()?;
        let annotations = self.parse_target_flags(false)?;
        Ok(target
            .with_flags(annotations.flags)
            .with_alias(annotations.alias))
    }

    /// Flags after a parameter or result target.
    fn parse_target_flags(&mut self, allow_invocant: bool) -> ParseResult<TargetAnnotations> {
        let mut annotations = TargetAnnotations::default();
        while let Some((TokenKind::Flag(flag), _)) = self.peek_info(0)? {
            match flag {
                FlagKind::Optional => annotations.flags.insert(TargetFlags::OPTIONAL),
                FlagKind::OptFlag => annotations.flags.insert(TargetFlags::OPT_FLAG),
                FlagKind::Slurpy => annotations.flags.insert(TargetFlags::SLURPY),
                FlagKind::UniqueReg => annotations.flags.insert(TargetFlags::UNIQUE_REG),
                FlagKind::Named => annotations.flags.insert(TargetFlags::NAMED),
                FlagKind::Invocant if allow_invocant => {
                    annotations.flags.insert(TargetFlags::INVOCANT);
                }
                _ => return Err(self.unexpected(&["target flag"])),
            }
            self.advance()?;
            match flag {
                FlagKind::Named => annotations.alias = self.parse_optional_paren_string()?,
                FlagKind::Invocant => {
                    self.expect_operator(OperatorKind::LeftParen)?;
                    let class = match self.peek_info(0)?.map(|(kind, _)| kind) {
                        Some(TokenKind::StringConst) => self.expect_string()?,
                        _ => self.expect_name("invocant type")?,
                    };
                    self.expect_operator(OperatorKind::RightParen)?;
                    annotations.invocant = Some(class);
                }
                _ => {}
            }
        }
        Ok(annotations)
    }

    /// `.begin_call` / `.begin_return` / `.begin_yield` through the
    /// matching end directive.
    fn parse_call_block(&mut self, block: Block) -> ParseResult<()> {
        self.advance()?;
        self.end_of_line()?;
        match block {
            Block::Call => self.builder.begin_call(),
            Block::Return => self.builder.begin_return(CallKind::Return),
            Block::Yield => self.builder.begin_return(CallKind::Yield),
        }
        loop {
            match self.parse_block_line(block) {
                Ok(true) => {}
                Ok(false) => return Ok(()),
                Err(failure) => self.recover(failure)?,
            }
        }
    }

    fn parse_block_line(&mut self, block: Block) -> ParseResult<bool> {
        self.skip_newlines()?;
        let end = block.end_directive();
        let Some((kind, line)) = self.peek_info(0)? else {
            self.builder.syntax_error(format!(
                "syntax error, unexpected end of file, expecting '{}'",
                end.as_str()
            ))?;
            return Ok(false);
        };
        self.builder.set_line(line);
        let TokenKind::Directive(directive) = kind else {
            return Err(self.unexpected(&[block.set_directive().as_str(), end.as_str()]));
        };
        match directive {
            _ if directive == end => {
                self.advance()?;
                self.end_of_line()?;
                self.builder.end_call()?;
                return Ok(false);
            }
            // Leave the enclosing `.end` or `.sub` to the body loop.
            Directive::End | Directive::Sub => {
                self.builder.syntax_error(format!(
                    "syntax error, unexpected '{}', expecting '{}'",
                    directive.as_str(),
                    end.as_str()
                ))?;
                return Ok(false);
            }
            _ if directive == block.set_directive() => {
                self.advance()?;
                let argument = self.parse_argument()?;
                self.end_of_line()?;
                self.builder.set_arg(argument)?;
            }
            Directive::Call if block == Block::Call => {
                self.advance()?;
                let object = self.parse_pmc_object()?;
                let callee = self.builder.pmc_object(object)?;
                let retcont = if self.eat_operator(OperatorKind::Comma)? {
                    let object = self.parse_pmc_object()?;
                    Some(self.builder.pmc_object(object)?)
                } else {
                    None
                };
                self.end_of_line()?;
                self.builder.call_target(callee, retcont)?;
            }
            Directive::NciCall if block == Block::Call => {
                self.advance()?;
                let object = self.parse_pmc_object()?;
                let callee = self.builder.pmc_object(object)?;
                self.end_of_line()?;
                self.builder.nci_call_target(callee)?;
            }
            Directive::Invocant if block == Block::Call => {
                self.advance()?;
                let object = self.parse_pmc_object()?;
                let invocant = self.builder.invocant_target(object)?;
                self.end_of_line()?;
                self.builder.set_invocant(invocant)?;
            }
            Directive::MethCall if block == Block::Call => {
                self.advance()?;
                let method = self.parse_method()?;
                self.end_of_line()?;
                self.builder.method_call_target(method)?;
            }
            Directive::GetResult if block == Block::Call => {
                self.advance()?;
                let target = self.parse_result_target()?;
                self.end_of_line()?;
                self.builder.get_result(target)?;
            }
            Directive::Local if block == Block::Call => self.parse_local()?,
            _ => return Err(self.unexpected(&[block.set_directive().as_str(), end.as_str()])),
        }
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Operands
    // -----------------------------------------------------------------------

    /// A register or a declared identifier.
    fn parse_target(&mut self) -> ParseResult<Target> {
        match self.peek_info(0)?.map(|(kind, _)| kind) {
            Some(TokenKind::Register(class)) => {
                let number = self.expect_register_number()?;
                Ok(self.builder.register_target(class.into(), number))
            }
            Some(TokenKind::Identifier | TokenKind::Keyword(_)) => {
                let name = self.advance()?.lexeme;
                Ok(self.builder.symbol_target(&name)?)
            }
            _ => Err(self.unexpected(&["register", "identifier"])),
        }
    }

    /// A constant, register, identifier, or indexed object in value
    /// position.
    fn parse_value(&mut self) -> ParseResult<Expression> {
        let Some((kind, _)) = self.peek_info(0)? else {
            return Err(self.unexpected(&["expression"]));
        };
        match kind {
            TokenKind::IntConst | TokenKind::NumConst | TokenKind::StringConst => {
                let token = self.advance()?;
                let constant = constant_from(&token)
                    .ok_or_else(|| ParseError::unexpected_token(&token, ["constant"]))?;
                Ok(Expression::Constant(constant))
            }
            TokenKind::Register(RegisterClass::Pmc)
                if self.at_operator(1, OperatorKind::LeftBracket)? =>
            {
                let number = self.expect_register_number()?;
                let key = self.parse_key()?;
                Ok(Expression::Target(
                    self.builder.indexed_target(PmcObject::Register(number), key)?,
                ))
            }
            TokenKind::Register(_) => Ok(Expression::Target(self.parse_target()?)),
            TokenKind::Identifier | TokenKind::Keyword(_) => {
                let name = self.advance()?.lexeme;
                if self.at_operator(0, OperatorKind::LeftBracket)? {
                    let key = self.parse_key()?;
                    return Ok(Expression::Target(
                        self.builder.indexed_target(PmcObject::Named(name), key)?,
                    ));
                }
                Ok(self.builder.identifier_value(&name)?)
            }
            _ => Err(self.unexpected(&["expression"])),
        }
    }

    /// `[ value ; value ... ]`
    fn parse_key(&mut self) -> ParseResult<Key> {
        self.expect_operator(OperatorKind::LeftBracket)?;
        let mut key = Key::new(self.parse_value()?);
        while self.eat_operator(OperatorKind::Semicolon)? {
            key.push(self.parse_value()?);
        }
        self.expect_operator(OperatorKind::RightBracket)?;
        Ok(key)
    }

    /// Sub, invocant, or lexical object: an identifier or a `$P` register.
    fn parse_pmc_object(&mut self) -> ParseResult<PmcObject> {
        match self.peek_info(0)?.map(|(kind, _)| kind) {
            Some(TokenKind::Register(RegisterClass::Pmc)) => {
                Ok(PmcObject::Register(self.expect_register_number()?))
            }
            Some(TokenKind::Identifier | TokenKind::Keyword(_)) => {
                Ok(PmcObject::Named(self.advance()?.lexeme))
            }
            _ => Err(self.unexpected(&["identifier", "pmc register"])),
        }
    }

    // -----------------------------------------------------------------------
    // Token helpers
    // -----------------------------------------------------------------------

    fn recover(&mut self, failure: ParseFailure) -> Result<(), Fatal> {
        match failure {
            ParseFailure::Fatal(fatal) => Err(fatal),
            ParseFailure::Syntax(error) => {
                resynchronize(&mut self.tokens, &mut self.builder, &error)
            }
        }
    }

    fn peek_info(&mut self, n: usize) -> ParseResult<Option<(TokenKind, u32)>> {
        Ok(self
            .tokens
            .peek(n)?
            .map(|token| (token.kind, token.line())))
    }

    fn peek_is_name(&mut self, n: usize) -> ParseResult<bool> {
        Ok(self.tokens.peek(n)?.is_some_and(Token::is_name))
    }

    fn advance(&mut self) -> ParseResult<Token> {
        match self.tokens.next()? {
            Some(token) => Ok(token),
            None => Err(ParseError::unexpected_end_of_input(["token"]).into()),
        }
    }

    fn at_operator(&mut self, n: usize, operator: OperatorKind) -> ParseResult<bool> {
        Ok(self
            .tokens
            .peek(n)?
            .is_some_and(|token| token.is_operator(operator)))
    }

    /// `=` or an augmented operator at `n`, so the name before it is a
    /// variable even when it spells a keyword.
    fn at_assignment(&mut self, n: usize) -> ParseResult<bool> {
        Ok(match self.peek_info(n)? {
            Some((TokenKind::Operator(OperatorKind::Assign), _)) => true,
            Some((TokenKind::Operator(op), _)) => BinaryOp::from_augmented(op).is_some(),
            _ => false,
        })
    }

    /// `obj.method(` with the method at offset 2.
    fn at_method_call(&mut self) -> ParseResult<bool> {
        Ok(self.at_operator(1, OperatorKind::Dot)?
            && self.at_operator(3, OperatorKind::LeftParen)?)
    }

    fn at_end_of_line(&mut self, n: usize) -> ParseResult<bool> {
        Ok(self.tokens.peek(n)?.map_or(true, Token::is_newline))
    }

    fn eat_operator(&mut self, operator: OperatorKind) -> ParseResult<bool> {
        Ok(self
            .tokens
            .consume_if(|token| token.is_operator(operator))?
            .is_some())
    }

    fn expect_operator(&mut self, operator: OperatorKind) -> ParseResult<()> {
        if self.eat_operator(operator)? {
            return Ok(());
        }
        let expected = format!("'{}'", operator.as_str());
        Err(self.unexpected(&[expected.as_str()]))
    }

    fn expect_name(&mut self, expected: &str) -> ParseResult<String> {
        if self.peek_is_name(0)? {
            return Ok(self.advance()?.lexeme);
        }
        Err(self.unexpected(&[expected]))
    }

    fn expect_string(&mut self) -> ParseResult<String> {
        match self
            .tokens
            .consume_if(|token| token.kind == TokenKind::StringConst)?
        {
            Some(token) => Ok(token.string_value().unwrap_or_default().to_string()),
            None => Err(self.unexpected(&["string constant"])),
        }
    }

    fn expect_register_number(&mut self) -> ParseResult<u32> {
        let token = self.advance()?;
        token
            .register_number()
            .ok_or_else(|| ParseError::unexpected_token(&token, ["register"]).into())
    }

    /// `("text")`
    fn parse_paren_string(&mut self) -> ParseResult<String> {
        self.expect_operator(OperatorKind::LeftParen)?;
        let value = self.expect_string()?;
        self.expect_operator(OperatorKind::RightParen)?;
        Ok(value)
    }

    /// Optional `("text")` after a flag.
    fn parse_optional_paren_string(&mut self) -> ParseResult<Option<String>> {
        if self.at_operator(0, OperatorKind::LeftParen)? {
            return self.parse_paren_string().map(Some);
        }
        Ok(None)
    }

    fn skip_newlines(&mut self) -> ParseResult<()> {
        while self.tokens.consume_if(Token::is_newline)?.is_some() {}
        Ok(())
    }

    /// Consumes the newline ending a statement; end of input also counts.
    fn end_of_line(&mut self) -> ParseResult<()> {
        if self.tokens.consume_if(Token::is_newline)?.is_some() || self.tokens.peek(0)?.is_none()
        {
            return Ok(());
        }
        Err(self.unexpected(&["newline"]))
    }

    /// Builds an error for the next token without consuming it, so recovery
    /// still sees a newline that caused the error.
    fn unexpected(&mut self, expected: &[&str]) -> ParseFailure {
        let expected = expected.iter().map(|label| label.to_string());
        let error = match self.tokens.peek(0) {
            Ok(Some(token)) => ParseError::unexpected_token(token, expected),
            Ok(None) => ParseError::unexpected_end_of_input(expected),
            Err(error) => error,
        };
        error.into()
    }
}

fn infix_op(kind: Option<TokenKind>) -> Option<BinaryOp> {
    match kind {
        Some(TokenKind::Operator(operator)) => BinaryOp::from_infix(operator),
        _ => None,
    }
}

fn constant_from(token: &Token) -> Option<Constant> {
    match token.kind {
        TokenKind::IntConst => token.int_value().map(Constant::int),
        TokenKind::NumConst => token.num_value().map(Constant::num),
        TokenKind::StringConst => token.string_value().map(Constant::string),
        _ => None,
    }
}
