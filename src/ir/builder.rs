//! Grammar actions.
//!
//! [`Builder`] is driven by a recognizer, one call per recognized production.
//! It owns the compilation unit under construction, the open subroutine, and
//! the diagnostics list. Actions check declarations, materialize targets and
//! expressions, fold constant operands, and append finished statements to the
//! open subroutine after strength reduction.
//!
//! Recoverable problems are recorded as [`Diagnostic`]s and building goes on
//! with a placeholder, the unreduced instruction, or no statement at all.
//! Once more than [`BuildOptions::max_errors`] diagnostics have been recorded,
//! the reporting action returns [`Fatal::TooManyErrors`] and every later
//! report returns it again.

use crate::ir::branch::{self, Condition, Polarity};
use crate::ir::constant::{ConstValue, Constant};
use crate::ir::error::{BuildResult, Diagnostic, DiagnosticKind, Fatal};
use crate::ir::flags::{SubFlags, TargetFlags};
use crate::ir::fold::{self, FoldError};
use crate::ir::ids::SubId;
use crate::ir::node::{
    Argument, CallKind, Expression, Instruction, Invocation, Key, Statement, Target,
};
use crate::ir::opcode::OpcodeTable;
use crate::ir::operator::{BinaryOp, RelOp, UnaryOp};
use crate::ir::reduce::{self, Reduction};
use crate::ir::symbol::{Symbol, SymbolError};
use crate::ir::truth;
use crate::ir::types::ValueType;
use crate::ir::unit::{CompilationUnit, Lexical, Parameter, Subroutine};

/// Builder configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Number of diagnostics tolerated before the build aborts.
    pub max_errors: usize,
    /// Opcode names accepted in addition to the core Parrot set.
    pub extra_opcodes: Vec<String>,
    /// Run the label verifier after a successful build.
    pub verify_labels: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_errors: 10,
            extra_opcodes: Vec::new(),
            verify_labels: true,
        }
    }
}

/// Object operand that must be a pmc: a named symbol or a `$P` register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PmcObject {
    Named(String),
    Register(u32),
}

/// Call, return, or yield block being assembled across several lines.
#[derive(Debug)]
struct PendingCall {
    invocation: Invocation,
    has_target: bool,
}

/// Semantic action context.
pub struct Builder {
    options: BuildOptions,
    opcodes: OpcodeTable,
    unit: CompilationUnit,
    current: Option<Subroutine>,
    pending_label: Option<String>,
    pending_instruction: Option<Instruction>,
    pending_call: Option<PendingCall>,
    diagnostics: Vec<Diagnostic>,
    line: u32,
    statement_start: usize,
    aborted: bool,
}

impl Builder {
    /// Creates a builder with an empty compilation unit.
    pub fn new(options: BuildOptions) -> Self {
        let mut opcodes = OpcodeTable::parrot();
        opcodes.extend(options.extra_opcodes.iter().cloned());
        Self {
            options,
            opcodes,
            unit: CompilationUnit::new(),
            current: None,
            pending_label: None,
            pending_instruction: None,
            pending_call: None,
            diagnostics: Vec::new(),
            line: 1,
            statement_start: 0,
            aborted: false,
        }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn opcodes(&self) -> &OpcodeTable {
        &self.opcodes
    }

    pub fn unit(&self) -> &CompilationUnit {
        &self.unit
    }

    /// Returns the subroutine between `.sub` and `.end`, if any.
    pub fn current_sub(&self) -> Option<&Subroutine> {
        self.current.as_ref()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    /// Returns `true` once the error threshold has been exceeded.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Line attached to diagnostics reported now.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Closes any open subroutine and returns the unit and diagnostics.
    pub fn finish(mut self) -> (CompilationUnit, Vec<Diagnostic>) {
        self.close_sub();
        (self.unit, self.diagnostics)
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    /// Records a diagnostic on the current line.
    pub fn report(&mut self, kind: DiagnosticKind, message: impl Into<String>) -> BuildResult<()> {
        if self.aborted {
            return Err(self.too_many_errors());
        }

        let diagnostic = Diagnostic::new(kind, message, self.line);
        log::debug!("{diagnostic}");
        self.diagnostics.push(diagnostic);

        if self.diagnostics.len() > self.options.max_errors {
            log::warn!(
                "{} errors exceed the limit of {}, aborting",
                self.diagnostics.len(),
                self.options.max_errors
            );
            self.aborted = true;
            return Err(self.too_many_errors());
        }
        Ok(())
    }

    /// Records a `Syntax` diagnostic.
    pub fn syntax_error(&mut self, message: impl Into<String>) -> BuildResult<()> {
        self.report(DiagnosticKind::Syntax, message)
    }

    fn too_many_errors(&self) -> Fatal {
        Fatal::TooManyErrors {
            count: self.diagnostics.len(),
        }
    }

    // -----------------------------------------------------------------------
    // Top-level directives
    // -----------------------------------------------------------------------

    /// `.loadlib "name"`
    pub fn load_library(&mut self, name: &str) {
        self.unit.libraries.push(name.to_string());
    }

    /// `.HLL "name"`
    pub fn set_hll(&mut self, name: &str) {
        self.unit.hll = Some(name.to_string());
    }

    /// `.HLL_map "core" = "hll"`
    pub fn set_hll_map(&mut self, core: &str, hll: &str) {
        self.unit.hll_map.insert(core.to_string(), hll.to_string());
    }

    /// `.namespace [ ... ]`; `None` resets to the root namespace.
    pub fn set_namespace(&mut self, key: Option<Key>) {
        self.unit.namespace = key;
    }

    /// `.const type name = value`, local to the open subroutine or, outside
    /// one, to the file.
    pub fn declare_const(&mut self, name: &str, value: ConstValue) -> BuildResult<()> {
        let constant = Constant::named(name, value);
        let table = match self.current.as_mut() {
            Some(sub) => &mut sub.constants,
            None => &mut self.unit.constants,
        };
        if table.contains_key(name) {
            return self.report(
                DiagnosticKind::DuplicateSymbol,
                format!("constant '{name}' is already declared"),
            );
        }
        table.insert(name.to_string(), constant);
        Ok(())
    }

    /// `.globalconst type name = value`
    pub fn declare_global_const(&mut self, name: &str, value: ConstValue) -> BuildResult<()> {
        if self.unit.global_constants.contains_key(name) {
            return self.report(
                DiagnosticKind::DuplicateSymbol,
                format!("constant '{name}' is already declared"),
            );
        }
        self.unit
            .global_constants
            .insert(name.to_string(), Constant::named(name, value));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Subroutines
    // -----------------------------------------------------------------------

    /// `.sub name`. A subroutine still open is closed first.
    pub fn open_sub(&mut self, name: &str) -> SubId {
        self.close_sub();
        log::debug!("opening subroutine '{name}'");
        let mut sub = Subroutine::new(name);
        sub.namespace = self.unit.namespace.clone();
        self.current = Some(sub);
        self.statement_start = 0;
        SubId::new(u32::try_from(self.unit.subroutines.len()).unwrap_or(u32::MAX))
    }

    /// `.end`. Returns the id of the closed subroutine.
    pub fn close_sub(&mut self) -> Option<SubId> {
        let sub = self.current.take()?;
        self.pending_label = None;
        self.pending_instruction = None;
        self.pending_call = None;
        log::debug!(
            "closing subroutine '{}' with {} statements",
            sub.name,
            sub.statements.len()
        );
        let id = SubId::new(u32::try_from(self.unit.subroutines.len()).unwrap_or(u32::MAX));
        self.unit.subroutines.push(sub);
        Some(id)
    }

    /// `:main`, `:load`, ...
    pub fn set_sub_flag(&mut self, flag: SubFlags) {
        if let Some(sub) = self.current.as_mut() {
            sub.flags |= flag;
        }
    }

    /// `:outer(name)`
    pub fn set_sub_outer(&mut self, outer: &str) {
        if let Some(sub) = self.current.as_mut() {
            sub.outer = Some(outer.to_string());
        }
    }

    /// `:vtable` or `:vtable("name")`
    pub fn set_sub_vtable(&mut self, name: Option<&str>) {
        if let Some(sub) = self.current.as_mut() {
            let name = name.map_or_else(|| sub.name.clone(), str::to_string);
            sub.vtable = Some(name);
        }
    }

    /// `:lexid("id")`
    pub fn set_sub_lexid(&mut self, lexid: &str) {
        if let Some(sub) = self.current.as_mut() {
            sub.lexid = Some(lexid.to_string());
        }
    }

    /// `:instanceof("class")`
    pub fn set_sub_instanceof(&mut self, class: &str) {
        if let Some(sub) = self.current.as_mut() {
            sub.instanceof = Some(class.to_string());
        }
    }

    /// `.param type name flags`. A duplicate name is reported and skipped.
    pub fn add_param(
        &mut self,
        ty: ValueType,
        name: &str,
        flags: TargetFlags,
        alias: Option<String>,
        invocant_type: Option<String>,
    ) -> BuildResult<()> {
        let sub = self.sub_mut()?;
        let declared = sub
            .symbols
            .declare(name, ty, flags.contains(TargetFlags::UNIQUE_REG))
            .map(Target::from_symbol);
        match declared {
            Ok(target) => {
                sub.parameters.push(Parameter {
                    target: target.with_flags(flags).with_alias(alias),
                    invocant_type,
                });
                Ok(())
            }
            Err(error) => self.report_symbol_error(&error),
        }
    }

    // -----------------------------------------------------------------------
    // Statement framing
    // -----------------------------------------------------------------------

    /// Starts a statement on `line`.
    pub fn begin_statement(&mut self, line: u32) {
        self.line = line;
        self.pending_instruction = None;
        self.statement_start = self.current.as_ref().map_or(0, |sub| sub.statements.len());
    }

    /// Moves the diagnostic line without starting a statement.
    pub fn set_line(&mut self, line: u32) {
        self.line = line;
    }

    /// Binds `name` to the next statement of the open subroutine.
    pub fn set_label(&mut self, name: &str) -> BuildResult<()> {
        let sub = self.sub_mut()?;
        if sub.labels.contains_key(name) {
            return self.report(
                DiagnosticKind::DuplicateLabel,
                format!("label '{name}' is already defined"),
            );
        }
        let index = sub.statements.len();
        sub.labels.insert(name.to_string(), index);
        self.pending_label = Some(name.to_string());
        Ok(())
    }

    /// Ends the current statement.
    pub fn end_statement(&mut self) {
        if let Some(sub) = &self.current {
            for statement in sub.statements.iter().skip(self.statement_start) {
                match statement {
                    Statement::Instruction(instruction) => {
                        log::trace!("line {}: {instruction}", self.line);
                    }
                    Statement::Invocation(invocation) => {
                        log::trace!("line {}: {:?} invocation", self.line, invocation.kind);
                    }
                }
            }
        }
        self.pending_instruction = None;
    }

    /// Drops the partially built instruction after a syntax error. Labels
    /// and multi-line call blocks survive.
    pub fn recover_statement(&mut self) {
        if let Some(instruction) = self.pending_instruction.take() {
            log::trace!("discarding partial instruction '{}'", instruction.opcode);
        }
    }

    // -----------------------------------------------------------------------
    // Targets and operands
    // -----------------------------------------------------------------------

    /// `$P0`, `$I3`, ...
    pub fn register_target(&self, ty: ValueType, number: u32) -> Target {
        Target::register(ty, number)
    }

    /// A declared identifier used as a target. An undeclared name is
    /// reported and replaced by an `unknown` placeholder.
    pub fn symbol_target(&mut self, name: &str) -> BuildResult<Target> {
        match self.lookup(name) {
            Some(symbol) => Ok(Target::from_symbol(symbol)),
            None => self.undeclared(
                name,
                ValueType::Unknown,
                format!("symbol '{name}' not declared"),
            ),
        }
    }

    /// An identifier in value position: a symbol, else a named constant, else
    /// a reported `unknown` placeholder.
    pub fn identifier_value(&mut self, name: &str) -> BuildResult<Expression> {
        if self.lookup(name).is_none() {
            if let Some(constant) = self.lookup_const(name) {
                return Ok(Expression::Constant(constant.clone()));
            }
        }
        self.symbol_target(name).map(Expression::Target)
    }

    /// An identifier among opcode arguments: a symbol, a named constant, or
    /// else a label reference checked later by the label verifier.
    pub fn identifier_operand(&self, name: &str) -> Expression {
        if let Some(symbol) = self.lookup(name) {
            return Expression::Target(Target::from_symbol(symbol));
        }
        if let Some(constant) = self.lookup_const(name) {
            return Expression::Constant(constant.clone());
        }
        Expression::Label(name.to_string())
    }

    /// `object[key]`. Named objects must be declared pmc symbols.
    pub fn indexed_target(&mut self, object: PmcObject, key: Key) -> BuildResult<Target> {
        let target = match object {
            PmcObject::Register(number) => Target::register(ValueType::Pmc, number),
            PmcObject::Named(name) => self.checked_pmc(
                &name,
                format!("indexed object '{name}' not declared"),
                format!("indexed object '{name}' is not of type 'pmc'"),
            )?,
        };
        Ok(target.with_key(key))
    }

    /// A sub to invoke: a declared symbol or a `$P` register. An undeclared
    /// name is reported and replaced by a pmc placeholder.
    pub fn pmc_object(&mut self, object: PmcObject) -> BuildResult<Target> {
        match object {
            PmcObject::Register(number) => Ok(Target::register(ValueType::Pmc, number)),
            PmcObject::Named(name) => match self.lookup(&name) {
                Some(symbol) => Ok(Target::from_symbol(symbol)),
                None => self.undeclared(
                    &name,
                    ValueType::Pmc,
                    format!("symbol '{name}' not declared"),
                ),
            },
        }
    }

    /// Invocant of a method call; must be a declared pmc.
    pub fn invocant_target(&mut self, object: PmcObject) -> BuildResult<Target> {
        match object {
            PmcObject::Register(number) => Ok(Target::register(ValueType::Pmc, number)),
            PmcObject::Named(name) => self.checked_pmc(
                &name,
                format!("object '{name}' not declared"),
                format!("cannot invoke method: '{name}' is not of type 'pmc'"),
            ),
        }
    }

    /// Method given by identifier; must be a declared pmc or string.
    pub fn method_target(&mut self, name: &str) -> BuildResult<Expression> {
        let Some(symbol) = self.lookup(name) else {
            return self
                .undeclared(
                    name,
                    ValueType::Pmc,
                    format!("method identifier '{name}' not declared"),
                )
                .map(Expression::Target);
        };
        let target = Target::from_symbol(symbol);
        if !matches!(symbol.ty, ValueType::Pmc | ValueType::String) {
            self.report(
                DiagnosticKind::TypeMismatch,
                format!("method '{name}' must be of type 'pmc' or 'string'"),
            )?;
        }
        Ok(Expression::Target(target))
    }

    // -----------------------------------------------------------------------
    // Instructions
    // -----------------------------------------------------------------------

    /// Starts `opcode arg, arg, ...`; operands follow through
    /// [`Builder::push_operand`].
    pub fn begin_instruction(&mut self, opcode: &str) {
        self.pending_instruction = Some(Instruction::new(opcode));
    }

    /// Appends an operand to the instruction started by
    /// [`Builder::begin_instruction`].
    pub fn push_operand(&mut self, operand: Expression) {
        if let Some(instruction) = self.pending_instruction.as_mut() {
            instruction.push(operand);
        }
    }

    /// Validates the opcode, reduces, and appends the pending instruction.
    /// An unknown opcode is reported and the instruction kept as written.
    pub fn finish_instruction(&mut self) -> BuildResult<()> {
        let Some(instruction) = self.pending_instruction.take() else {
            return Ok(());
        };
        if !self.opcodes.contains(&instruction.opcode) {
            self.report(
                DiagnosticKind::UnknownOpcode,
                format!("'{}' is not a parrot instruction", instruction.opcode),
            )?;
            return self.emit(Statement::Instruction(instruction));
        }
        self.emit_reduced(instruction)
    }

    /// Emits `opcode operands...` in one call.
    pub fn parrot_instruction(
        &mut self,
        opcode: &str,
        operands: Vec<Expression>,
    ) -> BuildResult<()> {
        self.begin_instruction(opcode);
        for operand in operands {
            self.push_operand(operand);
        }
        self.finish_instruction()
    }

    /// `object[key] = value`
    pub fn keyed_store(
        &mut self,
        object: PmcObject,
        key: Key,
        value: Expression,
    ) -> BuildResult<()> {
        let target = self.indexed_target(object, key)?;
        self.emit_op("set", [Expression::Target(target), value])
    }

    /// `null T`
    pub fn null_target(&mut self, target: Target) -> BuildResult<()> {
        self.emit_op("null", [Expression::Target(target)])
    }

    /// `.get_results (targets)`
    pub fn get_results(&mut self, targets: Vec<Target>) -> BuildResult<()> {
        self.emit_op("get_results", targets.into_iter().map(Expression::Target))
    }

    /// `goto L`
    pub fn goto_label(&mut self, label: &str) -> BuildResult<()> {
        self.emit_op("branch", [Expression::Label(label.to_string())])
    }

    // -----------------------------------------------------------------------
    // Assignments
    // -----------------------------------------------------------------------

    /// `T = 42`; zero becomes `null T`.
    pub fn assign_int(&mut self, target: Target, value: i64) -> BuildResult<()> {
        if value == 0 {
            return self.null_target(target);
        }
        self.emit_op("set", [target.into(), Constant::int(value).into()])
    }

    /// `T = 1.5`; zero becomes `null T`.
    pub fn assign_num(&mut self, target: Target, value: f64) -> BuildResult<()> {
        if value == 0.0 {
            return self.null_target(target);
        }
        self.emit_op("set", [target.into(), Constant::num(value).into()])
    }

    /// `T = "text"`
    pub fn assign_string(&mut self, target: Target, value: &str) -> BuildResult<()> {
        self.emit_op("set", [target.into(), Constant::string(value).into()])
    }

    /// `T = E` for a target or keyed value.
    pub fn assign_expression(&mut self, target: Target, value: Expression) -> BuildResult<()> {
        if let Expression::Constant(constant) = &value {
            match constant.value {
                ConstValue::Int(int) => return self.assign_int(target, int),
                ConstValue::Num(num) => return self.assign_num(target, num),
                _ => {}
            }
        }
        self.emit_op("set", [target.into(), value])
    }

    /// `T = A op B`. Two constants fold to `set T, C`; otherwise the op is
    /// emitted (dropping `A` when it is `T`) and strength-reduced.
    pub fn assign_binary(
        &mut self,
        target: Target,
        left: Expression,
        op: BinaryOp,
        right: Expression,
    ) -> BuildResult<()> {
        if let (Expression::Constant(a), Expression::Constant(b)) = (&left, &right) {
            return match fold::fold(a, op, b) {
                Ok(folded) => self.emit_op("set", [target.into(), folded.into()]),
                Err(error) => self.report_fold_error(&error),
            };
        }

        let mut instruction = Instruction::new(op.opcode());
        instruction.push_target(target.clone());
        if left.as_target() != Some(&target) {
            instruction.push(left);
        }
        instruction.push(right);
        self.emit_reduced(instruction)
    }

    /// `T = -E`, `T = !E`, `T = ~E`
    pub fn assign_unary(
        &mut self,
        target: Target,
        op: UnaryOp,
        value: Expression,
    ) -> BuildResult<()> {
        self.emit_op(op.opcode(), [target.into(), value])
    }

    /// `T = name` or `T = opcode args...`.
    ///
    /// Without arguments a declared symbol or constant wins (`set T, name`),
    /// then an opcode (`opcode T`). With arguments `name` must be an opcode.
    pub fn assign_op(
        &mut self,
        target: Target,
        name: &str,
        operands: Vec<Expression>,
    ) -> BuildResult<()> {
        if operands.is_empty() {
            if let Some(symbol) = self.lookup(name) {
                let source = Target::from_symbol(symbol);
                return self.emit_op("set", [target.into(), source.into()]);
            }
            if let Some(constant) = self.lookup_const(name) {
                let constant = constant.clone();
                return self.emit_op("set", [target.into(), constant.into()]);
            }
            if self.opcodes.contains(name) {
                return self.emit_op(name, [target.into()]);
            }
            return self.report(
                DiagnosticKind::UndeclaredSymbol,
                format!("'{name}' is neither a declared symbol nor a parrot opcode"),
            );
        }

        if !self.opcodes.contains(name) {
            return self.report(
                DiagnosticKind::UnknownOpcode,
                format!("'{name}' is not a parrot op"),
            );
        }
        let mut instruction = Instruction::new(name);
        instruction.push_target(target);
        for operand in operands {
            instruction.push(operand);
        }
        self.emit_reduced(instruction)
    }

    /// `T = name[key]`: a keyed read from a pmc symbol, else
    /// `opcode T, [key]`.
    pub fn assign_keyed(&mut self, target: Target, name: &str, key: Key) -> BuildResult<()> {
        if self.lookup(name).is_none() && self.opcodes.contains(name) {
            return self.emit_op(name, [target.into(), key.into()]);
        }
        let source = self.indexed_target(PmcObject::Named(name.to_string()), key)?;
        self.emit_op("set", [target.into(), source.into()])
    }

    /// `T op= E`
    pub fn augmented_assign(
        &mut self,
        target: Target,
        op: BinaryOp,
        value: Expression,
    ) -> BuildResult<()> {
        let mut instruction = Instruction::new(op.opcode());
        instruction.push_target(target).push(value);
        self.emit_reduced(instruction)
    }

    // -----------------------------------------------------------------------
    // Conditionals
    // -----------------------------------------------------------------------

    /// `if name goto L` / `unless null name goto L` on an identifier.
    pub fn conditional_var(
        &mut self,
        polarity: Polarity,
        null_check: bool,
        name: &str,
        label: &str,
    ) -> BuildResult<Condition> {
        if !null_check && self.lookup(name).is_none() {
            if let Some(constant) = self.lookup_const(name) {
                // Pmc constants are tested at runtime.
                if constant.value_type() == ValueType::Pmc {
                    let target = Target::from_symbol(&Symbol::placeholder(name, ValueType::Pmc));
                    return self.conditional_target(polarity, false, target, label);
                }
                let constant = constant.clone();
                return self.conditional_const(polarity, &constant, label);
            }
        }
        let target = self.symbol_target(name)?;
        self.conditional_target(polarity, null_check, target, label)
    }

    /// `if $P0 goto L` and friends on an already resolved target.
    pub fn conditional_target(
        &mut self,
        polarity: Polarity,
        null_check: bool,
        target: Target,
        label: &str,
    ) -> BuildResult<Condition> {
        let instruction = branch::variable_branch(polarity, null_check, target, label);
        self.emit(Statement::Instruction(instruction))?;
        Ok(Condition::Runtime)
    }

    /// `if CONST goto L`: `branch L` or `noop`, decided now.
    pub fn conditional_const(
        &mut self,
        polarity: Polarity,
        constant: &Constant,
        label: &str,
    ) -> BuildResult<Condition> {
        let value = truth::truthy(constant).map_err(|error| Fatal::Internal {
            message: error.to_string(),
        })?;
        self.emit(Statement::Instruction(branch::constant_branch(
            polarity, value, label,
        )))?;
        Ok(Condition::Constant(value))
    }

    /// `if A op B goto L`. Two constants are compared now; otherwise the
    /// comparison opcode is emitted, inverted for `unless`.
    pub fn conditional_relation(
        &mut self,
        polarity: Polarity,
        left: Expression,
        op: RelOp,
        right: Expression,
        label: &str,
    ) -> BuildResult<Condition> {
        if let (Expression::Constant(a), Expression::Constant(b)) = (&left, &right) {
            match fold::evaluate(a, op, b) {
                Ok(value) => {
                    self.emit(Statement::Instruction(branch::constant_branch(
                        polarity, value, label,
                    )))?;
                    return Ok(Condition::Constant(value));
                }
                // Left for the VM to decide.
                Err(error) => self.report_fold_error(&error)?,
            }
        }
        let instruction = branch::relational_branch(polarity, op, left, right, label);
        self.emit(Statement::Instruction(instruction))?;
        Ok(Condition::Runtime)
    }

    // -----------------------------------------------------------------------
    // Declarations
    // -----------------------------------------------------------------------

    /// `.local type a, b :unique_reg, ...`
    pub fn declare_locals(&mut self, ty: ValueType, names: &[(String, bool)]) -> BuildResult<()> {
        for (name, unique_reg) in names {
            let declared = self
                .sub_mut()?
                .symbols
                .declare(name, ty, *unique_reg)
                .map(|_| ());
            if let Err(error) = declared {
                self.report_symbol_error(&error)?;
            }
        }
        Ok(())
    }

    /// `.lex "name", object`
    pub fn declare_lexical(&mut self, name: &str, object: PmcObject) -> BuildResult<()> {
        let mut target = match object {
            PmcObject::Register(number) => Target::register(ValueType::Pmc, number),
            PmcObject::Named(id) => self.checked_pmc(
                &id,
                format!("lexical '{id}' is not declared"),
                format!("lexical '{id}' must be of type 'pmc'"),
            )?,
        };
        target.lex_name = Some(name.to_string());
        self.sub_mut()?.lexicals.push(Lexical {
            name: name.to_string(),
            target,
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Invocations
    // -----------------------------------------------------------------------

    /// `(results) = call`, `T = call`, or a bare `call`.
    pub fn short_invocation(
        &mut self,
        mut invocation: Invocation,
        results: Vec<Target>,
    ) -> BuildResult<()> {
        invocation.results = results;
        self.emit(Statement::Invocation(invocation))
    }

    /// `.tailcall call`
    pub fn tailcall(&mut self, mut invocation: Invocation) -> BuildResult<()> {
        invocation.kind = match invocation.kind {
            CallKind::Method => CallKind::MethodTailcall,
            _ => CallKind::Tailcall,
        };
        self.emit(Statement::Invocation(invocation))
    }

    /// `.return (args)`
    pub fn return_values(&mut self, arguments: Vec<Argument>) -> BuildResult<()> {
        self.emit(Statement::Invocation(Invocation {
            arguments,
            ..Invocation::new(CallKind::Return)
        }))
    }

    /// `.yield (args)`
    pub fn yield_values(&mut self, arguments: Vec<Argument>) -> BuildResult<()> {
        self.emit(Statement::Invocation(Invocation {
            arguments,
            ..Invocation::new(CallKind::Yield)
        }))
    }

    /// `.begin_call`
    pub fn begin_call(&mut self) {
        self.begin_block(CallKind::Pcc);
    }

    /// `.begin_return` (`CallKind::Return`) or `.begin_yield`
    /// (`CallKind::Yield`).
    pub fn begin_return(&mut self, kind: CallKind) {
        self.begin_block(kind);
        if let Some(pending) = self.pending_call.as_mut() {
            pending.has_target = true;
        }
    }

    fn begin_block(&mut self, kind: CallKind) {
        self.pending_call = Some(PendingCall {
            invocation: Invocation::new(kind),
            has_target: false,
        });
    }

    /// `.set_arg`, `.set_return`, `.set_yield`
    pub fn set_arg(&mut self, argument: Argument) -> BuildResult<()> {
        self.pending_mut()?.invocation.arguments.push(argument);
        Ok(())
    }

    /// `.call sub` or `.call sub, retcont`
    pub fn call_target(&mut self, callee: Target, retcont: Option<Target>) -> BuildResult<()> {
        let pending = self.pending_mut()?;
        pending.invocation.kind = CallKind::Pcc;
        pending.invocation.callee = Some(callee.into());
        pending.invocation.retcont = retcont;
        pending.has_target = true;
        Ok(())
    }

    /// `.nci_call sub`
    pub fn nci_call_target(&mut self, callee: Target) -> BuildResult<()> {
        let pending = self.pending_mut()?;
        pending.invocation.kind = CallKind::Nci;
        pending.invocation.callee = Some(callee.into());
        pending.has_target = true;
        Ok(())
    }

    /// `.invocant obj`
    pub fn set_invocant(&mut self, invocant: Target) -> BuildResult<()> {
        let pending = self.pending_mut()?;
        pending.invocation.kind = CallKind::Method;
        pending.invocation.callee = Some(invocant.into());
        Ok(())
    }

    /// `.meth_call method`
    pub fn method_call_target(&mut self, method: Expression) -> BuildResult<()> {
        let pending = self.pending_mut()?;
        pending.invocation.kind = CallKind::Method;
        pending.invocation.method = Some(method);
        pending.has_target = pending.invocation.callee.is_some();
        Ok(())
    }

    /// `.get_result target`
    pub fn get_result(&mut self, target: Target) -> BuildResult<()> {
        self.pending_mut()?.invocation.results.push(target);
        Ok(())
    }

    /// `.end_call`, `.end_return`, `.end_yield`: emits the assembled block.
    pub fn end_call(&mut self) -> BuildResult<()> {
        let Some(pending) = self.pending_call.take() else {
            return self.syntax_error("end of call block without a matching begin");
        };
        if !pending.has_target {
            return self.syntax_error("call block has no '.call', '.nci_call', or '.meth_call'");
        }
        self.emit(Statement::Invocation(pending.invocation))
    }

    /// Returns `true` while a `.begin_*` block is open.
    pub fn in_call_block(&self) -> bool {
        self.pending_call.is_some()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn sub_mut(&mut self) -> BuildResult<&mut Subroutine> {
        self.current.as_mut().ok_or_else(|| Fatal::Internal {
            message: "no subroutine is open".to_string(),
        })
    }

    fn pending_mut(&mut self) -> BuildResult<&mut PendingCall> {
        self.pending_call.as_mut().ok_or_else(|| Fatal::Internal {
            message: "no call block is open".to_string(),
        })
    }

    fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.current.as_ref()?.symbols.lookup(name)
    }

    fn lookup_const(&self, name: &str) -> Option<&Constant> {
        self.current
            .as_ref()
            .and_then(|sub| sub.constants.get(name))
            .or_else(|| self.unit.constants.get(name))
            .or_else(|| self.unit.global_constants.get(name))
    }

    fn undeclared(&mut self, name: &str, ty: ValueType, message: String) -> BuildResult<Target> {
        self.report(DiagnosticKind::UndeclaredSymbol, message)?;
        Ok(Target::from_symbol(&Symbol::placeholder(name, ty)))
    }

    /// Resolves `name` as a pmc symbol. Undeclared names get a pmc
    /// placeholder; other types are reported but still used.
    fn checked_pmc(
        &mut self,
        name: &str,
        undeclared: String,
        mismatch: String,
    ) -> BuildResult<Target> {
        let Some(symbol) = self.lookup(name) else {
            return self.undeclared(name, ValueType::Pmc, undeclared);
        };
        let target = Target::from_symbol(symbol);
        if symbol.ty != ValueType::Pmc {
            self.report(DiagnosticKind::TypeMismatch, mismatch)?;
        }
        Ok(target)
    }

    fn report_symbol_error(&mut self, error: &SymbolError) -> BuildResult<()> {
        match error {
            SymbolError::Duplicate { .. } => {
                self.report(DiagnosticKind::DuplicateSymbol, error.to_string())
            }
        }
    }

    fn report_fold_error(&mut self, error: &FoldError) -> BuildResult<()> {
        let kind = match error {
            FoldError::DivideByZero => DiagnosticKind::DivideByZero,
            FoldError::UnsupportedOperator { .. } => DiagnosticKind::UnsupportedOperator,
        };
        self.report(kind, error.to_string())
    }

    fn emit_op(
        &mut self,
        opcode: &str,
        operands: impl IntoIterator<Item = Expression>,
    ) -> BuildResult<()> {
        self.emit(Statement::Instruction(Instruction::with_operands(
            opcode, operands,
        )))
    }

    fn emit_reduced(&mut self, mut instruction: Instruction) -> BuildResult<()> {
        if reduce::reduce(&mut instruction) == Reduction::DivideByZero {
            self.report(DiagnosticKind::DivideByZero, FoldError::DivideByZero.to_string())?;
        }
        self.emit(Statement::Instruction(instruction))
    }

    fn emit(&mut self, mut statement: Statement) -> BuildResult<()> {
        if self.aborted {
            return Err(self.too_many_errors());
        }
        let label = self.pending_label.take();
        let sub = self.sub_mut()?;
        if let Some(label) = label {
            statement.set_label(label);
        }
        sub.statements.push(statement);
        Ok(())
    }
}
