use pirc::ir::branch::{constant_branch, relational_branch, variable_branch};
use pirc::ir::{
    reduce, Constant, Expression, Instruction, Polarity, Reduction, RelOp, Target, ValueType,
};

fn int_reg(number: u32) -> Target {
    Target::register(ValueType::Int, number)
}

fn instruction(opcode: &str, operands: Vec<Expression>) -> Instruction {
    Instruction::with_operands(opcode, operands)
}

fn reduced(opcode: &str, operands: Vec<Expression>) -> (String, Reduction) {
    let mut instruction = instruction(opcode, operands);
    let reduction = reduce(&mut instruction);
    (instruction.to_string(), reduction)
}

fn target(number: u32) -> Expression {
    int_reg(number).into()
}

fn int(value: i64) -> Expression {
    Constant::int(value).into()
}

// ===========================================================================
// Strength reduction
// ===========================================================================

#[test]
fn repeated_destination_is_dropped() {
    assert_eq!(
        reduced("add", vec![target(0), target(0), int(5)]),
        ("add $I0, 5".to_string(), Reduction::Reduced)
    );
    assert_eq!(
        reduced("mul", vec![target(0), target(0), target(1)]),
        ("mul $I0, $I1".to_string(), Reduction::Reduced)
    );
}

#[test]
fn distinct_operands_are_kept() {
    assert_eq!(
        reduced("add", vec![target(0), target(1), int(5)]),
        ("add $I0, $I1, 5".to_string(), Reduction::Unchanged)
    );
    // Only operand 1 is compared with the destination.
    assert_eq!(
        reduced("sub", vec![target(0), target(1), target(0)]),
        ("sub $I0, $I1, $I0".to_string(), Reduction::Unchanged)
    );
}

#[test]
fn identity_operations_become_noop() {
    for (opcode, value) in [("add", int(0)), ("sub", int(0)), ("mul", int(1)), ("div", int(1))] {
        assert_eq!(
            reduced(opcode, vec![target(0), value]),
            ("noop".to_string(), Reduction::Reduced)
        );
    }
    assert_eq!(
        reduced("fdiv", vec![target(0), Constant::num(1.0).into()]),
        ("noop".to_string(), Reduction::Reduced)
    );
    assert_eq!(
        reduced("sub", vec![target(0), Constant::num(0.0).into()]),
        ("noop".to_string(), Reduction::Reduced)
    );
}

#[test]
fn increments_and_null() {
    assert_eq!(
        reduced("add", vec![target(0), int(1)]),
        ("inc $I0".to_string(), Reduction::Reduced)
    );
    assert_eq!(
        reduced("sub", vec![target(0), int(1)]),
        ("dec $I0".to_string(), Reduction::Reduced)
    );
    assert_eq!(
        reduced("mul", vec![target(0), int(0)]),
        ("null $I0".to_string(), Reduction::Reduced)
    );
}

#[test]
fn self_add_one_becomes_inc() {
    assert_eq!(
        reduced("add", vec![target(2), target(2), int(1)]),
        ("inc $I2".to_string(), Reduction::Reduced)
    );
}

#[test]
fn division_by_constant_zero_is_flagged() {
    assert_eq!(
        reduced("div", vec![target(0), int(0)]),
        ("div $I0, 0".to_string(), Reduction::DivideByZero)
    );
    assert_eq!(
        reduced("fdiv", vec![target(0), Constant::num(0.0).into()]),
        ("fdiv $I0, 0.0".to_string(), Reduction::DivideByZero)
    );
}

#[test]
fn other_shapes_are_left_alone() {
    assert_eq!(
        reduced("add", vec![target(0), int(7)]),
        ("add $I0, 7".to_string(), Reduction::Unchanged)
    );
    assert_eq!(
        reduced("mul", vec![target(0), Constant::string("1").into()]),
        ("mul $I0, \"1\"".to_string(), Reduction::Unchanged)
    );
    assert_eq!(
        reduced("set", vec![target(0), int(0)]),
        ("set $I0, 0".to_string(), Reduction::Unchanged)
    );
    assert_eq!(
        reduced("mod", vec![target(0), int(1)]),
        ("mod $I0, 1".to_string(), Reduction::Unchanged)
    );
}

#[test]
fn reduction_keeps_the_label() {
    let mut add = instruction("add", vec![target(0), int(0)]);
    add.label = Some("L".to_string());
    reduce(&mut add);
    assert_eq!(add.to_string(), "L: noop");
}

// ===========================================================================
// Branch lowering
// ===========================================================================

#[test]
fn constant_conditions() {
    assert_eq!(constant_branch(Polarity::If, true, "L").to_string(), "branch L");
    assert_eq!(constant_branch(Polarity::If, false, "L").to_string(), "noop");
    assert_eq!(constant_branch(Polarity::Unless, true, "L").to_string(), "noop");
    assert_eq!(constant_branch(Polarity::Unless, false, "L").to_string(), "branch L");
}

#[test]
fn variable_conditions() {
    let cases = [
        (Polarity::If, false, "if $I0, L"),
        (Polarity::Unless, false, "unless $I0, L"),
        (Polarity::If, true, "if_null $I0, L"),
        (Polarity::Unless, true, "unless_null $I0, L"),
    ];
    for (polarity, null_check, expected) in cases {
        assert_eq!(
            variable_branch(polarity, null_check, int_reg(0), "L").to_string(),
            expected
        );
    }
}

#[test]
fn relational_conditions_invert_under_unless() {
    let lower = |polarity, op| relational_branch(polarity, op, target(0), int(3), "L").to_string();
    assert_eq!(lower(Polarity::If, RelOp::Lt), "lt $I0, 3, L");
    assert_eq!(lower(Polarity::Unless, RelOp::Lt), "ge $I0, 3, L");
    assert_eq!(lower(Polarity::Unless, RelOp::Le), "gt $I0, 3, L");
    assert_eq!(lower(Polarity::Unless, RelOp::Eq), "ne $I0, 3, L");
}

#[test]
fn inversion_is_an_involution() {
    for op in [RelOp::Ne, RelOp::Eq, RelOp::Lt, RelOp::Le, RelOp::Gt, RelOp::Ge] {
        assert_ne!(op.inverted(), op);
        assert_eq!(op.inverted().inverted(), op);
    }
}

#[test]
fn branch_labels_are_label_operands() {
    let branch = relational_branch(Polarity::If, RelOp::Eq, target(0), target(1), "DONE");
    assert_eq!(branch.label_operands().collect::<Vec<_>>(), vec!["DONE"]);
}
