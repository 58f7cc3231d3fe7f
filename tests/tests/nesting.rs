//! Flux et sources trop imbriqués : refusés par une erreur, jamais par la pile.

use esbc_compiler::{EncodeError, FunctionSpec, ProgramSpec};
use esbc_core::{DecodeError, MAX_NESTING};
use esbc_tests::{encode, TestResult};

#[test]
fn unterminated_operator_chain_is_too_deep() {
    let mut bytes = vec![0x01, 0xFF, 0x00, 0x30];
    bytes.extend(std::iter::repeat(0x50).take(1_000_000));
    let err = esbc_decompiler::decompile(&bytes).unwrap_err();
    assert_eq!(err, DecodeError::TooDeep { offset: 3 + MAX_NESTING, max: MAX_NESTING });
}

#[test]
fn deep_parentheses_do_not_encode() {
    let body = format!("print({}1{})", "(".repeat(2_000), ")".repeat(2_000));
    let err = esbc_compiler::encode(&ProgramSpec::main_only(body)).unwrap_err();
    assert!(matches!(err, EncodeError::TooDeep { ref function, max: MAX_NESTING } if function == "main"));
}

#[test]
fn deep_else_if_chain_does_not_encode() {
    let chain = format!("if n == 0 {{ return 0 }}{}", " else if n == 1 { return 1 }".repeat(1_000));
    let spec = ProgramSpec { functions: vec![FunctionSpec::new("pick", "n", chain)], main_body: "print(pick(1))".into() };
    assert!(matches!(esbc_compiler::encode(&spec), Err(EncodeError::TooDeep { .. })));
}

#[test]
fn ordinary_depth_still_round_trips() -> TestResult {
    let body = format!("print({}1{})", "(1 + ".repeat(100), ")".repeat(100));
    let bc = encode(&ProgramSpec::main_only(body))?;
    let text = esbc_decompiler::decompile(bc.as_bytes())?;
    assert_eq!(encode(&ProgramSpec::from_source(&text)?)?, bc);
    Ok(())
}
