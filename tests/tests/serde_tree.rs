//! L'arbre décodé et le conteneur se sérialisent (feature `serde`).

use esbc_ast::{Body, Program};
use esbc_compiler::ProgramSpec;
use esbc_core::Bytecode;
use esbc_tests::{encode, TestResult};
use pretty_assertions::assert_eq;

#[test]
fn decoded_tree_survives_json() -> TestResult {
    let spec = ProgramSpec::main_only(
        "for i := 1..=3 {\n  if i == 2 {\n    printf(\"%s\\n\", \"two\")\n  } else {\n    print(i)\n  }\n}",
    );
    let program = esbc_decompiler::decode(encode(&spec)?.as_bytes())?;
    let json = serde_json::to_string(&program)?;
    let back: Program = serde_json::from_str(&json)?;
    assert_eq!(back, program);
    assert!(matches!(&back.functions[0].body, Body::Block(stmts) if stmts.len() == 1));
    Ok(())
}

#[test]
fn bytecode_is_a_hex_string_in_json() -> TestResult {
    let bc = encode(&ProgramSpec::main_only("print(17 + 25)"))?;
    let json = serde_json::to_string(&bc)?;
    assert_eq!(json, "\"01ff0030507011701903\"");
    assert_eq!(serde_json::from_str::<Bytecode>(&json)?, bc);
    Ok(())
}
