//! Scénarios bout en bout : description → octets → texte.

use esbc_compiler::{FunctionSpec, ProgramSpec};
use esbc_core::DecodeError;
use esbc_tests::{encode, TestResult};
use pretty_assertions::assert_eq;

fn decompile(spec: &ProgramSpec) -> TestResult<String> { Ok(esbc_decompiler::decompile(encode(spec)?.as_bytes())?) }

#[test]
fn literal_arithmetic() -> TestResult {
    let spec = ProgramSpec::from_json(r#"{"functions": [], "main_body": "print(17 + 25)"}"#)?;
    let bc = encode(&spec)?;
    assert_eq!(bc.to_hex(), "01ff0030507011701903");
    assert_eq!(esbc_decompiler::decompile(bc.as_bytes())?, "fn main() {\n  print(17 + 25)\n}\n");
    Ok(())
}

#[test]
fn range_aggregate() -> TestResult {
    let spec = ProgramSpec {
        functions: vec![FunctionSpec::new("fact", "n", "product(1..=n)")],
        main_body: "print(fact(5))".into(),
    };
    assert_eq!(decompile(&spec)?, "f0(n) = product(1..=n)\n\nfn main() {\n  print(f0(5))\n}\n");
    Ok(())
}

#[test]
fn factorial_reference_stream() -> TestResult {
    let spec = ProgramSpec::from_json(
        r#"{"functions": [{"name": "fact", "params": "n", "body": "product(1..=n)"}],
            "main_body": "for i := 1..=12 { print(fact(i)) }"}"#,
    )?;
    assert_eq!(encode(&spec)?.to_hex(), "02000140700172000301ff00107001700c30750001740303");
    Ok(())
}

#[test]
fn conditional_chain_stays_nested() -> TestResult {
    let spec = ProgramSpec::main_only(
        r#"for i := 1..=15 {
  if i % 15 == 0 {
    printf("%s\n", "FizzBuzz")
  } else if i % 3 == 0 {
    printf("%s\n", "Fizz")
  } else {
    print(i)
  }
}"#,
    );
    let text = decompile(&spec)?;
    assert_eq!(
        text,
        r#"fn main() {
  for i := 1..=15 {
    if i % 15 == 0 {
      printf("%s\n", "FizzBuzz")
    } el if i % 3 == 0 {
      printf("%s\n", "Fizz")
    } el {
      print(i)
    }
  }
}
"#
    );
    let count = |needle: &str| text.lines().filter(|l| l.trim_start().starts_with(needle)).count();
    assert_eq!((count("if "), count("} el if "), count("} el {")), (1, 1, 1));
    Ok(())
}

#[test]
fn elif_spelling_is_accepted() -> TestResult {
    let spec = ProgramSpec {
        functions: vec![FunctionSpec::new(
            "grade",
            "n",
            "if n > 90 {\n  return 1\n} elif n > 50 {\n  return 2\n} else {\n  return 3\n}",
        )],
        main_body: String::new(),
    };
    assert_eq!(
        decompile(&spec)?,
        "fn f0(n) {\n  if n > 90 {\n    return 1\n  } el if n > 50 {\n    return 2\n  } el {\n    return 3\n  }\n}\n"
    );
    Ok(())
}

#[test]
fn truncated_operand_names_its_offset() {
    // PRINT INT16 <un seul octet>
    let err = esbc_decompiler::decompile(&[0x01, 0xFF, 0x00, 0x30, 0x71, 0x00]).unwrap_err();
    assert_eq!(err, DecodeError::UnexpectedEof { offset: 5, needed: 1 });
    assert_eq!(err.offset(), Some(5));
    assert!(err.to_string().contains("offset 5"));
}

#[test]
fn missing_end_is_an_error() {
    let err = esbc_decompiler::decompile(&[0x01, 0xFF, 0x00, 0x30, 0x70, 0x01]).unwrap_err();
    assert!(matches!(err, DecodeError::UnexpectedEof { .. }), "{err}");
}

#[test]
fn prose_bodies_are_skipped_not_fatal() -> TestResult {
    let spec = ProgramSpec {
        functions: vec![
            FunctionSpec::new("helper", "n", "This function returns the value of n formatted"),
            FunctionSpec::new("inc", "n", "n + 1"),
        ],
        main_body: "print(inc(1))".into(),
    };
    assert_eq!(decompile(&spec)?, "f1(n) = n + 1\n\nfn main() {\n  print(f1(1))\n}\n");
    Ok(())
}
