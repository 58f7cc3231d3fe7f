//! Propriétés sur des programmes générés : encodage déterministe, décodage
//! total, point fixe après un aller-retour. Sur des octets quelconques, le
//! décodage rend toujours un résultat.

use esbc_compiler::{FunctionSpec, ProgramSpec};
use esbc_core::{DecodeError, MAX_NESTING};
use esbc_tests::{encode, round_trips};
use proptest::{prelude::*, sample::select};

/// Expressions entièrement parenthésées sur `leaves` et des entiers.
fn expr(leaves: Vec<&'static str>) -> impl Strategy<Value = String> {
    let leaf = prop_oneof![select(leaves).prop_map(str::to_owned), (0u16..400).prop_map(|v| v.to_string())];
    leaf.prop_recursive(3, 16, 2, |inner| {
        (inner.clone(), select(vec!["+", "-", "*", "/", "%", "<", ">=", "==", "&&"]), inner)
            .prop_map(|(l, op, r)| format!("({l} {op} {r})"))
    })
}

fn statement() -> impl Strategy<Value = String> {
    prop_oneof![
        expr(vec!["7"]).prop_map(|e| format!("print({e})")),
        (expr(vec!["i"]), 1u8..5).prop_map(|(e, n)| format!("for i := 1..={n} {{\n  print({e})\n}}")),
        (expr(vec!["3"]), expr(vec!["4"])).prop_map(|(c, e)| format!("if {c} {{\n  print({e})\n}} else {{\n  print(0)\n}}")),
    ]
}

/// Corps de fonction : une expression, ou des lignes faites d'un seul nom
/// (`a` est aussi un mot courant d'une phrase).
fn body() -> impl Strategy<Value = String> {
    prop_oneof![
        expr(vec!["n", "a"]),
        prop::collection::vec(select(vec!["n", "a"]), 2..5).prop_map(|lines| lines.join("\n")),
    ]
}

fn program() -> impl Strategy<Value = ProgramSpec> {
    (prop::collection::vec(body(), 0..3), prop::collection::vec(statement(), 1..4)).prop_map(
        |(bodies, stmts)| {
            let functions: Vec<_> =
                bodies.into_iter().enumerate().map(|(k, b)| FunctionSpec::new(format!("g{k}"), "n, a", b)).collect();
            let calls: Vec<String> = (0..functions.len()).map(|k| format!("print(g{k}(1, 2))")).collect();
            ProgramSpec { functions, main_body: [stmts, calls].concat().join("\n") }
        },
    )
}

/// En-tête de fonction puis octets tirés surtout parmi les opcodes qui ouvrent
/// une imbrication (opérateurs, `PRINT`, `IF`, `WHILE`, `ELSE`).
fn nesting_bytes() -> impl Strategy<Value = Vec<u8>> {
    let byte = prop_oneof![
        4 => select(vec![0x11u8, 0x12, 0x13, 0x30, 0x40, 0x50, 0x60, 0x66, 0x79]),
        2 => select(vec![0x70u8, 0x01, 0x72, 0x00, 0x03]),
        1 => any::<u8>(),
    ];
    (select(vec![vec![0x01u8, 0xFF, 0x00], vec![0x02, 0x00, 0x02]]), prop::collection::vec(byte, 0..600))
        .prop_map(|(head, tail)| [head, tail].concat())
}

fn fail(e: impl std::fmt::Display) -> TestCaseError { TestCaseError::fail(e.to_string()) }

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn encoding_is_deterministic(spec in program()) {
        let a = encode(&spec).map_err(fail)?;
        let b = encode(&spec).map_err(fail)?;
        prop_assert_eq!(a, b);
    }

    #[test]
    fn encoded_streams_always_decode(spec in program()) {
        let bc = encode(&spec).map_err(fail)?;
        let text = esbc_decompiler::decompile(bc.as_bytes()).map_err(fail)?;
        prop_assert!(text.ends_with("}\n"), "text must end with a closing brace: {text:?}");
    }

    #[test]
    fn arbitrary_bytes_decode_or_fail(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        for err in [esbc_decompiler::decompile(&bytes).err(), esbc_core::disasm::listing(&bytes).err()].into_iter().flatten() {
            prop_assert!(err.offset().is_some_and(|at| at <= bytes.len()), "{err}");
        }
    }

    #[test]
    fn nested_bytes_decode_or_fail(bytes in nesting_bytes()) {
        if let Err(e) = esbc_decompiler::decompile(&bytes) {
            prop_assert!(e.offset().is_some_and(|at| at <= bytes.len()), "{e}");
        }
    }

    #[test]
    fn operator_chains_stop_at_the_cap(depth in 0usize..2 * MAX_NESTING) {
        // DEFX f0 = ADD ADD … INT 1 INT 1 … END
        let mut bytes = vec![0x02, 0x00, 0x00];
        bytes.extend(std::iter::repeat(0x50).take(depth));
        for _ in 0..=depth {
            bytes.extend([0x70, 0x01]);
        }
        bytes.push(0x03);
        match esbc_decompiler::decompile(&bytes) {
            Ok(_) => prop_assert!(depth < MAX_NESTING),
            Err(e) => prop_assert_eq!(e, DecodeError::TooDeep { offset: 3 + MAX_NESTING, max: MAX_NESTING }),
        }
    }

    #[test]
    fn one_round_trip_is_a_fixed_point(spec in program()) {
        let [_, b2, b3] = round_trips(&spec).map_err(fail)?;
        prop_assert_eq!(b2.to_hex(), b3.to_hex());
    }
}
