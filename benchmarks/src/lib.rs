//! Corpus embarqué des benchmarks esbc (aucun fichier externe).

use esbc_compiler::{FunctionSpec, ProgramSpec};

/// Un programme de bench.
#[derive(Clone, Debug)]
pub struct Case {
    pub name: &'static str,
    pub spec: ProgramSpec,
}

/// Petits programmes typiques, puis un programme synthétique plus gros.
pub fn corpus() -> Vec<Case> {
    vec![
        Case { name: "tiny/sum", spec: ProgramSpec::main_only("print(17 + 25)") },
        Case {
            name: "mid/factorial",
            spec: ProgramSpec {
                functions: vec![FunctionSpec::new("fact", "n", "product(1..=n)")],
                main_body: "for i := 1..=12 {\n  print(fact(i))\n}".into(),
            },
        },
        Case {
            name: "mid/fizzbuzz",
            spec: ProgramSpec::main_only(
                "for i := 1..=100 {\n  if i % 15 == 0 {\n    printf(\"%s\\n\", \"FizzBuzz\")\n  } else if i % 3 == 0 {\n    printf(\"%s\\n\", \"Fizz\")\n  } else if i % 5 == 0 {\n    printf(\"%s\\n\", \"Buzz\")\n  } else {\n    print(i)\n  }\n}",
            ),
        },
        Case { name: "big/generated", spec: generated(64) },
    ]
}

/// `n` fonctions qui s'appellent en chaîne, plus un `main` qui les appelle toutes.
pub fn generated(n: usize) -> ProgramSpec {
    let functions = (0..n)
        .map(|k| {
            let body = if k == 0 {
                "x := n\nwhile x > 0 {\n  x = x - 1\n}\nreturn x + a".to_owned()
            } else {
                format!("f{}(n - 1, a) * {k} + (n > a ? n : a)", k - 1)
            };
            FunctionSpec::new(format!("f{k}"), "n, a", body)
        })
        .collect();
    let main_body = (0..n).map(|k| format!("print(f{k}({k}, 3))")).collect::<Vec<_>>().join("\n");
    ProgramSpec { functions, main_body }
}
