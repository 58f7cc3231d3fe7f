//! Entrée de l'encodeur : la description JSON d'un programme.
//!
//! ```json
//! { "functions": [ { "name": "fact", "params": "n", "body": "product(1..=n)" } ],
//!   "main_body": "print(fact(5))" }
//! ```
//!
//! `params` accepte une chaîne (`"a, b"`) ou une liste (`["a", "b"]`).
//! [`ProgramSpec::from_source`] relit le texte produit par le décompilateur
//! dans la même structure.

use serde::{Deserialize, Deserializer, Serialize};

use crate::{scan, EncodeError, EncodeResult};

/// Programme à encoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSpec {
    /// Fonctions, dans l'ordre de déclaration.
    #[serde(default)]
    pub functions: Vec<FunctionSpec>,
    /// Corps de `main` quand aucune fonction `main` n'est déclarée.
    #[serde(default)]
    pub main_body: String,
}

/// Une fonction déclarée.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpec {
    /// Nom source (`main` pour le point d'entrée).
    pub name: String,
    /// Paramètres séparés par des virgules.
    #[serde(default, deserialize_with = "params_or_list")]
    pub params: String,
    /// Corps : expression unique ou bloc d'instructions.
    #[serde(default)]
    pub body: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Params {
    Joined(String),
    List(Vec<String>),
}

fn params_or_list<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Option::<Params>::deserialize(d)? {
        None => String::new(),
        Some(Params::Joined(s)) => s,
        Some(Params::List(v)) => v.join(", "),
    })
}

impl FunctionSpec {
    /// Construit une fonction.
    pub fn new(name: impl Into<String>, params: impl Into<String>, body: impl Into<String>) -> Self {
        Self { name: name.into(), params: params.into(), body: body.into() }
    }

    /// Noms des paramètres, dans l'ordre (vides ignorés).
    pub fn param_names(&self) -> Vec<&str> {
        self.params.split(',').map(str::trim).filter(|p| !p.is_empty()).collect()
    }

    /// Est-ce le point d'entrée ?
    pub fn is_main(&self) -> bool { self.name == "main" }
}

impl ProgramSpec {
    /// Programme réduit à un corps de `main`.
    pub fn main_only(body: impl Into<String>) -> Self { Self { functions: Vec::new(), main_body: body.into() } }

    /// Lit une description JSON.
    pub fn from_json(text: &str) -> EncodeResult<Self> { Ok(serde_json::from_str(text)?) }

    /// Sérialise en JSON compact.
    pub fn to_json(&self) -> EncodeResult<String> { Ok(serde_json::to_string(self)?) }

    /// Relit un texte source décompilé :
    ///
    /// - `fn name(params) { … }` : fonction à corps bloc
    /// - `name(params) = expr` : fonction à une expression (une ligne)
    ///
    /// `fn main() { … }` est déclarée comme fonction `main`, ce qui la garde
    /// à sa position dans le flux ré-encodé.
    pub fn from_source(text: &str) -> EncodeResult<Self> {
        let mut spec = Self::default();
        let mut rest = text;
        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                return Ok(spec);
            }
            let at = text.len() - rest.len();
            let syntax = |message: &str| EncodeError::Syntax { offset: at, message: message.to_owned() };

            if let Some(after) = scan::after_keyword(rest, "fn") {
                let open = after.find('(').ok_or_else(|| syntax("expected `(` after function name"))?;
                let close = scan::matching_close(after, open).ok_or_else(|| syntax("unclosed parameter list"))?;
                let name = after[..open].trim();
                if !scan::is_identifier(name) {
                    return Err(syntax("invalid function name"));
                }
                let tail = after[close + 1..].trim_start();
                if !tail.starts_with('{') {
                    return Err(syntax("expected `{` to open the function body"));
                }
                let end = scan::matching_close(tail, 0).ok_or_else(|| syntax("unclosed function body"))?;
                spec.functions.push(FunctionSpec::new(name, after[open + 1..close].trim(), tail[1..end].trim()));
                rest = &tail[end + 1..];
            } else {
                let line_end = rest.find('\n').unwrap_or(rest.len());
                let line = &rest[..line_end];
                let open = line.find('(').ok_or_else(|| syntax("expected `fn` or `name(params) = expr`"))?;
                let close = scan::matching_close(line, open).ok_or_else(|| syntax("unclosed parameter list"))?;
                let name = line[..open].trim();
                let expr = line[close + 1..]
                    .trim_start()
                    .strip_prefix('=')
                    .filter(|e| !e.starts_with('='))
                    .ok_or_else(|| syntax("expected `=` after parameter list"))?;
                if !scan::is_identifier(name) {
                    return Err(syntax("invalid function name"));
                }
                spec.functions.push(FunctionSpec::new(name, line[open + 1..close].trim(), expr.trim()));
                rest = &rest[line_end..];
            }
        }
    }
}
