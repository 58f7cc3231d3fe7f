//! Noms synthétiques : le flux ne garde aucun identifiant, le rendu en
//! fabrique des stables à partir des positions.

use std::borrow::Cow;

use esbc_ast::FuncId;
use esbc_core::FUNC_MAIN;

/// Paramètres, par position.
pub const PARAMS: [&str; 6] = ["n", "a", "b", "c", "d", "e"];
/// Locaux, par slot.
pub const LOCALS: [&str; 6] = ["acc", "d", "x", "y", "z", "w"];
/// Variables de boucle, par profondeur (0 = boucle la plus externe).
pub const LOOPS: [&str; 5] = ["i", "j", "k", "l", "m"];

/// Nom du paramètre `idx` (`p<idx>` au-delà du pool).
pub fn param(idx: u8) -> Cow<'static, str> { pooled(&PARAMS, usize::from(idx), "p") }

/// Nom du local `slot` (`v<slot>` au-delà du pool).
pub fn local(slot: u8) -> Cow<'static, str> { pooled(&LOCALS, usize::from(slot), "v") }

/// Nom de la variable de boucle à la profondeur `depth` (`i<depth>` au-delà).
pub fn loop_var(depth: usize) -> Cow<'static, str> { pooled(&LOOPS, depth, "i") }

/// `main` ou `f<id>`.
pub fn function(id: FuncId) -> Cow<'static, str> {
    if id == FUNC_MAIN {
        Cow::Borrowed("main")
    } else {
        Cow::Owned(format!("f{id}"))
    }
}

fn pooled(pool: &[&'static str], i: usize, prefix: &str) -> Cow<'static, str> {
    pool.get(i).map_or_else(|| Cow::Owned(format!("{prefix}{i}")), |&s| Cow::Borrowed(s))
}
