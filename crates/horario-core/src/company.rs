//! Company identity resolution
//!
//! The same company reaches this engine under different ids, names, casing
//! and accents from three independent feeds (assignments, contracts and
//! schedule entries). [`CompanyIdentity::resolve`] collapses all of them into
//! one canonical `{id, name}` pair, and every "no company" variant into the
//! single sentinel identity.
//!
//! Resolution is pure and total: it never fails and never allocates state.
//! Callers that resolve many references against a directory should build a
//! normalized lookup map once per load (see [`crate::CompanyDirectory`]).

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::CompanyIdentity;

/// Id of the sentinel "no company" identity
pub const UNASSIGNED_COMPANY_ID: &str = "unassigned";

/// Display name of the sentinel "no company" identity
pub const UNASSIGNED_COMPANY_NAME: &str = "Sin empresa asignada";

pub(crate) const ID_KEY_PREFIX: &str = "id:";
pub(crate) const NAME_KEY_PREFIX: &str = "name:";

/// Literal ids that mean "nothing here"
const UNASSIGNED_ID_LITERALS: &[&str] = &["0", "null", "undefined"];

/// Folded names that mean "no company"
const UNASSIGNED_NAMES: &[&str] = &[
    "sin empresa",
    "sin empresa asignada",
    "sin asignar",
    "empresa no asignada",
    "no asignada",
    "ninguna",
    "unassigned",
    "no company",
    "none",
];

impl CompanyIdentity {
    /// Canonicalize a raw `(companyId, companyName)` pair.
    ///
    /// | id          | name        | result                      |
    /// |-------------|-------------|-----------------------------|
    /// | unassigned  | unassigned  | sentinel                    |
    /// | present     | present     | `{trim(id), trim(name)}`    |
    /// | present     | unassigned  | `{id, id}`                  |
    /// | unassigned  | present     | `{slug(name), name}`        |
    pub fn resolve(id: Option<&str>, name: Option<&str>) -> Self {
        let id = id.map(str::trim).filter(|id| !id_is_unassigned(id));
        let name = name.map(str::trim).filter(|name| !name_is_unassigned(name));

        match (id, name) {
            (Some(id), Some(name)) => Self {
                id: id.to_string(),
                name: name.to_string(),
            },
            (Some(id), None) => Self {
                id: id.to_string(),
                name: id.to_string(),
            },
            (None, Some(name)) => {
                let slug = slugify(name);
                Self {
                    // A name made only of symbols has no slug; the name itself
                    // is then the most stable id available
                    id: if slug.is_empty() { name.to_string() } else { slug },
                    name: name.to_string(),
                }
            }
            (None, None) => Self::unassigned(),
        }
    }
}

/// Does this raw id mean "no company"?
pub fn id_is_unassigned(id: &str) -> bool {
    let id = id.trim();
    if id.is_empty() {
        return true;
    }
    let lowered = id.to_lowercase();
    lowered == UNASSIGNED_COMPANY_ID
        || lowered.starts_with(&format!("{UNASSIGNED_COMPANY_ID}-"))
        || UNASSIGNED_ID_LITERALS.contains(&lowered.as_str())
}

/// Does this raw name mean "no company"? Case and accent insensitive.
pub fn name_is_unassigned(name: &str) -> bool {
    let folded = fold_text(name);
    folded.is_empty() || UNASSIGNED_NAMES.contains(&folded.as_str())
}

/// Lowercase, strip diacritics, trim and collapse inner whitespace.
///
/// ```
/// assert_eq!(horario_core::fold_text("  José   PÉREZ "), "jose perez");
/// ```
pub fn fold_text(text: &str) -> String {
    let stripped: String = text.nfd().filter(|c| !is_combining_mark(*c)).collect();
    stripped
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fold and collapse every run of non-alphanumerics into a single `-`
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for c in fold_text(text).chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

pub(crate) fn id_key(id: &str) -> String {
    format!("{ID_KEY_PREFIX}{}", fold_text(id))
}

pub(crate) fn name_key(name: &str) -> String {
    format!("{NAME_KEY_PREFIX}{}", fold_text(name))
}

/// Two identities refer to the same company if either axis matches
pub fn same_company(a: &CompanyIdentity, b: &CompanyIdentity) -> bool {
    a.id_key() == b.id_key() || a.name_key() == b.name_key()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolve(id: Option<&str>, name: Option<&str>) -> CompanyIdentity {
        CompanyIdentity::resolve(id, name)
    }

    #[test]
    fn both_unassigned_yields_sentinel() {
        for id in [None, Some(""), Some("0"), Some("null"), Some("undefined"), Some("unassigned-3")] {
            for name in [None, Some(""), Some("Sin Empresa"), Some("SIN EMPRESA ASIGNADA"), Some(" sin  empresa ")] {
                assert_eq!(resolve(id, name), CompanyIdentity::unassigned(), "{id:?} / {name:?}");
            }
        }
    }

    #[test]
    fn accented_unassigned_phrase_is_recognized() {
        assert!(name_is_unassigned("Sín Émpresa"));
        assert!(name_is_unassigned("NINGUNA"));
        assert!(!name_is_unassigned("Acme"));
    }

    #[test]
    fn id_and_name_are_trimmed() {
        assert_eq!(
            resolve(Some(" c1 "), Some(" Acme ")),
            CompanyIdentity { id: "c1".into(), name: "Acme".into() }
        );
    }

    #[test]
    fn id_doubles_as_name() {
        assert_eq!(
            resolve(Some("c1"), Some("sin empresa")),
            CompanyIdentity { id: "c1".into(), name: "c1".into() }
        );
    }

    #[test]
    fn name_only_gets_slug_id() {
        assert_eq!(
            resolve(None, Some("Construcciones Pérez & Hijos, S.L.")),
            CompanyIdentity {
                id: "construcciones-perez-hijos-s-l".into(),
                name: "Construcciones Pérez & Hijos, S.L.".into(),
            }
        );
    }

    #[test]
    fn symbol_only_name_keeps_name_as_id() {
        let identity = resolve(None, Some("???"));
        assert_eq!(identity.id, "???");
        assert_eq!(resolve(Some(&identity.id), Some(&identity.name)), identity);
    }

    #[test]
    fn resolution_is_total_and_idempotent() {
        let samples = [None, Some(""), Some("0"), Some("Sin Empresa"), Some("ACME"), Some(" acme ")];
        for id in samples {
            for name in samples {
                let once = resolve(id, name);
                let twice = resolve(Some(&once.id), Some(&once.name));
                assert_eq!(twice, once, "{id:?} / {name:?}");
            }
        }
    }

    #[test]
    fn casing_and_accents_share_keys() {
        let a = resolve(Some("ACME"), Some("Café Ñandú"));
        let b = resolve(Some("acme"), Some("cafe nandu"));
        assert_eq!(a.id_key(), b.id_key());
        assert_eq!(a.name_key(), "name:cafe nandu");
        assert!(same_company(&a, &b));
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  --Hola,   Mundo!! "), "hola-mundo");
        assert_eq!(slugify("Año 2024"), "ano-2024");
    }
}
