//! Helpers for parsing attributes.

use syn::{parse::Parse, Attribute, Expr, Lit, Meta, Token};

/// Parser for the arguments of one attribute, such as `#[record(...)]`.
pub struct AttrParser {
    name: &'static str,
}

impl AttrParser {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }

    /// Is the flag `flag` present, as in `#[record(flag)]`?
    pub fn has_bool(&self, attrs: &[Attribute], flag: &str) -> bool {
        let mut found = false;
        self.for_each(attrs, |meta| {
            if meta.input.peek(Token![=]) {
                meta.value()?.parse::<Expr>()?;
            } else if meta.path.is_ident(flag) {
                found = true;
            }
            Ok(())
        });
        found
    }

    /// The value of `key`, as in `#[record(key = value)]`.
    pub fn get_arg<T: Parse>(&self, attrs: &[Attribute], key: &str) -> Option<T> {
        let mut arg = None;
        self.for_each(attrs, |meta| {
            if meta.input.peek(Token![=]) {
                let value = meta.value()?;
                if meta.path.is_ident(key) {
                    arg = Some(value.parse()?);
                } else {
                    value.parse::<Expr>()?;
                }
            }
            Ok(())
        });
        arg
    }

    fn for_each(
        &self,
        attrs: &[Attribute],
        mut f: impl FnMut(&syn::meta::ParseNestedMeta) -> syn::Result<()>,
    ) {
        for attr in attrs.iter().filter(|attr| attr.path().is_ident(self.name)) {
            if let Err(err) = attr.parse_nested_meta(|meta| f(&meta)) {
                panic!("malformed #[{}] attribute: {err}", self.name);
            }
        }
    }
}

/// Collect the doc comments in `attrs` into a single string.
pub fn parse_docs(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter_map(|attr| {
            let Meta::NameValue(meta) = &attr.meta else {
                return None;
            };
            if !meta.path.is_ident("doc") {
                return None;
            }
            match &meta.value {
                Expr::Lit(lit) => match &lit.lit {
                    Lit::Str(s) => Some(s.value().trim().to_string()),
                    _ => None,
                },
                _ => None,
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
