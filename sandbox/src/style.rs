//! Inline `style` attribute declarations.

#[cfg(test)]
#[path = "style_test.rs"]
mod style_test;

/// Ordered `property: value` declarations from one `style` attribute.
///
/// Property names are normalized to lowercase; values are kept verbatim.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineStyle {
    decls: Vec<(String, String)>,
}

impl InlineStyle {
    /// Parse a `style` attribute value. Declarations without a `:` are dropped.
    /// Semicolons inside quotes or parentheses (`url(data:...;base64,...)`) do
    /// not split declarations.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut style = Self::default();
        for decl in split_declarations(raw) {
            let Some((name, value)) = decl.split_once(':') else {
                continue;
            };
            let name = name.trim();
            let value = value.trim();
            if !name.is_empty() && !value.is_empty() {
                style.set(name, value);
            }
        }
        style
    }

    #[must_use]
    pub fn get(&self, property: &str) -> Option<&str> {
        let property = property.trim();
        self.decls
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
            .map(|(_, value)| value.as_str())
    }

    /// Set a declaration in place, or append it. An empty value removes it.
    pub fn set(&mut self, property: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            self.remove(property);
            return;
        }
        let property = property.trim().to_ascii_lowercase();
        if let Some(slot) = self.decls.iter_mut().find(|(name, _)| *name == property) {
            slot.1 = value.to_owned();
        } else {
            self.decls.push((property, value.to_owned()));
        }
    }

    /// Returns `true` if the declaration existed.
    pub fn remove(&mut self, property: &str) -> bool {
        let property = property.trim();
        let before = self.decls.len();
        self.decls.retain(|(name, _)| !name.eq_ignore_ascii_case(property));
        self.decls.len() != before
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Serialize back to attribute form: `a: 1; b: 2`.
    #[must_use]
    pub fn to_attr(&self) -> String {
        self.decls
            .iter()
            .map(|(name, value)| format!("{name}: {value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn split_declarations(raw: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0_u32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in raw.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                out.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&raw[start..]);
    out
}
