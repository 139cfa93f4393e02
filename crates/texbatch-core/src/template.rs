//! Schema-checked placeholder substitution.
//!
//! A [`Template`] declares the placeholders it requires. Rendering fails
//! if the template text does not contain each of them exactly once, or if
//! a value is missing or unexpected. Substitution is a single pass over
//! the template, so a value containing a placeholder token is copied
//! verbatim.

use std::fmt;

/// A substitution point in a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// Project title.
    Title,
    /// Body of the project's source document.
    Content,
}

impl Placeholder {
    /// Literal token marking the placeholder in template text.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::Title => "@@TITLE@@",
            Self::Content => "@@CONTENT@@",
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Template schema violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("template `{template}` has no {placeholder} placeholder")]
    MissingPlaceholder {
        template: &'static str,
        placeholder: Placeholder,
    },

    #[error("template `{template}` contains {placeholder} {count} times")]
    DuplicatePlaceholder {
        template: &'static str,
        placeholder: Placeholder,
        count: usize,
    },

    #[error("no value supplied for {placeholder} in template `{template}`")]
    MissingValue {
        template: &'static str,
        placeholder: Placeholder,
    },

    #[error("template `{template}` does not use {placeholder}")]
    UnexpectedValue {
        template: &'static str,
        placeholder: Placeholder,
    },
}

/// A fixed document template.
#[derive(Debug, Clone, Copy)]
pub struct Template {
    name: &'static str,
    text: &'static str,
    required: &'static [Placeholder],
}

impl Template {
    #[must_use]
    pub const fn new(
        name: &'static str,
        text: &'static str,
        required: &'static [Placeholder],
    ) -> Self {
        Self {
            name,
            text,
            required,
        }
    }

    /// Check that every required placeholder occurs exactly once.
    pub fn validate(&self) -> Result<(), TemplateError> {
        self.anchors().map(|_| ())
    }

    /// Substitute `values` into the template.
    ///
    /// # Example
    /// ```
    /// use texbatch_core::template::{Placeholder, Template};
    ///
    /// const GREETING: Template = Template::new("greeting", "Hi @@TITLE@@!", &[Placeholder::Title]);
    /// let out = GREETING.render(&[(Placeholder::Title, "there")]).unwrap();
    /// assert_eq!(out, "Hi there!");
    /// ```
    pub fn render(&self, values: &[(Placeholder, &str)]) -> Result<String, TemplateError> {
        if let Some((placeholder, _)) = values.iter().find(|(p, _)| !self.required.contains(p)) {
            return Err(TemplateError::UnexpectedValue {
                template: self.name,
                placeholder: *placeholder,
            });
        }

        let mut anchors = self.anchors()?;
        anchors.sort_by_key(|(pos, _)| *pos);

        let mut out = String::with_capacity(
            self.text.len() + values.iter().map(|(_, v)| v.len()).sum::<usize>(),
        );
        let mut cursor = 0;
        for (pos, placeholder) in anchors {
            let value = values
                .iter()
                .find(|(p, _)| *p == placeholder)
                .map(|(_, v)| *v)
                .ok_or(TemplateError::MissingValue {
                    template: self.name,
                    placeholder,
                })?;
            out.push_str(&self.text[cursor..pos]);
            out.push_str(value);
            cursor = pos + placeholder.token().len();
        }
        out.push_str(&self.text[cursor..]);
        Ok(out)
    }

    fn anchors(&self) -> Result<Vec<(usize, Placeholder)>, TemplateError> {
        self.required
            .iter()
            .map(|&placeholder| {
                let positions: Vec<usize> = self
                    .text
                    .match_indices(placeholder.token())
                    .map(|(pos, _)| pos)
                    .collect();
                match positions.as_slice() {
                    [pos] => Ok((*pos, placeholder)),
                    [] => Err(TemplateError::MissingPlaceholder {
                        template: self.name,
                        placeholder,
                    }),
                    many => Err(TemplateError::DuplicatePlaceholder {
                        template: self.name,
                        placeholder,
                        count: many.len(),
                    }),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOTH: Template = Template::new(
        "both",
        "[@@TITLE@@] <@@CONTENT@@>",
        &[Placeholder::Title, Placeholder::Content],
    );

    #[test]
    fn substitutes_in_template_order() {
        let out = BOTH
            .render(&[(Placeholder::Content, "body"), (Placeholder::Title, "T")])
            .unwrap();
        assert_eq!(out, "[T] <body>");
    }

    #[test]
    fn values_are_not_rescanned() {
        let out = BOTH
            .render(&[
                (Placeholder::Title, "@@CONTENT@@"),
                (Placeholder::Content, "@@TITLE@@"),
            ])
            .unwrap();
        assert_eq!(out, "[@@CONTENT@@] <@@TITLE@@>");
    }

    #[test]
    fn missing_placeholder_fails_loudly() {
        const BROKEN: Template = Template::new("broken", "no anchors", &[Placeholder::Title]);
        assert_eq!(
            BROKEN.render(&[(Placeholder::Title, "x")]),
            Err(TemplateError::MissingPlaceholder {
                template: "broken",
                placeholder: Placeholder::Title,
            })
        );
    }

    #[test]
    fn duplicate_placeholder_is_rejected() {
        const TWICE: Template =
            Template::new("twice", "@@TITLE@@ and @@TITLE@@", &[Placeholder::Title]);
        assert!(matches!(
            TWICE.validate(),
            Err(TemplateError::DuplicatePlaceholder { count: 2, .. })
        ));
    }

    #[test]
    fn missing_value_is_rejected() {
        assert!(matches!(
            BOTH.render(&[(Placeholder::Title, "T")]),
            Err(TemplateError::MissingValue {
                placeholder: Placeholder::Content,
                ..
            })
        ));
    }

    #[test]
    fn unexpected_value_is_rejected() {
        const TITLE_ONLY: Template = Template::new("t", "@@TITLE@@", &[Placeholder::Title]);
        assert!(matches!(
            TITLE_ONLY.render(&[(Placeholder::Title, "T"), (Placeholder::Content, "c")]),
            Err(TemplateError::UnexpectedValue { .. })
        ));
    }

    #[test]
    fn error_messages_name_the_template() {
        let err = TemplateError::MissingPlaceholder {
            template: "exam",
            placeholder: Placeholder::Content,
        };
        assert_eq!(err.to_string(), "template `exam` has no @@CONTENT@@ placeholder");
    }
}
