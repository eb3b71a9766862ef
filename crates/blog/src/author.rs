use serde::{Deserialize, Serialize};

use inkpost_core::{AuthorId, DomainError, DomainResult};

/// A blog contributor, uniquely identified by `user_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: AuthorId,
    pub first_name: Option<String>,
    pub last_name: String,
    pub user_name: String,
}

impl Author {
    /// `"<firstName> <lastName>"`, without the leading space when there is no
    /// first name.
    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("");
        format!("{first} {}", self.last_name).trim().to_string()
    }
}

/// Validated author creation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuthor {
    pub first_name: String,
    pub last_name: String,
    pub user_name: String,
}

impl NewAuthor {
    /// Checks field presence in request order: `firstName`, `lastName`,
    /// `userName`. The first absent field is reported.
    pub fn from_fields(
        first_name: Option<String>,
        last_name: Option<String>,
        user_name: Option<String>,
    ) -> DomainResult<Self> {
        let first_name = first_name.ok_or_else(|| DomainError::missing_field("firstName"))?;
        let last_name = last_name.ok_or_else(|| DomainError::missing_field("lastName"))?;
        let user_name = user_name.ok_or_else(|| DomainError::missing_field("userName"))?;

        Ok(Self {
            first_name,
            last_name,
            user_name,
        })
    }

    pub fn into_author(self, id: AuthorId) -> Author {
        Author {
            id,
            first_name: Some(self.first_name),
            last_name: self.last_name,
            user_name: self.user_name,
        }
    }
}

/// Partial author update: only `Some` fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_name: Option<String>,
}

impl AuthorChanges {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.user_name.is_none()
    }

    /// The `userName` the author will carry once these changes are applied.
    pub fn resulting_user_name<'a>(&'a self, current: &'a Author) -> &'a str {
        self.user_name.as_deref().unwrap_or(&current.user_name)
    }

    pub fn apply(self, author: &mut Author) {
        if let Some(first_name) = self.first_name {
            author.first_name = Some(first_name);
        }
        if let Some(last_name) = self.last_name {
            author.last_name = last_name;
        }
        if let Some(user_name) = self.user_name {
            author.user_name = user_name;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn author(first: Option<&str>, last: &str) -> Author {
        Author {
            id: AuthorId::new(),
            first_name: first.map(str::to_string),
            last_name: last.to_string(),
            user_name: "jdoe".to_string(),
        }
    }

    #[test]
    fn display_name_joins_first_and_last() {
        assert_eq!(author(Some("Jane"), "Doe").display_name(), "Jane Doe");
    }

    #[test]
    fn display_name_without_first_name_has_no_leading_space() {
        assert_eq!(author(None, "Doe").display_name(), "Doe");
    }

    #[test]
    fn new_author_reports_first_missing_field() {
        let err = NewAuthor::from_fields(Some("Jane".into()), None, None).unwrap_err();
        assert_eq!(
            err,
            DomainError::missing_field("lastName"),
            "lastName is checked before userName"
        );

        let err = NewAuthor::from_fields(None, Some("Doe".into()), Some("jdoe".into())).unwrap_err();
        assert_eq!(err, DomainError::missing_field("firstName"));
    }

    #[test]
    fn new_author_builds_record() {
        let new = NewAuthor::from_fields(Some("Jane".into()), Some("Doe".into()), Some("jdoe".into()))
            .unwrap();
        let id = AuthorId::new();
        let a = new.into_author(id);
        assert_eq!(a.id, id);
        assert_eq!(a.first_name.as_deref(), Some("Jane"));
        assert_eq!(a.user_name, "jdoe");
    }

    #[test]
    fn changes_apply_only_present_fields() {
        let mut a = author(Some("Jane"), "Doe");
        let changes = AuthorChanges {
            last_name: Some("Smith".into()),
            ..Default::default()
        };
        assert!(!changes.is_empty());
        assert_eq!(changes.resulting_user_name(&a), "jdoe");

        changes.apply(&mut a);
        assert_eq!(a.first_name.as_deref(), Some("Jane"));
        assert_eq!(a.last_name, "Smith");
        assert_eq!(a.user_name, "jdoe");
    }

    #[test]
    fn resulting_user_name_prefers_the_change() {
        let a = author(None, "Doe");
        let changes = AuthorChanges {
            user_name: Some("jane.doe".into()),
            ..Default::default()
        };
        assert_eq!(changes.resulting_user_name(&a), "jane.doe");
    }

    proptest! {
        #[test]
        fn display_name_never_has_outer_spaces(
            first in proptest::option::of("[A-Za-z]{1,12}"),
            last in "[A-Za-z]{1,12}",
        ) {
            let a = Author {
                id: AuthorId::new(),
                first_name: first.clone(),
                last_name: last.clone(),
                user_name: "u".to_string(),
            };
            let name = a.display_name();
            prop_assert_eq!(name.trim(), name.as_str());
            match first {
                Some(f) => prop_assert_eq!(name, format!("{f} {last}")),
                None => prop_assert_eq!(name, last),
            }
        }
    }
}
