//! Typed argument records for mutating operations.
//!
//! Each record can only be built through its constructor, which runs the
//! boundary validation once. Everything past the boundary can therefore
//! assume the fields are present, trimmed, and within length limits.

use crate::types::{PostId, UserId};
use crate::validation::{self, ValidationError, MAX_SHORT_TEXT};

/// Arguments for creating a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    username: String,
    email: String,
}

impl NewUser {
    pub fn new(username: Option<String>, email: Option<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            username: validation::required_text("username", username, Some(MAX_SHORT_TEXT))?,
            email: validation::email(email)?,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

/// Partial profile update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    username: Option<String>,
    email: Option<String>,
}

impl UserPatch {
    pub fn new(username: Option<String>, email: Option<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            username: validation::patch_text("username", username, Some(MAX_SHORT_TEXT))?,
            email: email.map(|e| validation::email(Some(e))).transpose()?,
        })
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none()
    }
}

/// Arguments for creating a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    title: String,
    description: Option<String>,
    author_id: UserId,
}

impl NewPost {
    pub fn new(
        title: Option<String>,
        description: Option<String>,
        author_id: UserId,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            title: validation::required_text("title", title, Some(MAX_SHORT_TEXT))?,
            description: validation::optional_text("description", description, None)?,
            author_id,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn author_id(&self) -> UserId {
        self.author_id
    }
}

/// What a post update does to the description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DescriptionChange {
    #[default]
    Keep,
    Clear,
    Set(String),
}

/// Partial post update.
///
/// A present-but-blank description clears it; an absent one keeps it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPatch {
    title: Option<String>,
    description: DescriptionChange,
}

impl PostPatch {
    pub fn new(title: Option<String>, description: Option<String>) -> Result<Self, ValidationError> {
        let description = match description {
            None => DescriptionChange::Keep,
            Some(d) => match validation::optional_text("description", Some(d), None)? {
                None => DescriptionChange::Clear,
                Some(d) => DescriptionChange::Set(d),
            },
        };
        Ok(Self {
            title: validation::patch_text("title", title, Some(MAX_SHORT_TEXT))?,
            description,
        })
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> &DescriptionChange {
        &self.description
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description == DescriptionChange::Keep
    }

    /// Apply the patch to an in-memory description value.
    pub fn apply_description(&self, current: Option<String>) -> Option<String> {
        match &self.description {
            DescriptionChange::Keep => current,
            DescriptionChange::Clear => None,
            DescriptionChange::Set(d) => Some(d.clone()),
        }
    }
}

/// Arguments for commenting on a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    text: String,
    user_id: UserId,
    post_id: PostId,
}

impl NewComment {
    pub fn new(
        text: Option<String>,
        user_id: UserId,
        post_id: PostId,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            text: validation::required_text("comment", text, None)?,
            user_id,
            post_id,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_requires_both_fields() {
        assert_eq!(
            NewUser::new(None, Some("a@x".into())),
            Err(ValidationError::Missing("username"))
        );
        assert_eq!(
            NewUser::new(Some("a".into()), None),
            Err(ValidationError::Missing("email"))
        );
        let u = NewUser::new(Some(" a ".into()), Some("a@x".into())).unwrap();
        assert_eq!(u.username(), "a");
        assert_eq!(u.email(), "a@x");
    }

    #[test]
    fn new_post_without_title_is_rejected() {
        assert_eq!(
            NewPost::new(None, Some("body".into()), UserId(1)),
            Err(ValidationError::Missing("title"))
        );
    }

    #[test]
    fn post_patch_description_modes() {
        let keep = PostPatch::new(Some("t".into()), None).unwrap();
        assert_eq!(keep.apply_description(Some("old".into())), Some("old".into()));

        let clear = PostPatch::new(None, Some("  ".into())).unwrap();
        assert_eq!(clear.description(), &DescriptionChange::Clear);
        assert_eq!(clear.apply_description(Some("old".into())), None);

        let set = PostPatch::new(None, Some("new".into())).unwrap();
        assert_eq!(set.apply_description(None), Some("new".into()));

        assert!(PostPatch::new(None, None).unwrap().is_empty());
    }

    #[test]
    fn user_patch_validates_present_fields_only() {
        assert!(UserPatch::new(None, None).unwrap().is_empty());
        assert!(UserPatch::new(None, Some("bad".into())).is_err());
        let p = UserPatch::new(Some("new".into()), None).unwrap();
        assert_eq!(p.username(), Some("new"));
        assert_eq!(p.email(), None);
    }

    #[test]
    fn new_comment_requires_text() {
        assert_eq!(
            NewComment::new(Some(" ".into()), UserId(1), PostId(1)),
            Err(ValidationError::Blank("comment"))
        );
    }
}
