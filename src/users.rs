//! User registry: the seeded mock friends plus the login-created local
//! user, keyed by id so attendee lists render as names.

use crate::model::User;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;

/// The friends every session starts with.
pub static MOCK_FRIENDS: Lazy<Vec<User>> = Lazy::new(|| {
    [
        ("f1", "Sarah Chen", "@schen", 1),
        ("f2", "Marcus Johnson", "@mjay", 2),
        ("f3", "Alex Kim", "@akim", 3),
        ("f4", "Jessica Day", "@jess", 4),
        ("f5", "David Miller", "@dmill", 5),
    ]
    .iter()
    .map(|(id, name, handle, n)| User {
        id: id.to_string(),
        name: name.to_string(),
        handle: handle.to_string(),
        avatar_url: format!("https://picsum.photos/100/100?random={}", n),
    })
    .collect()
});

#[derive(Debug, Default)]
pub struct UserDirectory {
    users: DashMap<String, User>,
}

impl UserDirectory {
    /// Create a directory pre-populated with the mock friends.
    pub fn with_seeds() -> Arc<Self> {
        let dir = Self::default();
        for friend in MOCK_FRIENDS.iter() {
            dir.insert(friend.clone());
        }
        Arc::new(dir)
    }

    pub fn insert(&self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn get(&self, id: &str) -> Option<User> {
        self.users.get(id).map(|r| r.clone())
    }

    /// Display name for an id, falling back to the raw id for unknowns.
    pub fn display_name(&self, id: &str) -> String {
        self.get(id).map(|u| u.name).unwrap_or_else(|| id.to_string())
    }

    pub fn count(&self) -> usize {
        self.users.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_seeds() {
        let dir = UserDirectory::with_seeds();
        assert_eq!(dir.count(), MOCK_FRIENDS.len());
        assert_eq!(dir.display_name("f1"), "Sarah Chen");
    }

    #[test]
    fn test_insert_and_lookup() {
        let dir = UserDirectory::with_seeds();
        let me = User::new_local("You");
        dir.insert(me.clone());

        let found = dir.get(&me.id).unwrap();
        assert_eq!(found.handle, "@you");
        assert_eq!(dir.count(), MOCK_FRIENDS.len() + 1);
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let dir = UserDirectory::with_seeds();
        assert_eq!(dir.display_name("ghost"), "ghost");
    }
}
