//! Current-user state with change notification.

use std::sync::Arc;
use tokio::sync::watch;

use crate::model::user::UserHandle;

/// Shared signed-in state. Clones observe and mutate the same session.
#[derive(Debug, Clone)]
pub struct Session {
    sender: Arc<watch::Sender<Option<UserHandle>>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn current(&self) -> Option<UserHandle> {
        self.sender.borrow().clone()
    }

    pub fn sign_in(&self, user: UserHandle) {
        self.sender.send_replace(Some(user));
    }

    /// Clears the user; observers are only woken when someone was signed in.
    pub fn sign_out(&self) {
        self.sender.send_if_modified(|current| current.take().is_some());
    }

    pub fn watch(&self) -> watch::Receiver<Option<UserHandle>> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::Session;
    use crate::model::user::UserHandle;
    use uuid::Uuid;

    #[test]
    fn watchers_see_sign_in_and_sign_out() {
        let session = Session::new();
        let mut watcher = session.watch();
        assert!(!watcher.has_changed().unwrap());

        let user = UserHandle {
            uid: Uuid::new_v4(),
            email: "a@b.io".to_string(),
        };
        session.sign_in(user.clone());
        assert!(watcher.has_changed().unwrap());
        assert_eq!(watcher.borrow_and_update().clone(), Some(user));

        session.sign_out();
        assert!(watcher.has_changed().unwrap());
        assert_eq!(*watcher.borrow_and_update(), None);

        session.sign_out();
        assert!(!watcher.has_changed().unwrap());
    }

    #[test]
    fn clones_share_state() {
        let session = Session::new();
        let other = session.clone();
        other.sign_in(UserHandle {
            uid: Uuid::new_v4(),
            email: "c@d.io".to_string(),
        });
        assert!(session.current().is_some());
    }
}
