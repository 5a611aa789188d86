//! One-shot notices raised by an action and displayed by whichever view
//! consumes them first.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    LoginSucceeded,
    PasswordChanged,
    PasswordResetRequested,
    SignupCompleted,
}

impl Notice {
    pub fn message(self) -> &'static str {
        match self {
            Notice::LoginSucceeded => "Login successful!",
            Notice::PasswordChanged => "Password changed successfully!",
            Notice::PasswordResetRequested => "Check your email for a password reset link.",
            Notice::SignupCompleted => "Account created. We've emailed you a verification code.",
        }
    }
}

/// Shared queue of pending notices. Every push is delivered to at most one
/// `take`.
#[derive(Debug, Clone, Default)]
pub struct Notifications {
    queue: Rc<RefCell<VecDeque<Notice>>>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, notice: Notice) {
        tracing::debug!(?notice, "notice queued");
        self.queue.borrow_mut().push_back(notice);
    }

    /// Consumes one pending occurrence of `notice`.
    pub fn take(&self, notice: Notice) -> bool {
        let mut queue = self.queue.borrow_mut();
        match queue.iter().position(|pending| *pending == notice) {
            Some(index) => {
                queue.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn drain(&self) -> Vec<Notice> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn is_pending(&self, notice: Notice) -> bool {
        self.queue.borrow().contains(&notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_push_is_observed_exactly_once() {
        let notices = Notifications::new();
        notices.push(Notice::LoginSucceeded);

        assert!(notices.take(Notice::LoginSucceeded));
        // a re-render without a new action sees nothing
        assert!(!notices.take(Notice::LoginSucceeded));
        assert!(!notices.take(Notice::LoginSucceeded));

        notices.push(Notice::LoginSucceeded);
        assert!(notices.take(Notice::LoginSucceeded));
    }

    #[test]
    fn take_leaves_other_notices_queued() {
        let notices = Notifications::new();
        notices.push(Notice::PasswordChanged);
        notices.push(Notice::LoginSucceeded);

        assert!(notices.take(Notice::LoginSucceeded));
        assert!(notices.is_pending(Notice::PasswordChanged));
        assert_eq!(notices.drain(), vec![Notice::PasswordChanged]);
        assert!(notices.drain().is_empty());
    }

    #[test]
    fn clones_share_one_queue() {
        let notices = Notifications::new();
        let view = notices.clone();
        notices.push(Notice::PasswordResetRequested);
        assert!(view.take(Notice::PasswordResetRequested));
        assert!(!notices.take(Notice::PasswordResetRequested));
    }
}
