use std::cell::RefCell;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Success(msg) | Notice::Error(msg) => msg,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

/// Where user-facing outcomes go. Views decide how to present them.
pub trait Notifier {
    fn notify(&self, notice: Notice);
}

/// Prints notices for one-shot CLI commands.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Success(msg) => println!("{}", msg),
            Notice::Error(msg) => eprintln!("Error: {}", msg),
        }
    }
}

/// Holds the latest notice for the dashboard's status line.
#[derive(Default)]
pub struct StatusLine {
    latest: RefCell<Option<Notice>>,
}

impl StatusLine {
    pub fn current(&self) -> Option<Notice> {
        self.latest.borrow().clone()
    }

    pub fn clear(&self) {
        self.latest.borrow_mut().take();
    }
}

impl Notifier for StatusLine {
    fn notify(&self, notice: Notice) {
        *self.latest.borrow_mut() = Some(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_keeps_latest() {
        let status = StatusLine::default();
        status.notify(Notice::Success("saved".to_string()));
        status.notify(Notice::Error("boom".to_string()));

        let current = status.current().unwrap();
        assert!(current.is_error());
        assert_eq!(current.message(), "boom");

        status.clear();
        assert!(status.current().is_none());
    }
}
