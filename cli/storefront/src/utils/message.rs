use std::fmt::Display;

/// Write a message to stderr.
///
/// Listings and other command output go to stdout,
/// everything addressed to the user goes through here.
fn print_message(v: impl Display) {
    #[cfg(test)]
    {
        let history = crate::utils::message::history::History::global();
        history.push_message(format!("{v}"));
    }

    eprintln!("{v}");
}

/// alias for [print_message]
pub(crate) fn plain(v: impl Display) {
    print_message(v);
}
pub(crate) fn error(v: impl Display) {
    print_message(std::format_args!("❌ ERROR: {v}"));
}
/// double width character, add an additional space for alignment
pub(crate) fn warning(v: impl Display) {
    print_message(std::format_args!("⚠️  {v}"));
}

/// A history for messages printed to stderr through the `message` module.
///
/// In unit tests the messaging functions record every message
/// in a thread local history, so tests can assert against them.
/// Being thread local, messages printed from other threads
/// (e.g. tasks of a multi threaded runtime) are not captured.
#[cfg(test)]
pub mod history {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    thread_local! {
        static THREAD_HISTORY: Rc<RefCell<VecDeque<String>>> = {
            Rc::new(RefCell::new(VecDeque::new()))
        };
    }

    pub(crate) struct History {
        messages: Rc<RefCell<VecDeque<String>>>,
    }

    impl History {
        pub(crate) fn global() -> History {
            let messages = THREAD_HISTORY.with(|h| h.clone());
            History { messages }
        }

        /// Get a snapshot of the messages at the time of the call,
        /// ordered oldest to newest.
        pub(crate) fn messages(&self) -> VecDeque<String> {
            self.messages.borrow().clone()
        }

        pub(crate) fn push_message(&self, message: String) {
            self.messages.borrow_mut().push_back(message);
        }

        pub(crate) fn clear(&self) {
            self.messages.borrow_mut().clear();
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::utils::message::{error, plain};

        #[test]
        fn messages_are_recorded_per_thread() {
            plain("1");
            error("2");
            assert_eq!(&History::global().messages(), &["1", "❌ ERROR: 2"]);

            std::thread::scope(|scope| {
                scope.spawn(|| plain("other thread"));
            });
            assert_eq!(History::global().messages().len(), 2);
        }

        #[test]
        fn clear() {
            let history = History::global();

            plain("message");
            assert_eq!(&history.messages(), &["message"]);
            history.clear();
            assert_eq!(history.messages().len(), 0);
        }
    }
}
