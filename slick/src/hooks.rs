use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures_util::future::{self, LocalBoxFuture};
use futures_util::FutureExt;

/// Callback run after every completed navigation.
pub type Hook = Rc<dyn Fn() -> LocalBoxFuture<'static, ()>>;

/// Append-only list of lifecycle hooks.
///
/// Hooks are typically registered once at start-up by analytics or widget code that
/// must re-initialise against the freshly inserted markup.
#[derive(Default)]
pub struct Hooks {
    hooks: RefCell<Vec<Hook>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asynchronous hook. Navigation completes only once it has resolved.
    pub fn add<F, Fut>(&self, hook: F)
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        self.hooks
            .borrow_mut()
            .push(Rc::new(move || hook().boxed_local()));
    }

    pub fn add_sync<F>(&self, hook: F)
    where
        F: Fn() + 'static,
    {
        self.add(move || {
            hook();
            future::ready(())
        });
    }

    pub fn len(&self) -> usize {
        self.hooks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.borrow().is_empty()
    }

    /// Run every hook concurrently and wait for all of them.
    ///
    /// Hooks registered while running are picked up by the next navigation.
    pub(crate) async fn run(&self) {
        let hooks = self.hooks.borrow().clone();
        future::join_all(hooks.iter().map(|hook| hook())).await;
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("len", &self.len())
            .finish()
    }
}
