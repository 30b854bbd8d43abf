//! The application handle commands run against.

use std::ops::{Deref, DerefMut};

use crate::values::ParsedFlags;

/// An application instance built once per invocation.
///
/// The context hooks bracket every scoped command run: `push_context` before
/// the body, `pop_context` after it on every exit path.
pub trait Application {
    /// Activates the per-command work context.
    fn push_context(&mut self) {}

    /// Releases the per-command work context.
    fn pop_context(&mut self) {}
}

impl Application for () {}

/// Builds the application from the root manager's global flags.
pub type AppFactory<A> = Box<dyn Fn(&ParsedFlags) -> anyhow::Result<A>>;

/// Guard holding an application's work context open.
///
/// Dropping the guard pops the context, whether the body returned, failed, or
/// panicked.
///
/// # Examples
///
/// ```
/// use manage_script_core::{Application, ScopedContext};
///
/// #[derive(Default)]
/// struct App {
///     depth: usize,
/// }
///
/// impl Application for App {
///     fn push_context(&mut self) {
///         self.depth += 1;
///     }
///     fn pop_context(&mut self) {
///         self.depth -= 1;
///     }
/// }
///
/// let mut app = App::default();
/// {
///     let scope = ScopedContext::enter(&mut app);
///     assert_eq!(scope.depth, 1);
/// }
/// assert_eq!(app.depth, 0);
/// ```
pub struct ScopedContext<'a, A: Application> {
    app: &'a mut A,
}

impl<'a, A: Application> ScopedContext<'a, A> {
    /// Pushes the context and returns the guard.
    pub fn enter(app: &'a mut A) -> Self {
        app.push_context();
        Self { app }
    }
}

impl<A: Application> Deref for ScopedContext<'_, A> {
    type Target = A;

    fn deref(&self) -> &A {
        self.app
    }
}

impl<A: Application> DerefMut for ScopedContext<'_, A> {
    fn deref_mut(&mut self) -> &mut A {
        self.app
    }
}

impl<A: Application> Drop for ScopedContext<'_, A> {
    fn drop(&mut self) {
        self.app.pop_context();
    }
}
