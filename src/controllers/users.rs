//! The user list page.

use super::{Controller, ControllerError, Next, ViewResponse};
use crate::dispatcher::HandlerRequest;
use crate::users::{UserCollection, UserSource};
use crate::views::USERS_VIEW;
use serde::Serialize;
use std::sync::Arc;

/// Handler name the `GET /users` route dispatches to.
pub const USERS_INDEX: &str = "users.index";

/// Page title of the user list.
pub const USERS_TITLE: &str = "Users";

/// Model handed to the `users` view.
#[derive(Debug, Serialize)]
pub struct UsersViewModel<'a> {
    pub title: &'a str,
    pub users: &'a UserCollection,
}

/// Lists every user from the injected source.
pub struct UsersController {
    source: Arc<dyn UserSource>,
}

impl UsersController {
    #[must_use]
    pub fn new(source: Arc<dyn UserSource>) -> Self {
        Self { source }
    }

    /// Render the full collection with the `users` view.
    ///
    /// The request is not inspected and `next` is never called; source and
    /// render failures are returned to the caller untouched.
    pub fn index(
        &self,
        _req: &HandlerRequest,
        res: &mut dyn ViewResponse,
        _next: Next,
    ) -> Result<(), ControllerError> {
        let users = self.source.users()?;
        let model = serde_json::to_value(UsersViewModel {
            title: USERS_TITLE,
            users: &users,
        })?;
        res.render(USERS_VIEW, &model)?;
        Ok(())
    }
}

impl Controller for UsersController {
    fn call(
        &self,
        req: &HandlerRequest,
        res: &mut dyn ViewResponse,
        next: Next,
    ) -> Result<(), ControllerError> {
        self.index(req, res, next)
    }
}
