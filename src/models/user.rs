// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Directory user model (Graph `/users/{id}`).

use serde::{Deserialize, Serialize};

/// User profile snapshot fetched from Graph on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Directory object ID
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    /// Primary SMTP address (`mail` in Graph)
    #[serde(default, alias = "mail", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Sign-in name, used when `mail` is empty
    #[serde(default, skip_serializing)]
    pub user_principal_name: Option<String>,
}

impl User {
    /// Fill `email` from the UPN when Graph has no `mail` for the user.
    pub fn with_email_fallback(mut self) -> Self {
        if self.email.is_none() {
            self.email = self.user_principal_name.clone();
        }
        self
    }

    /// Best address to identify the user by: `mail`, else the UPN.
    pub fn login_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .or(self.user_principal_name.as_deref())
    }
}
