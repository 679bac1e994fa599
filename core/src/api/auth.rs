//! Account endpoints: SMS code login, profile, logout.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::endpoint::{Endpoint, Parameters};
use crate::http::HttpMethod;

/// Every account call as one enum; each case carries its own parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthApi {
    SendCode { phone: String },
    Login { phone: String, code: String },
    Profile,
    /// Same payload as `Profile`, but the server encrypts `data`.
    SecureProfile,
    Logout,
}

impl Endpoint for AuthApi {
    fn path(&self) -> Cow<'_, str> {
        Cow::Borrowed(match self {
            AuthApi::SendCode { .. } => "/auth/sms-code",
            AuthApi::Login { .. } => "/auth/login",
            AuthApi::Profile => "/user/profile",
            AuthApi::SecureProfile => "/user/profile/secure",
            AuthApi::Logout => "/auth/logout",
        })
    }

    fn method(&self) -> HttpMethod {
        match self {
            AuthApi::Profile | AuthApi::SecureProfile => HttpMethod::Get,
            AuthApi::SendCode { .. } | AuthApi::Login { .. } | AuthApi::Logout => HttpMethod::Post,
        }
    }

    fn parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        match self {
            AuthApi::SendCode { phone } => {
                params.insert("phone".to_string(), json!(phone));
            }
            AuthApi::Login { phone, code } => {
                params.insert("phone".to_string(), json!(phone));
                params.insert("code".to_string(), json!(code));
            }
            AuthApi::Profile | AuthApi::SecureProfile | AuthApi::Logout => {}
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}
