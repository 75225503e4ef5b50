//! Typed HTTP client for the boardspace API.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, SET_COOKIE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tenancy::{
    AddGroupMemberRequest, CreateCompanyRequest, CreateCompanyResponse, CreateGroupRequest, CreateInviteRequest,
    CreateWhiteboardRequest, Domain, ErrorBody, Group, GroupShareEntry, GroupShareRequest, GroupSummary, InviteGrant,
    InviteToken, MemberSummary, Profile, ProfileWithDomain, SessionInfo, ShareEntry, ShareRequest, SignInRequest,
    SignUpRequest, UpdateDomainRequest, UpdateInviteWhiteboardRequest, UpdateProfileRequest, UpdateWhiteboardRequest,
    Whiteboard, WhiteboardCard,
};
use uuid::Uuid;

use crate::error::CliError;

const SESSION_COOKIE: &str = "session_token";

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// Pull the session token out of a `Set-Cookie` header value.
pub(crate) fn token_from_set_cookie(raw: &str) -> Option<&str> {
    let pair = raw.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
}

impl ApiClient {
    #[must_use]
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.trim_end_matches('/').to_owned(), token }
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http.request(method, format!("{}{path}", self.base_url));
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    async fn check(response: Response) -> Result<Response, CliError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let (message, code) = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => (body.error, body.code),
            Err(_) if text.trim().is_empty() => (status.canonical_reason().unwrap_or("request failed").to_owned(), None),
            Err(_) => (text, None),
        };
        Err(CliError::Api { status, message, code })
    }

    async fn call<T: DeserializeOwned>(&self, method: Method, path: &str, body: Option<&impl Serialize>) -> Result<T, CliError> {
        let request = self.request(method, path);
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };
        let response = Self::check(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn call_empty(&self, method: Method, path: &str, body: Option<&impl Serialize>) -> Result<(), CliError> {
        let request = self.request(method, path);
        let request = match body {
            Some(body) => request.json(body),
            None => request,
        };
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, CliError> {
        self.call(Method::GET, path, None::<&Value>).await
    }

    // =========================================================================
    // AUTH
    // =========================================================================

    async fn start_session(&mut self, path: &str, body: &impl Serialize) -> Result<SessionInfo, CliError> {
        let response = Self::check(self.request(Method::POST, path).json(body).send().await?).await?;
        let token = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(token_from_set_cookie)
            .map(str::to_owned)
            .ok_or(CliError::MissingSessionToken)?;
        self.token = Some(token);
        Ok(response.json::<SessionInfo>().await?)
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn sign_up(&mut self, body: &SignUpRequest) -> Result<SessionInfo, CliError> {
        self.start_session("/api/auth/signup", body).await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn sign_in(&mut self, body: &SignInRequest) -> Result<SessionInfo, CliError> {
        self.start_session("/api/auth/signin", body).await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn sign_out(&mut self) -> Result<(), CliError> {
        let result = self.call_empty(Method::POST, "/api/auth/signout", None::<&Value>).await;
        self.token = None;
        result
    }

    /// `None` when the server does not recognize the token.
    ///
    /// # Errors
    ///
    /// Transport failures and non-401 rejections.
    pub async fn session(&self) -> Result<Option<SessionInfo>, CliError> {
        if self.token.is_none() {
            return Ok(None);
        }
        match self.get::<SessionInfo>("/api/auth/session").await {
            Ok(info) => Ok(Some(info)),
            Err(e) if e.is_unauthorized() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn create_company(&self, body: &CreateCompanyRequest) -> Result<CreateCompanyResponse, CliError> {
        self.call(Method::POST, "/api/functions/create-company", Some(body)).await
    }

    // =========================================================================
    // WORKSPACE
    // =========================================================================

    /// `None` when no workspace has that name.
    ///
    /// # Errors
    ///
    /// Transport failures and non-404 rejections.
    pub async fn domain(&self, name: &str) -> Result<Option<Domain>, CliError> {
        match self.get::<Domain>(&format!("/api/domains/{name}")).await {
            Ok(domain) => Ok(Some(domain)),
            Err(CliError::Api { status, .. }) if status == StatusCode::NOT_FOUND => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// # Errors
    ///
    /// Server rejections (including `profile_missing`) and transport failures.
    pub async fn profile(&self) -> Result<ProfileWithDomain, CliError> {
        self.get("/api/profile").await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn update_profile(&self, body: &UpdateProfileRequest) -> Result<Profile, CliError> {
        self.call(Method::PATCH, "/api/profile", Some(body)).await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn rename_domain(&self, body: &UpdateDomainRequest) -> Result<Domain, CliError> {
        self.call(Method::PATCH, "/api/domain", Some(body)).await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn upload_logo(&self, content_type: &str, bytes: Vec<u8>) -> Result<Domain, CliError> {
        let request = self
            .request(Method::PUT, "/api/domain/logo")
            .header(CONTENT_TYPE, content_type)
            .body(bytes);
        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn members(&self) -> Result<Vec<MemberSummary>, CliError> {
        self.get("/api/profiles").await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn search_members(&self, query: &str, exclude: &[Uuid]) -> Result<Vec<MemberSummary>, CliError> {
        let exclude = exclude.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",");
        let request = self
            .request(Method::GET, "/api/profiles/search")
            .query(&[("q", query), ("exclude", exclude.as_str())]);
        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    // =========================================================================
    // WHITEBOARDS
    // =========================================================================

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn whiteboards(&self) -> Result<Vec<WhiteboardCard>, CliError> {
        self.get("/api/whiteboards").await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn whiteboard(&self, id: Uuid) -> Result<Value, CliError> {
        self.get(&format!("/api/whiteboards/{id}")).await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn create_whiteboard(&self, body: &CreateWhiteboardRequest) -> Result<Whiteboard, CliError> {
        self.call(Method::POST, "/api/whiteboards", Some(body)).await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn update_whiteboard(&self, id: Uuid, body: &UpdateWhiteboardRequest) -> Result<Whiteboard, CliError> {
        self.call(Method::PATCH, &format!("/api/whiteboards/{id}"), Some(body)).await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn delete_whiteboard(&self, id: Uuid) -> Result<(), CliError> {
        self.call_empty(Method::DELETE, &format!("/api/whiteboards/{id}"), None::<&Value>).await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn shares(&self, id: Uuid) -> Result<Vec<ShareEntry>, CliError> {
        self.get(&format!("/api/whiteboards/{id}/shares")).await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn share(&self, id: Uuid, body: &ShareRequest) -> Result<ShareEntry, CliError> {
        self.call(Method::POST, &format!("/api/whiteboards/{id}/shares"), Some(body)).await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn unshare(&self, id: Uuid, user_id: Uuid) -> Result<(), CliError> {
        self.call_empty(Method::DELETE, &format!("/api/whiteboards/{id}/shares/{user_id}"), None::<&Value>)
            .await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn group_shares(&self, id: Uuid) -> Result<Vec<GroupShareEntry>, CliError> {
        self.get(&format!("/api/whiteboards/{id}/group-shares")).await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn share_with_group(&self, id: Uuid, body: &GroupShareRequest) -> Result<Value, CliError> {
        self.call(Method::POST, &format!("/api/whiteboards/{id}/group-shares"), Some(body)).await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn unshare_group(&self, id: Uuid, group_id: Uuid) -> Result<(), CliError> {
        self.call_empty(Method::DELETE, &format!("/api/whiteboards/{id}/group-shares/{group_id}"), None::<&Value>)
            .await
    }

    // =========================================================================
    // GROUPS
    // =========================================================================

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn groups(&self) -> Result<Vec<GroupSummary>, CliError> {
        self.get("/api/groups").await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn create_group(&self, body: &CreateGroupRequest) -> Result<Group, CliError> {
        self.call(Method::POST, "/api/groups", Some(body)).await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn delete_group(&self, id: Uuid) -> Result<(), CliError> {
        self.call_empty(Method::DELETE, &format!("/api/groups/{id}"), None::<&Value>).await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn group_members(&self, id: Uuid) -> Result<Vec<MemberSummary>, CliError> {
        self.get(&format!("/api/groups/{id}/members")).await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn add_group_member(&self, id: Uuid, user_id: Uuid) -> Result<(), CliError> {
        let body = AddGroupMemberRequest { user_id };
        self.call_empty(Method::POST, &format!("/api/groups/{id}/members"), Some(&body)).await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn remove_group_member(&self, id: Uuid, user_id: Uuid) -> Result<(), CliError> {
        self.call_empty(Method::DELETE, &format!("/api/groups/{id}/members/{user_id}"), None::<&Value>)
            .await
    }

    // =========================================================================
    // INVITES
    // =========================================================================

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn create_invite(&self, id: Uuid, body: &CreateInviteRequest) -> Result<InviteToken, CliError> {
        self.call(Method::POST, &format!("/api/whiteboards/{id}/invites"), Some(body)).await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn invites(&self, id: Uuid) -> Result<Vec<InviteToken>, CliError> {
        self.get(&format!("/api/whiteboards/{id}/invites")).await
    }

    /// # Errors
    ///
    /// Server rejections and transport failures.
    pub async fn revoke_invite(&self, id: Uuid, token: &str) -> Result<(), CliError> {
        self.call_empty(Method::DELETE, &format!("/api/whiteboards/{id}/invites/{token}"), None::<&Value>)
            .await
    }

    /// # Errors
    ///
    /// Unknown (404) or expired (410) tokens, transport failures.
    pub async fn open_invite(&self, token: &str) -> Result<InviteGrant, CliError> {
        self.get(&format!("/api/invites/{token}")).await
    }

    /// # Errors
    ///
    /// Read-only tokens, expired tokens, transport failures.
    pub async fn write_through_invite(&self, token: &str, data: Value) -> Result<Whiteboard, CliError> {
        let body = UpdateInviteWhiteboardRequest { data };
        self.call(Method::PATCH, &format!("/api/invites/{token}/whiteboard"), Some(&body)).await
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
