//! Predecessors to [ChrisApiClient] for getting authorization tokens or
//! creating accounts. These two endpoints speak plain JSON rather than
//! Collection+JSON.

use crate::errors::{Error, RequestError};
use crate::transport::check;
use crate::types::{ApiUrl, ItemUrl, Username};
use crate::ChrisApiClient;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
struct AuthTokenResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
pub struct UserCreatedResponse {
    pub url: ItemUrl,
    pub id: u32,
    pub username: Username,
    pub email: String,
}

#[derive(Serialize)]
struct BasicCredentials<'a> {
    username: &'a Username,
    password: &'a str,
}

#[derive(Serialize)]
struct CreateUserData<'a> {
    username: &'a Username,
    password: &'a str,
    email: &'a str,
}

/// Username and password pair. [Account] is a builder for
/// [ChrisApiClient].
pub struct Account {
    pub client: reqwest::Client,
    pub url: ApiUrl,
    pub username: Username,
    pub password: String,
}

impl Account {
    pub fn new(url: ApiUrl, username: Username, password: String) -> Self {
        Self {
            client: Default::default(),
            url,
            username,
            password,
        }
    }

    /// Exchange the username and password for an API token.
    pub async fn get_token(&self) -> Result<String, RequestError> {
        let auth_url = format!("{}auth-token/", &self.url);
        let payload = BasicCredentials {
            username: &self.username,
            password: &self.password,
        };
        let token_object: AuthTokenResponse = self.post_json(&auth_url, &payload).await?;
        Ok(token_object.token)
    }

    /// Create an account. Field-keyed validation errors (e.g. a malformed
    /// or duplicate email) surface through [RequestError::field_errors].
    pub async fn create_account(&self, email: &str) -> Result<UserCreatedResponse, RequestError> {
        let users_url = format!("{}users/", &self.url);
        let payload = CreateUserData {
            username: &self.username,
            password: &self.password,
            email,
        };
        self.post_json(&users_url, &payload).await
    }

    /// Get a token, then build a connected client with it.
    pub async fn into_client(self) -> Result<ChrisApiClient, Error> {
        let token = self.get_token().await?;
        let client = ChrisApiClient::build(self.url).token(token).build()?;
        Ok(client)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        payload: &impl Serialize,
    ) -> Result<T, RequestError> {
        let req = self
            .client
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(payload);
        let res = req
            .send()
            .await
            .map_err(|e| RequestError::transport("POST", url, e))?;
        let res = check("POST", url, res).await?;
        res.json()
            .map_err(|e| RequestError::malformed("POST", url, res.status, res.body.clone(), e.to_string()))
    }
}
