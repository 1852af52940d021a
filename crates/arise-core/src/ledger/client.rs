//! HTTP client for the progression ledger.
//!
//! Thin: one request per call, no retries, no caching. Every reply is
//! classified into [`LedgerError`] before it leaves this module.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use super::actions::{parse_receipt, ActionReceipt, ShopItem, StatUpgradeRequest};
use super::credentials::CredentialProvider;
use super::resolution::{classify_completion, FailPayload, PunishmentNotice, ResolutionOutcome};
use super::traits::Ledger;
use crate::challenge::{
    CatalogSection, Challenge, MissionPayload, QuestPayload, SpecialMission, Stat,
};
use crate::error::LedgerError;
use crate::progression::UserProgressionSnapshot;
use crate::storage::LedgerConfig;

/// Error body shape used by the ledger for rejected requests.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

pub struct LedgerClient {
    base_url: Url,
    http: Client,
    credentials: Arc<dyn CredentialProvider>,
}

impl LedgerClient {
    /// Build a client rooted at `base_url`.
    ///
    /// Endpoint paths are joined relative to the base, so a missing trailing
    /// slash is added.
    pub fn new(
        base_url: &str,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, LedgerError> {
        Self::with_user_agent(base_url, concat!("arise/", env!("CARGO_PKG_VERSION")), credentials)
    }

    pub fn from_config(
        config: &LedgerConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, LedgerError> {
        Self::with_user_agent(&config.base_url, &config.user_agent, credentials)
    }

    fn with_user_agent(
        base_url: &str,
        user_agent: &str,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, LedgerError> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;
        if base_url.cannot_be_a_base() {
            return Err(LedgerError::InvalidUrl(base));
        }

        let http = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(LedgerError::from)?;

        Ok(Self {
            base_url,
            http,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, LedgerError> {
        Ok(self.base_url.join(path)?)
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, LedgerError> {
        let token = self
            .credentials
            .bearer_token()
            .filter(|t| !t.trim().is_empty())
            .ok_or(LedgerError::Unauthorized)?;
        Ok(request.bearer_auth(token))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, LedgerError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "GET");
        let response = self.authorize(self.http.get(url))?.send().await?;
        let body = read_reply(response).await?;
        serde_json::from_str(&body).map_err(|e| LedgerError::Malformed(e.to_string()))
    }

    /// POST a JSON body and return the raw success body.
    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<String, LedgerError> {
        let url = self.endpoint(path)?;
        tracing::debug!(%url, "POST");
        let response = self
            .authorize(self.http.post(url))?
            .json(body)
            .send()
            .await?;
        read_reply(response).await
    }

    async fn post_quest(&self, path: &str, challenge_id: &str) -> Result<String, LedgerError> {
        tracing::debug!(challenge_id, "quest request");
        self.post(path, &json!({ "quest_id": challenge_id })).await
    }

    /// Spend unallocated stat points. The ledger refuses when the user has
    /// fewer than `points` available.
    pub async fn upgrade_stat(
        &self,
        stat: Stat,
        points: u32,
    ) -> Result<ActionReceipt, LedgerError> {
        let body = self
            .post(
                "user/upgrade-stat",
                &StatUpgradeRequest {
                    stat_name: stat,
                    points,
                },
            )
            .await?;
        parse_receipt(&body)
    }

    pub async fn shop_items(&self) -> Result<Vec<ShopItem>, LedgerError> {
        self.get("shop/items").await
    }

    /// Buy one shop item with gold. Unknown items and insufficient gold come
    /// back as validation errors.
    pub async fn buy(&self, item_id: &str) -> Result<ActionReceipt, LedgerError> {
        let body = self.post("shop/buy", &json!({ "item_id": item_id })).await?;
        parse_receipt(&body)
    }

    /// List one catalog section.
    ///
    /// The daily section is a single quest generated on demand; it is
    /// returned as a one-element list.
    pub async fn catalog(&self, section: CatalogSection) -> Result<Vec<Challenge>, LedgerError> {
        match section {
            CatalogSection::Daily => Ok(vec![self.daily_quest().await?]),
            CatalogSection::Missions => Ok(self
                .special_missions()
                .await?
                .into_iter()
                .map(|m| m.challenge)
                .collect()),
            other => {
                let quests: Vec<QuestPayload> = self.get(other.path()).await?;
                Ok(quests
                    .into_iter()
                    .map(|q| q.into_challenge(other.kind()))
                    .collect())
            }
        }
    }

    pub async fn daily_quest(&self) -> Result<Challenge, LedgerError> {
        let quest: QuestPayload = self.get(CatalogSection::Daily.path()).await?;
        Ok(quest.into_challenge(CatalogSection::Daily.kind()))
    }

    pub async fn special_missions(&self) -> Result<Vec<SpecialMission>, LedgerError> {
        let missions: Vec<MissionPayload> = self.get(CatalogSection::Missions.path()).await?;
        Ok(missions.into_iter().map(SpecialMission::from).collect())
    }
}

/// Turn a reply into its body, or classify the failure.
async fn read_reply(response: Response) -> Result<String, LedgerError> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        return Ok(body);
    }

    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .map(|e| match e.detail {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    Err(classify_status(status, message))
}

fn classify_status(status: StatusCode, message: String) -> LedgerError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LedgerError::Unauthorized,
        s if s.is_client_error() => LedgerError::Validation {
            status: s.as_u16(),
            message,
        },
        s => LedgerError::Transport {
            message,
            status: Some(s.as_u16()),
        },
    }
}

#[async_trait]
impl Ledger for LedgerClient {
    async fn start_training(&self, challenge_id: &str) -> Result<(), LedgerError> {
        self.post_quest("quests/start-training", challenge_id).await?;
        Ok(())
    }

    async fn complete(&self, challenge_id: &str) -> Result<ResolutionOutcome, LedgerError> {
        let body = self.post_quest("quests/complete", challenge_id).await?;
        classify_completion(&body)
    }

    async fn fail(&self, challenge_id: &str) -> Result<PunishmentNotice, LedgerError> {
        let body = self.post_quest("quests/fail", challenge_id).await?;
        let payload: FailPayload =
            serde_json::from_str(&body).map_err(|e| LedgerError::Malformed(e.to_string()))?;
        Ok(payload.into())
    }

    async fn profile(&self) -> Result<UserProgressionSnapshot, LedgerError> {
        self.get("user/profile").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Anonymous, StaticCredential};

    #[test]
    fn base_url_gains_trailing_slash() {
        let client =
            LedgerClient::new("http://localhost:8001/api", Arc::new(Anonymous)).unwrap();
        assert_eq!(
            client.endpoint("quests/complete").unwrap().as_str(),
            "http://localhost:8001/api/quests/complete"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            LedgerClient::new("not a url", Arc::new(Anonymous)),
            Err(LedgerError::InvalidUrl(_))
        ));
        assert!(matches!(
            LedgerClient::new("mailto:hunter@example.com", Arc::new(Anonymous)),
            Err(LedgerError::InvalidUrl(_))
        ));
    }

    #[test]
    fn status_classification() {
        assert_eq!(
            classify_status(StatusCode::UNAUTHORIZED, "x".into()),
            LedgerError::Unauthorized
        );
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN, "x".into()),
            LedgerError::Unauthorized
        );
        assert_eq!(
            classify_status(StatusCode::BAD_REQUEST, "Misión ya completada".into()),
            LedgerError::Validation {
                status: 400,
                message: "Misión ya completada".into()
            }
        );
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, "x".into()),
            LedgerError::Transport {
                status: Some(502),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn missing_token_fails_before_any_request() {
        let client =
            LedgerClient::new("http://127.0.0.1:9/api/", Arc::new(StaticCredential::new("  ")))
                .unwrap();
        assert_eq!(client.complete("q1").await, Err(LedgerError::Unauthorized));
    }
}
