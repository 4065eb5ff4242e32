use reqwest::StatusCode;
use time::{format_description::FormatItem, macros::format_description, Date};

use crate::api::error::ApiError;
use crate::api::raw::{LoginResponse, ProfileResponse, RawUsagePayload};
use crate::domain::House;

pub const DEFAULT_BASE_URL: &str = "https://lifeapi.gazdebordeaux.fr";

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Aggregation granularity of the consumptions endpoint: `year` yields
/// the billing-period aggregate, `month` a daily breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Year,
    Month,
}

impl Scale {
    pub fn as_str(self) -> &'static str {
        match self {
            Scale::Year => "year",
            Scale::Month => "month",
        }
    }
}

/// Optional date bounds for a usage fetch. An open start defaults, on
/// the server side, to the beginning of the current year.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub start: Option<Date>,
    pub end: Option<Date>,
}

/// HTTP client for the Gaz de Bordeaux account API.
///
/// The bearer token is short-lived (minutes); callers are expected to
/// `login()` at the start of every polling cycle rather than reuse a
/// token across cycles. Token acquisition and use go through `&mut
/// self`, so there is no check-then-refresh race to guard against.
pub struct GdbClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    token: Option<String>,
    house: Option<String>,
}

impl GdbClient {
    pub fn new(username: String, password: String, house: Option<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), username, password, house)
    }

    /// Custom base URL, for tests.
    pub fn with_base_url(
        base_url: String,
        username: String,
        password: String,
        house: Option<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            username,
            password,
            token: None,
            house,
        }
    }

    /// Exchange the account credentials for a fresh bearer token.
    ///
    /// A well-formed response carrying a `null` token is how the API
    /// reports bad credentials.
    pub async fn login(&mut self) -> Result<(), ApiError> {
        tracing::debug!("logging in");

        let resp = self
            .http
            .post(format!("{}/login_check", self.base_url))
            .json(&serde_json::json!({
                "email": self.username,
                "password": self.password,
            }))
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let login: LoginResponse = resp
            .json()
            .await
            .map_err(|e| ApiError::Transport(format!("malformed login response: {e}")))?;

        match login.token {
            Some(token) => {
                tracing::debug!("login ok");
                self.token = Some(token);
                Ok(())
            }
            None => Err(ApiError::Auth("login returned a null token".to_string())),
        }
    }

    /// Houses linked to the account, for setup-time selection.
    pub async fn list_houses(&mut self) -> Result<Vec<House>, ApiError> {
        let token = self.ensure_token().await?;

        let resp = self
            .http
            .get(format!("{}/houses", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;
        let resp = check_status(resp).await?;

        resp.json()
            .await
            .map_err(|e| ApiError::Transport(format!("malformed house listing: {e}")))
    }

    /// Raw consumption data for the resolved house.
    pub async fn fetch_usage(
        &mut self,
        range: DateRange,
        scale: Scale,
    ) -> Result<RawUsagePayload, ApiError> {
        let token = self.ensure_token().await?;
        let house = self.resolve_house().await?;

        let params = query_params(range, scale)?;
        let resp = self
            .http
            .get(format!("{}{}/consumptions", self.base_url, house))
            .bearer_auth(token)
            .query(&params)
            .send()
            .await?;
        let resp = check_status(resp).await?;

        resp.json()
            .await
            .map_err(|e| ApiError::Transport(format!("malformed consumptions payload: {e}")))
    }

    async fn ensure_token(&mut self) -> Result<String, ApiError> {
        if self.token.is_none() {
            self.login().await?;
        }
        self.token
            .clone()
            .ok_or_else(|| ApiError::Auth("no bearer token after login".to_string()))
    }

    /// Configured house, or the supplier-selected one from the account
    /// profile. Resolved once and kept for the lifetime of the client.
    async fn resolve_house(&mut self) -> Result<String, ApiError> {
        if let Some(house) = &self.house {
            return Ok(house.clone());
        }

        tracing::debug!("resolving selected house from account profile");
        let token = self.ensure_token().await?;
        let resp = self
            .http
            .get(format!("{}/users/me", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let profile: ProfileResponse = resp
            .json()
            .await
            .map_err(|e| ApiError::Transport(format!("malformed profile response: {e}")))?;

        let house = profile.selected_house.ok_or_else(|| {
            ApiError::Transport("account profile carries no selected house".to_string())
        })?;
        tracing::debug!(house = %house, "resolved house");
        self.house = Some(house.clone());
        Ok(house)
    }
}

fn query_params(range: DateRange, scale: Scale) -> Result<Vec<(&'static str, String)>, ApiError> {
    let mut params = vec![("scale", scale.as_str().to_string())];
    if let Some(start) = range.start {
        params.push(("startDate", format_date(start)?));
    }
    if let Some(end) = range.end {
        params.push(("endDate", format_date(end)?));
    }
    Ok(params)
}

fn format_date(date: Date) -> Result<String, ApiError> {
    date.format(&DATE_FORMAT)
        .map_err(|e| ApiError::Transport(format!("unformattable date {date}: {e}")))
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Auth(format!(
            "{status}: {body}"
        ))),
        _ => Err(ApiError::Transport(format!("{status}: {body}"))),
    }
}
