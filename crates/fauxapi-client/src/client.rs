//! Asynchronous FauxAPI client implementation.

use crate::models::{Action, ApiResponse, ConfigWriteParams, FunctionCall};
use crate::Result;
use fauxapi_core::auth::{Credentials, AUTH_HEADER};
use fauxapi_core::client::{ClientConfig, RetryPolicy};
use fauxapi_core::config::FauxapiConfig;
use fauxapi_core::query::ActionQuery;
use fauxapi_core::{ConfigDocument, Error};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

const USER_AGENT: &str = concat!("fauxapi-client/", env!("CARGO_PKG_VERSION"));

/// Builder for [`FauxapiClient`].
#[derive(Debug, Clone)]
pub struct FauxapiClientBuilder {
    config: FauxapiConfig,
    http_config: ClientConfig,
    write_params: ConfigWriteParams,
}

impl FauxapiClientBuilder {
    /// Create a builder from a [`FauxapiConfig`].
    #[must_use]
    pub fn new(config: FauxapiConfig) -> Self {
        let http_config = config.http_config();
        Self {
            config,
            http_config,
            write_params: ConfigWriteParams::default(),
        }
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.http_config = self.http_config.with_retry_policy(retry);
        self
    }

    /// Override the `do_backup`/`do_reload` flags sent with `config_set` and
    /// `config_patch`.
    #[must_use]
    pub fn with_write_params(mut self, params: ConfigWriteParams) -> Self {
        self.write_params = params;
        self
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the host does not form a valid URL or the HTTP
    /// client cannot be constructed.
    pub fn build(self) -> Result<FauxapiClient> {
        let base_url = self.config.base_url()?;
        let http = self.http_config.build_http_client(USER_AGENT)?;

        Ok(FauxapiClient {
            http,
            base_url,
            credentials: self.config.credentials,
            retry_policy: self.http_config.retry_policy,
            write_params: self.write_params,
        })
    }
}

/// Asynchronous FauxAPI client.
#[derive(Clone)]
pub struct FauxapiClient {
    http: Client,
    base_url: Url,
    credentials: Credentials,
    retry_policy: RetryPolicy,
    write_params: ConfigWriteParams,
}

impl FauxapiClient {
    /// Construct a client directly from the configuration.
    ///
    /// # Errors
    ///
    /// See [`FauxapiClientBuilder::build`].
    pub fn new(config: FauxapiConfig) -> Result<Self> {
        FauxapiClientBuilder::new(config).build()
    }

    /// Start a builder pre-populated with the provided configuration.
    #[must_use]
    pub fn builder(config: FauxapiConfig) -> FauxapiClientBuilder {
        FauxapiClientBuilder::new(config)
    }

    /// Return the API endpoint URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch the full configuration, or a single top-level section of it.
    pub async fn config_get(&self, section: Option<&str>) -> Result<Value> {
        let config = self.call(Action::ConfigGet).await?.into_config()?;

        match section {
            None => Ok(config),
            Some(name) => config
                .get(name)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("configuration section `{name}`"))),
        }
    }

    /// Fetch the full configuration as a [`ConfigDocument`].
    pub async fn config_document(&self) -> Result<ConfigDocument> {
        ConfigDocument::from_value(self.config_get(None).await?)
    }

    /// Write the full configuration, or replace a single section of it.
    ///
    /// With a section the current configuration is fetched first and only that
    /// member is replaced before the whole document is written back.
    pub async fn config_set(&self, config: &Value, section: Option<&str>) -> Result<ApiResponse> {
        let query = self.write_params.apply(Action::ConfigSet.query());
        match section {
            None => self.execute(Action::ConfigSet, query, Some(config)).await,
            Some(name) => {
                let mut full = self.config_document().await?;
                full.set_section(name, config.clone());
                let full = full.into_value();
                self.execute(Action::ConfigSet, query, Some(&full)).await
            }
        }
    }

    /// Merge a partial configuration into the current one.
    pub async fn config_patch(&self, patch: &Value) -> Result<ApiResponse> {
        let query = self.write_params.apply(Action::ConfigPatch.query());
        self.execute(Action::ConfigPatch, query, Some(patch)).await
    }

    /// Reload the configuration.
    pub async fn config_reload(&self) -> Result<ApiResponse> {
        self.call(Action::ConfigReload).await
    }

    /// Write a configuration backup on the appliance.
    pub async fn config_backup(&self) -> Result<ApiResponse> {
        self.call(Action::ConfigBackup).await
    }

    /// List configuration backups held on the appliance.
    pub async fn config_backup_list(&self) -> Result<ApiResponse> {
        self.call(Action::ConfigBackupList).await
    }

    /// Restore a configuration backup, e.g. `/cf/conf/backup/config-1530604754.xml`.
    pub async fn config_restore(&self, config_file: &str) -> Result<ApiResponse> {
        let query = Action::ConfigRestore.query().with("config_file", config_file);
        self.execute::<()>(Action::ConfigRestore, query, None).await
    }

    /// Reboot the appliance.
    pub async fn system_reboot(&self) -> Result<ApiResponse> {
        self.call(Action::SystemReboot).await
    }

    /// System statistics.
    pub async fn system_stats(&self) -> Result<ApiResponse> {
        self.call(Action::SystemStats).await
    }

    /// System information.
    pub async fn system_info(&self) -> Result<ApiResponse> {
        self.call(Action::SystemInfo).await
    }

    /// Statistics for a real interface name such as `em0` (not `WAN`/`LAN`).
    pub async fn interface_stats(&self, interface: &str) -> Result<ApiResponse> {
        let query = Action::InterfaceStats.query().with("interface", interface);
        self.execute::<()>(Action::InterfaceStats, query, None).await
    }

    /// Gateway status.
    pub async fn gateway_status(&self) -> Result<ApiResponse> {
        self.call(Action::GatewayStatus).await
    }

    /// Send an event such as `filter reload` or `interface all reload`.
    pub async fn send_event(&self, command: &str) -> Result<ApiResponse> {
        self.execute(Action::SendEvent, Action::SendEvent.query(), Some(&[command]))
            .await
    }

    /// Read all filter rules, or only rule number `rule_number`.
    pub async fn rule_get(&self, rule_number: Option<u32>) -> Result<ApiResponse> {
        let query = Action::RuleGet.query().with_opt("rule_number", rule_number);
        self.execute::<()>(Action::RuleGet, query, None).await
    }

    /// Refresh URL table aliases, optionally only `table`.
    pub async fn alias_update_urltables(&self, table: Option<&str>) -> Result<ApiResponse> {
        let query = Action::AliasUpdateUrltables.query().with_opt("table", table);
        self.execute::<()>(Action::AliasUpdateUrltables, query, None).await
    }

    /// Invoke a PHP function on the appliance.
    pub async fn function_call(&self, call: &FunctionCall) -> Result<ApiResponse> {
        self.execute(Action::FunctionCall, Action::FunctionCall.query(), Some(call))
            .await
    }

    async fn call(&self, action: Action) -> Result<ApiResponse> {
        self.execute::<()>(action, action.query(), None).await
    }

    async fn execute<B>(
        &self,
        action: Action,
        query: ActionQuery,
        body: Option<&B>,
    ) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        let max_retries = self.retry_policy.budget(action.is_read_only());

        let mut attempt = 0;
        loop {
            info!(action = action.as_str(), attempt, "Sending FauxAPI request");

            match self.send_once(action, &query, body).await {
                Ok(response) => {
                    return response
                        .into_result(action)
                        .map_err(|error| report_failure(action, error));
                }
                Err(error) if error.is_transient() && attempt < max_retries => {
                    attempt += 1;
                    let delay = self.retry_policy.delay_for_attempt(attempt);
                    debug!(
                        action = action.as_str(),
                        %error,
                        "Retrying FauxAPI request after {:?}",
                        delay
                    );
                    if !delay.is_zero() {
                        sleep(delay).await;
                    }
                }
                Err(error) => return Err(report_failure(action, error)),
            }
        }
    }

    async fn send_once<B>(
        &self,
        action: Action,
        query: &ActionQuery,
        body: Option<&B>,
    ) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        let mut request = self
            .http
            .request(action.method(), self.base_url.clone())
            .query(query.as_pairs())
            .header("Accept", "application/json")
            .header(AUTH_HEADER, self.credentials.sign_now());

        if let Some(payload) = body {
            request = request.json(payload);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status_to_error(status, text));
        }

        let text = response.text().await?;

        serde_json::from_str::<ApiResponse>(&text).map_err(|err| {
            Error::Parse(format!(
                "Failed to parse FauxAPI response for `{}`: {err}",
                action.as_str()
            ))
        })
    }
}

fn report_failure(action: Action, error: Error) -> Error {
    if error.should_log() {
        warn!(
            action = action.as_str(),
            code = error.error_code(),
            %error,
            "FauxAPI request failed"
        );
    }
    error
}

fn map_status_to_error(status: StatusCode, text: String) -> Error {
    match status {
        StatusCode::NOT_FOUND => {
            Error::NotFound(format!("FauxAPI not found on target host: {text}"))
        }
        StatusCode::BAD_REQUEST => Error::BadRequest(text),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::Unauthorized(format!("FauxAPI authentication failed: {text}"))
        }
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => {
            Error::Unreachable(format!("FauxAPI temporarily unavailable: {text}"))
        }
        status if status.is_server_error() => {
            Error::Unreachable(format!("FauxAPI server error {status}: {text}"))
        }
        _ => Error::Http(format!("FauxAPI error {status}: {text}")),
    }
}
