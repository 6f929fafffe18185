//! FauxAPI request and response models.

use fauxapi_core::query::ActionQuery;
use fauxapi_core::Error;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message carried by a successful response envelope.
pub const OK_MESSAGE: &str = "ok";

/// Remote actions understood by FauxAPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Read the configuration.
    ConfigGet,
    /// Replace the configuration.
    ConfigSet,
    /// Merge a partial configuration.
    ConfigPatch,
    /// Reload the configuration from disk.
    ConfigReload,
    /// Write a configuration backup.
    ConfigBackup,
    /// List configuration backups.
    ConfigBackupList,
    /// Restore a configuration backup.
    ConfigRestore,
    /// Reboot the appliance.
    SystemReboot,
    /// System statistics.
    SystemStats,
    /// System information.
    SystemInfo,
    /// Interface statistics.
    InterfaceStats,
    /// Gateway status.
    GatewayStatus,
    /// Trigger a configd/check_reload_status event.
    SendEvent,
    /// Read filter rules.
    RuleGet,
    /// Refresh URL table aliases.
    AliasUpdateUrltables,
    /// Invoke a PHP function on the appliance.
    FunctionCall,
}

impl Action {
    /// Returns the action name used in the `action` query parameter.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigGet => "config_get",
            Self::ConfigSet => "config_set",
            Self::ConfigPatch => "config_patch",
            Self::ConfigReload => "config_reload",
            Self::ConfigBackup => "config_backup",
            Self::ConfigBackupList => "config_backup_list",
            Self::ConfigRestore => "config_restore",
            Self::SystemReboot => "system_reboot",
            Self::SystemStats => "system_stats",
            Self::SystemInfo => "system_info",
            Self::InterfaceStats => "interface_stats",
            Self::GatewayStatus => "gateway_status",
            Self::SendEvent => "send_event",
            Self::RuleGet => "rule_get",
            Self::AliasUpdateUrltables => "alias_update_urltables",
            Self::FunctionCall => "function_call",
        }
    }

    /// Query string carrying only this action.
    #[must_use]
    pub fn query(self) -> ActionQuery {
        ActionQuery::new(self.as_str())
    }

    /// HTTP method used for this action.
    #[must_use]
    pub fn method(&self) -> Method {
        match self {
            Self::ConfigSet | Self::ConfigPatch | Self::SendEvent | Self::FunctionCall => {
                Method::POST
            }
            _ => Method::GET,
        }
    }

    /// True for actions without side effects on the appliance; only these are retried.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        matches!(
            self,
            Self::ConfigGet
                | Self::ConfigBackupList
                | Self::SystemStats
                | Self::SystemInfo
                | Self::InterfaceStats
                | Self::GatewayStatus
                | Self::RuleGet
        )
    }
}

/// Response envelope returned by every action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse {
    /// Call identifier assigned by the appliance.
    #[serde(default)]
    pub callid: String,
    /// Action that was executed.
    #[serde(default)]
    pub action: String,
    /// `ok` on success, otherwise a failure description.
    pub message: String,
    /// Action specific payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ApiResponse {
    /// True when the appliance reported success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.message == OK_MESSAGE
    }

    /// Convert a failure envelope into [`Error::Api`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] if `message` is not `ok`.
    pub fn into_result(self, action: Action) -> Result<Self, Error> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(Error::Api {
                action: action.as_str().to_string(),
                message: self.message,
            })
        }
    }

    /// Take the `data.config` member out of a `config_get` response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the payload has no `config` member.
    pub fn into_config(self) -> Result<Value, Error> {
        match self.data {
            Some(Value::Object(mut data)) => data.remove("config").ok_or_else(|| {
                Error::Parse("config_get response has no `data.config`".to_string())
            }),
            _ => Err(Error::Parse(
                "config_get response has no `data` object".to_string(),
            )),
        }
    }
}

/// Request body for [`Action::FunctionCall`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    /// Name of the PHP function to call.
    pub function: String,
    /// Positional arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<Value>>,
    /// Include files required before the call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes: Option<Vec<String>>,
}

impl FunctionCall {
    /// Call `function` without arguments.
    #[must_use]
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            args: None,
            includes: None,
        }
    }

    /// Set the positional arguments.
    #[must_use]
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = Some(args);
        self
    }

    /// Set the include files.
    #[must_use]
    pub fn with_includes<I, S>(mut self, includes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.includes = Some(includes.into_iter().map(Into::into).collect());
        self
    }
}

/// Query flags for actions that write the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigWriteParams {
    /// Take a backup before writing.
    pub do_backup: bool,
    /// Reload the configuration after writing.
    pub do_reload: bool,
}

impl Default for ConfigWriteParams {
    fn default() -> Self {
        Self {
            do_backup: true,
            do_reload: true,
        }
    }
}

impl ConfigWriteParams {
    /// Add the `do_backup` and `do_reload` flags to `query`.
    #[must_use]
    pub fn apply(&self, query: ActionQuery) -> ActionQuery {
        query
            .with("do_backup", self.do_backup)
            .with("do_reload", self.do_reload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_methods() {
        assert_eq!(Action::ConfigGet.method(), Method::GET);
        assert_eq!(Action::ConfigSet.method(), Method::POST);
        assert_eq!(Action::SendEvent.method(), Method::POST);
        assert_eq!(Action::FunctionCall.method(), Method::POST);
        assert_eq!(Action::RuleGet.as_str(), "rule_get");
        assert!(Action::SystemStats.is_read_only());
        assert!(!Action::ConfigReload.is_read_only());
        assert!(!Action::ConfigSet.is_read_only());
    }

    #[test]
    fn failure_envelope_becomes_api_error() {
        let response: ApiResponse = serde_json::from_value(json!({
            "callid": "5b3b50e8b2a4e",
            "action": "config_restore",
            "message": "config_restore failed"
        }))
        .unwrap();
        let err = response.into_result(Action::ConfigRestore).unwrap_err();
        assert_eq!(
            err,
            Error::Api {
                action: "config_restore".to_string(),
                message: "config_restore failed".to_string()
            }
        );
    }

    #[test]
    fn into_config_extracts_payload() {
        let response: ApiResponse = serde_json::from_value(json!({
            "callid": "1",
            "action": "config_get",
            "message": "ok",
            "data": {"config": {"system": {"hostname": "fw"}}}
        }))
        .unwrap();
        assert_eq!(
            response.into_config().unwrap(),
            json!({"system": {"hostname": "fw"}})
        );
    }

    #[test]
    fn function_call_serialization_skips_unset() {
        let call = FunctionCall::new("get_services");
        assert_eq!(
            serde_json::to_value(&call).unwrap(),
            json!({"function": "get_services"})
        );

        let call = FunctionCall::new("return_gateways_status")
            .with_args(vec![json!(false)])
            .with_includes(["gwlb.inc"]);
        assert_eq!(
            serde_json::to_value(&call).unwrap(),
            json!({
                "function": "return_gateways_status",
                "args": [false],
                "includes": ["gwlb.inc"]
            })
        );
    }

    #[test]
    fn config_write_flags_follow_action() {
        let params = ConfigWriteParams {
            do_backup: false,
            do_reload: true,
        };
        let query = params.apply(Action::ConfigPatch.query());
        assert_eq!(
            query.as_pairs(),
            &[
                ("action", "config_patch".to_string()),
                ("do_backup", "false".to_string()),
                ("do_reload", "true".to_string())
            ]
        );
    }
}
