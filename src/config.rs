use dotenvy::dotenv;
use std::env;

/// Runtime configuration, sourced from the environment.
///
/// Every knob has a default so the service boots with an empty environment;
/// the policy windows are validated because a zero or negative window would
/// silently disable edit/delete authorization.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub bind_addr: String,
    pub cors_allowed_origin: Option<String>,
    /// Minutes after creation during which the sender may edit a message.
    pub edit_window_minutes: i64,
    /// Minutes after creation during which the sender may delete for everyone.
    pub delete_for_everyone_window_minutes: i64,
    pub ws_heartbeat_secs: u64,
    pub ws_client_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, crate::error::AppError> {
        dotenv().ok();

        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".into());
        let cors_allowed_origin = env::var("CORS_ALLOWED_ORIGIN").ok();

        let edit_window_minutes = env::var("EDIT_WINDOW_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(15);
        let delete_for_everyone_window_minutes = env::var("DELETE_FOR_EVERYONE_WINDOW_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        if edit_window_minutes <= 0 {
            return Err(crate::error::AppError::Config(
                "EDIT_WINDOW_MINUTES must be positive".into(),
            ));
        }
        if delete_for_everyone_window_minutes <= 0 {
            return Err(crate::error::AppError::Config(
                "DELETE_FOR_EVERYONE_WINDOW_MINUTES must be positive".into(),
            ));
        }

        let ws_heartbeat_secs = env::var("WS_HEARTBEAT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);
        let ws_client_timeout_secs = env::var("WS_CLIENT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            port,
            bind_addr,
            cors_allowed_origin,
            edit_window_minutes,
            delete_for_everyone_window_minutes,
            ws_heartbeat_secs,
            ws_client_timeout_secs,
        })
    }

    pub fn test_defaults() -> Self {
        Self {
            port: 3000,
            bind_addr: "127.0.0.1".into(),
            cors_allowed_origin: None,
            edit_window_minutes: 15,
            delete_for_everyone_window_minutes: 60,
            ws_heartbeat_secs: 5,
            ws_client_timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_carry_policy_windows() {
        let cfg = Config::test_defaults();
        assert_eq!(cfg.edit_window_minutes, 15);
        assert_eq!(cfg.delete_for_everyone_window_minutes, 60);
        assert!(cfg.ws_heartbeat_secs < cfg.ws_client_timeout_secs);
    }
}
