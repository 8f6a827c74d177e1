use super::Config;
use std::path::PathBuf;

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY")
            && !key.is_empty()
        {
            self.openai_api_key = Some(key);
        }

        if let Ok(flag) = std::env::var("WECHAT")
            && !flag.is_empty()
        {
            self.wechat = Some(flag);
        }

        if let Ok(token) = std::env::var("TELEGRAM")
            && !token.is_empty()
        {
            self.telegram = Some(token);
        }

        if let Ok(url) = std::env::var("CHATBRIDGE_WECHAT_GATEWAY")
            && !url.is_empty()
        {
            self.wechat_gateway.base_url = url;
        }

        if let Ok(path) = std::env::var("CHATBRIDGE_TOKEN_PATH")
            && !path.is_empty()
        {
            self.wechat_gateway.token_path = PathBuf::from(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_env::{ENV_LOCK, EnvVarGuard};

    #[test]
    fn env_overrides_file_values() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _key = EnvVarGuard::set("OPENAI_API_KEY", "sk-env");
        let _wechat = EnvVarGuard::set("WECHAT", "true");
        let _telegram = EnvVarGuard::unset("TELEGRAM");
        let _gateway = EnvVarGuard::set("CHATBRIDGE_WECHAT_GATEWAY", "http://gw:1");
        let _token = EnvVarGuard::set("CHATBRIDGE_TOKEN_PATH", "/tmp/wx.json");

        let mut config = Config {
            openai_api_key: Some("sk-file".into()),
            telegram: Some("123:ABC".into()),
            ..Config::default()
        };
        config.apply_env_overrides();

        assert_eq!(config.openai_api_key(), Some("sk-env"));
        assert_eq!(config.wechat_flag(), Some("true"));
        assert_eq!(config.telegram_flag(), Some("123:ABC"));
        assert_eq!(config.wechat_gateway.base_url, "http://gw:1");
        assert_eq!(config.wechat_gateway.token_path, PathBuf::from("/tmp/wx.json"));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _key = EnvVarGuard::set("OPENAI_API_KEY", "");
        let _wechat = EnvVarGuard::unset("WECHAT");
        let _telegram = EnvVarGuard::unset("TELEGRAM");
        let _gateway = EnvVarGuard::unset("CHATBRIDGE_WECHAT_GATEWAY");
        let _token = EnvVarGuard::unset("CHATBRIDGE_TOKEN_PATH");

        let mut config = Config {
            openai_api_key: Some("sk-file".into()),
            ..Config::default()
        };
        config.apply_env_overrides();

        assert_eq!(config.openai_api_key(), Some("sk-file"));
    }
}
