#[cfg(test)]
mod tests {
    use crate::*;
    use std::path::Path;

    fn with_key(key: &str, kc: KeyConfig) -> Config {
        let mut cfg = Config::default();
        cfg.hot_key_config.insert(key.to_string(), kc);
        cfg
    }

    fn validation_message(cfg: &Config) -> String {
        match cfg.validate() {
            Err(Error::Validation { message, .. }) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn empty_chains_and_selectors_rejected() {
        let cfg = with_key(
            "1",
            KeyConfig {
                operation: Some(Operation::Chain(vec![])),
                ..KeyConfig::default()
            },
        );
        assert!(validation_message(&cfg).contains("chain 0 is empty"));

        let cfg = with_key(
            "1",
            KeyConfig {
                operation: Some(Operation::Chains(vec![vec![".a".into()], vec![" ".into()]])),
                ..KeyConfig::default()
            },
        );
        assert!(validation_message(&cfg).contains("chain 1 step 0"));

        let cfg = with_key(
            "1",
            KeyConfig {
                operation: Some(Operation::Chains(vec![])),
                ..KeyConfig::default()
            },
        );
        assert!(validation_message(&cfg).contains("empty operation"));
    }

    #[test]
    fn dynamic_key_needs_a_selector_somewhere() {
        let mut cfg = with_key(
            "up",
            KeyConfig {
                operation: Some(vec![".list".to_string()].into()),
                dynamic: true,
                ..KeyConfig::default()
            },
        );
        assert!(validation_message(&cfg).contains("dynamic"));

        cfg.operation_control.insert(
            FocusId::from(1),
            PermissionEntry::all().with_dynamic("up, down", ".row"),
        );
        cfg.validate().unwrap();
    }

    #[test]
    fn blank_keys_and_zero_delay_rejected() {
        let cfg = Config {
            keys: vec!["1".into(), "  ".into()],
            ..Config::default()
        };
        assert!(validation_message(&cfg).contains("empty key combo"));

        let cfg = Config {
            polling: PollSettings {
                delay_ms: 0,
                max_attempts: 3,
            },
            ..Config::default()
        };
        assert!(validation_message(&cfg).contains("delayMs"));
    }

    #[test]
    fn validation_errors_render_with_path() {
        let err = Error::validation("bad").with_path(Path::new("/tmp/c.json"));
        assert_eq!(err.pretty(), "Config validation error at /tmp/c.json\nbad");
        assert_eq!(err.path(), Some(Path::new("/tmp/c.json")));
    }
}
