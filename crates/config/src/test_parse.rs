#[cfg(test)]
mod tests {
    use crate::*;

    const SAMPLE: &str = r#"{
        "keys": ["1", "2", "up", "down"],
        "log": true,
        "handler": "hotKey",
        "hotKeyConfig": {
            "1": { "describe": "open dialog", "operation": [".open", ".confirm"] },
            "2": { "operation": [[".tab:1"], [".panel", "button=Save"]] },
            "up": { "operation": [".list"], "dynamic": true },
            "down": { "operation": [".list"], "dynamic": true }
        },
        "operationControl": {
            "main": { "control": "ALL" },
            "7": {
                "control": ["1", "2"],
                "dynamicSelector": { "up,down": ".row.active" }
            },
            "odd": { "control": "SOME" }
        },
        "polling": { "delayMs": 5 }
    }"#;

    #[test]
    fn json_sample_parses() {
        let cfg = load_from_str(SAMPLE, Format::Json).unwrap();
        assert_eq!(cfg.combos(), "1, 2, up, down");
        assert!(cfg.log);
        assert_eq!(cfg.handler.as_deref(), Some("hotKey"));
        assert_eq!(cfg.polling.delay_ms, 5);
        assert_eq!(cfg.polling.max_attempts, 60);

        let one = &cfg.hot_key_config["1"];
        assert_eq!(one.describe.as_deref(), Some("open dialog"));
        assert_eq!(
            one.operation,
            Some(Operation::Chain(vec![".open".into(), ".confirm".into()]))
        );
        assert_eq!(cfg.operation("2").unwrap().chains().len(), 2);
        assert!(cfg.hot_key_config["up"].dynamic);
        assert!(cfg.operation("missing").is_none());
    }

    #[test]
    fn control_shapes() {
        let cfg = load_from_str(SAMPLE, Format::Json).unwrap();
        let main = &cfg.operation_control[&FocusId::from("main")];
        assert_eq!(main.control, Some(Control::All));

        let seven = &cfg.operation_control[&FocusId::from(7)];
        assert_eq!(seven.control, Some(Control::keys(["1", "2"])));
        assert!(seven.control.as_ref().unwrap().allows("1"));
        assert!(!seven.control.as_ref().unwrap().allows("z"));

        let odd = &cfg.operation_control[&FocusId::from("odd")];
        assert_eq!(odd.control, Some(Control::Unknown("SOME".into())));
        assert!(!odd.control.as_ref().unwrap().allows("1"));
    }

    #[test]
    fn dynamic_selector_lookup() {
        let entry = PermissionEntry::all()
            .with_dynamic("up,down", ".row.active")
            .with_dynamic("left", ".col");
        assert_eq!(entry.dynamic_selector_for("down"), Some(".row.active"));
        assert_eq!(entry.dynamic_selector_for("left"), Some(".col"));
        assert_eq!(entry.dynamic_selector_for("right"), None);

        let exact = entry.with_dynamic("up", ".first");
        assert_eq!(exact.dynamic_selector_for("up"), Some(".first"));
    }

    #[test]
    fn operation_selectors_flatten_in_order() {
        let op = Operation::Chains(vec![vec![".a".into()], vec![".b".into(), ".c".into()]]);
        assert_eq!(op.selectors().collect::<Vec<_>>(), vec![".a", ".b", ".c"]);
        let single: Operation = vec![".x".to_string()].into();
        assert_eq!(single.chains(), vec![vec![".x".to_string()]]);
    }

    #[test]
    fn ron_config_parses() {
        let ron = r#"(
            keys: ["1"],
            hotKeyConfig: {
                "1": (operation: Some([".a", ".b"])),
            },
            operationControl: {
                3: (control: Some(["1"])),
            },
        )"#;
        let cfg = load_from_str(ron, Format::Ron).unwrap();
        assert_eq!(cfg.keys, vec!["1"]);
        assert!(!cfg.log);
        assert_eq!(cfg.polling, PollSettings::default());
        assert!(cfg.operation_control.contains_key(&FocusId::from("3")));
    }

    #[test]
    fn json_parse_error_has_location() {
        let src = "{\n  \"keys\": [\"1\",\n  \"log\": true\n}";
        let err = load_from_str(src, Format::Json).unwrap_err();
        match &err {
            Error::Parse { line, excerpt, .. } => {
                assert_eq!(*line, 3);
                assert!(excerpt.contains('^'));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(err.pretty().starts_with("Config parse error at line 3"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = load_from_str(r#"{ "hotkeyConfig": {} }"#, Format::Json).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }
}
