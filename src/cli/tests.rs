use super::*;
use crate::core::config::data::Config;
use crate::utils::test_utils::with_test_config;

fn parse_args(argv: &[&str]) -> Args {
    Args::try_parse_from(argv)
        .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
}

fn words(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn no_subcommand_means_chat() {
    let args = parse_args(&["nexus"]);
    assert!(args.command.is_none());
    assert!(args.provider.is_none());
    assert!(args.model.is_none());
}

#[test]
fn global_flags_parse_after_subcommand() {
    let args = parse_args(&["nexus", "chat", "-p", "openrouter", "-m", "vendor/model-x"]);
    assert!(matches!(args.command, Some(Commands::Chat)));
    assert_eq!(args.provider, Some(ProviderKind::OpenRouter));
    assert_eq!(args.model.as_deref(), Some("vendor/model-x"));
}

#[test]
fn unknown_provider_is_rejected() {
    assert!(Args::try_parse_from(["nexus", "--provider", "openai"]).is_err());
}

#[test]
fn say_collects_prompt_words_and_attachments() {
    let args = parse_args(&[
        "nexus", "say", "-a", "cat.png", "--attach", "notes.pdf", "what", "is", "-this",
    ]);
    match args.command {
        Some(Commands::Say { attach, prompt }) => {
            assert_eq!(attach, vec![PathBuf::from("cat.png"), PathBuf::from("notes.pdf")]);
            assert_eq!(prompt, words(&["what", "is", "-this"]));
        }
        _ => panic!("expected say subcommand"),
    }
}

#[test]
fn set_without_key_lists_settings() {
    let args = parse_args(&["nexus", "set"]);
    match args.command {
        Some(Commands::Set { key, value }) => {
            assert!(key.is_none());
            assert!(value.is_empty());
        }
        _ => panic!("expected set subcommand"),
    }
}

#[test]
fn set_keeps_multi_word_values() {
    let args = parse_args(&["nexus", "set", "system-instruction", "Be", "brief."]);
    match args.command {
        Some(Commands::Set { key, value }) => {
            assert_eq!(key.as_deref(), Some("system-instruction"));
            assert_eq!(value, words(&["Be", "brief."]));
        }
        _ => panic!("expected set subcommand"),
    }
}

#[test]
fn auth_requires_a_known_provider() {
    let args = parse_args(&["nexus", "auth", "gemini"]);
    assert!(matches!(
        args.command,
        Some(Commands::Auth {
            provider: ProviderKind::Gemini
        })
    ));
    assert!(Args::try_parse_from(["nexus", "deauth"]).is_err());
}

#[test]
fn set_and_unset_persist_through_registry() {
    with_test_config(|_path| {
        let registry = SettingRegistry::new();

        let message = apply_set(&registry, "provider", &words(&["OpenRouter"])).expect("set");
        assert_eq!(message, "✅ Set provider to: openrouter");
        apply_set(&registry, "thinking-budget", &words(&["4096"])).expect("set budget");
        apply_set(&registry, "system-instruction", &words(&["Be", "brief."])).expect("set text");

        let config = Config::load().expect("load");
        assert_eq!(config.provider, Some(ProviderKind::OpenRouter));
        assert_eq!(config.thinking_budget, Some(4096));
        assert_eq!(config.system_instruction.as_deref(), Some("Be brief."));

        apply_unset(&registry, "provider").expect("unset");
        assert_eq!(Config::load().expect("load").provider, None);
    });
}

#[test]
fn invalid_setting_values_are_reported() {
    with_test_config(|_path| {
        let registry = SettingRegistry::new();

        assert!(matches!(
            apply_set(&registry, "colour", &words(&["blue"])),
            Err(SettingError::UnknownKey(key)) if key == "colour"
        ));
        assert!(matches!(
            apply_set(&registry, "thinking-budget", &words(&["99999"])),
            Err(SettingError::InvalidNumber { key: "thinking-budget", .. })
        ));
        assert!(matches!(
            apply_set(&registry, "provider", &[]),
            Err(SettingError::MissingArgs { .. })
        ));
        assert_eq!(Config::load().expect("load"), Config::default());
    });
}
