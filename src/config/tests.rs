use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        logging: LoggingOverrides {
            log_level: Some("debug".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_follow_the_daily_schedule() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.rotation.timezone, chrono_tz::UTC);
    assert_eq!(settings.rotation.platform, "twitter");
    assert!(settings.schedule.enabled);
    assert_eq!(settings.schedule.cron, "0 0 9 * * *");
    assert_eq!(settings.publisher.mode, PublisherMode::X);
    assert_eq!(settings.publisher.timeout, Duration::from_secs(30));
    assert_eq!(settings.generator.mode, GeneratorMode::Disabled);
    assert!(settings.publisher.credentials.is_none());
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        logging: LoggingOverrides {
            log_json: Some(true),
            ..Default::default()
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn unknown_timezone_names_the_key() {
    let mut raw = RawSettings::default();
    raw.rotation.timezone = Some("Mars/Olympus_Mons".into());

    match Settings::from_raw(raw) {
        Err(LoadError::Invalid { key, .. }) => assert_eq!(key, "rotation.timezone"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn malformed_cron_is_rejected_at_load() {
    let mut raw = RawSettings::default();
    raw.schedule.cron = Some("daily".into());

    match Settings::from_raw(raw) {
        Err(LoadError::Invalid { key, .. }) => assert_eq!(key, "schedule.cron"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn partial_credentials_name_the_missing_key() {
    let mut raw = RawSettings::default();
    raw.publisher.api_key = Some("key".into());
    raw.publisher.api_secret = Some("secret".into());
    raw.publisher.access_token = Some("token".into());

    match Settings::from_raw(raw) {
        Err(LoadError::Invalid { key, .. }) => assert_eq!(key, "publisher.access_token_secret"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn legacy_twitter_variables_fill_missing_credentials() {
    let mut raw = RawSettings::default();
    raw.publisher.api_key = Some("from-config".into());
    raw.publisher.apply_legacy_credentials(|key| Some(format!("env:{key}")));

    let settings = Settings::from_raw(raw).expect("valid settings");
    let credentials = settings.publisher.credentials.expect("credentials");

    assert_eq!(credentials.api_key, "from-config");
    assert_eq!(credentials.api_secret, "env:TWITTER_API_SECRET");
    assert_eq!(credentials.access_token_secret, "env:TWITTER_ACCESS_TOKEN_SECRET");
}

#[test]
fn unknown_publisher_mode_is_rejected() {
    let mut raw = RawSettings::default();
    raw.apply_rotation_overrides(&RotationOverrides {
        publisher_mode: Some("mastodon".into()),
        ..Default::default()
    });

    match Settings::from_raw(raw) {
        Err(LoadError::Invalid { key, .. }) => assert_eq!(key, "publisher.mode"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn generator_api_key_is_redacted_in_debug_output() {
    let mut raw = RawSettings::default();
    raw.generator.mode = Some("openai".into());
    raw.generator.api_key = Some("sk-very-secret".into());

    let settings = Settings::from_raw(raw).expect("valid settings");
    let rendered = format!("{:?}", settings.generator);

    assert_eq!(settings.generator.mode, GeneratorMode::OpenAi);
    assert!(!rendered.contains("sk-very-secret"));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["tipbot"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_post_arguments() {
    let args = CliArgs::parse_from([
        "tipbot",
        "post",
        "--database-url",
        "postgres://example",
        "--rotation-timezone",
        "America/New_York",
        "--publisher-mode",
        "log",
    ]);

    match args.command.expect("post command") {
        Command::Post(post) => {
            assert_eq!(post.database.database_url.as_deref(), Some("postgres://example"));
            assert_eq!(
                post.rotation.rotation_timezone.as_deref(),
                Some("America/New_York")
            );
            assert_eq!(post.rotation.publisher_mode.as_deref(), Some("log"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}
