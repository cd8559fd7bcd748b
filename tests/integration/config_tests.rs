use figment::Jail;
use rowdupe::config::{Config, ConfigError};
use rowdupe::duplicates::GroupOrder;
use std::path::Path;

#[test]
fn test_config_load_defaults() {
    Jail::expect_with(|_jail| {
        let config = Config::from_figment(Config::figment(None)).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.display_width, 36);
        assert_eq!(config.group_order, GroupOrder::FirstSeen);
        Ok(())
    });
}

#[test]
fn test_config_load_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "rowdupe.toml",
            r#"
threads = 2
display_width = 20
group_order = "digest"
hints_file = "pk.json"
delimiter = ";"
allow_schema_mismatch = true
"#,
        )?;

        let config = Config::load(Some(Path::new("rowdupe.toml"))).unwrap();

        assert_eq!(config.threads, 2);
        assert_eq!(config.display_width, 20);
        assert_eq!(config.group_order, GroupOrder::Digest);
        assert_eq!(config.hints_file.as_deref(), Some(Path::new("pk.json")));
        assert_eq!(config.delimiter_byte().unwrap(), b';');
        assert!(config.allow_schema_mismatch);
        Ok(())
    });
}

#[test]
fn test_config_env_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_file("rowdupe.toml", "threads = 2\ndisplay_width = 20\n")?;
        jail.set_env("ROWDUPE_THREADS", "8");
        jail.set_env("ROWDUPE_DELIMITER", "tab");

        let config = Config::load(Some(Path::new("rowdupe.toml"))).unwrap();

        assert_eq!(config.threads, 8);
        assert_eq!(config.display_width, 20);
        assert_eq!(config.delimiter_byte().unwrap(), b'\t');
        Ok(())
    });
}

#[test]
fn test_config_numeric_delimiter() {
    Jail::expect_with(|jail| {
        jail.create_file("digit.toml", "delimiter = 7\n")?;
        let config = Config::load(Some(Path::new("digit.toml"))).unwrap();
        assert_eq!(config.delimiter_byte().unwrap(), b'7');

        jail.set_env("ROWDUPE_DELIMITER", "1");
        let config = Config::from_figment(Config::figment(None)).unwrap();
        assert_eq!(config.delimiter, "1");
        assert_eq!(config.delimiter_byte().unwrap(), b'1');

        jail.set_env("ROWDUPE_DELIMITER", "12");
        assert!(matches!(
            Config::from_figment(Config::figment(None)),
            Err(ConfigError::InvalidDelimiter(_))
        ));
        Ok(())
    });
}

#[test]
fn test_config_invalid_values() {
    Jail::expect_with(|jail| {
        jail.create_file("zero.toml", "display_width = 0\n")?;
        jail.create_file("delim.toml", "delimiter = \"::\"\n")?;
        jail.create_file("type.toml", "threads = \"many\"\n")?;

        assert!(matches!(
            Config::load(Some(Path::new("zero.toml"))),
            Err(ConfigError::InvalidWidth(0))
        ));
        assert!(matches!(
            Config::load(Some(Path::new("delim.toml"))),
            Err(ConfigError::InvalidDelimiter(_))
        ));
        assert!(matches!(
            Config::load(Some(Path::new("type.toml"))),
            Err(ConfigError::Load(_))
        ));
        Ok(())
    });
}

#[test]
fn test_config_invalid_toml() {
    Jail::expect_with(|jail| {
        jail.create_file("bad.toml", "threads = = 1")?;
        assert!(Config::load(Some(Path::new("bad.toml"))).is_err());
        Ok(())
    });
}

#[test]
fn test_config_save_round_trip() {
    Jail::expect_with(|jail| {
        let config = Config {
            threads: 3,
            group_order: GroupOrder::Digest,
            ..Config::default()
        };
        jail.create_file("saved.toml", &toml::to_string_pretty(&config).unwrap())?;

        let loaded = Config::load(Some(Path::new("saved.toml"))).unwrap();
        assert_eq!(loaded, config);
        Ok(())
    });
}
