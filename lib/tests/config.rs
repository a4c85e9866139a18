use std::env;

#[test]
fn test_config() {
    env::set_var(
        "CONFIG_PATH",
        concat!(env!("CARGO_MANIFEST_DIR"), "/../config.toml"),
    );
    let config = lib::config::load().unwrap();
    assert_eq!(config.database.url.scheme(), "postgres");
    assert!(config.database.max_connections.is_none());

    let database = lib::config::load_database_config().unwrap();
    assert_eq!(database.url, config.database.url);
    assert_eq!(database.connect_timeout, config.database.connect_timeout);

    env::set_var(
        "CONFIG_PATH",
        concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"),
    );
    assert!(lib::config::load().is_err());
}
