//! Integration tests for confsync

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use mockito::{Mock, Server, ServerGuard};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// Command isolated from the user's config file and cache directory
    fn confsync(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("confsync");
        cmd.env_remove("RUST_LOG")
            .env_remove("CONFSYNC_APP_ID")
            .env_remove("CONFSYNC_SERVER_URL")
            .env_remove("CONFSYNC_AUTHORIZATION")
            .arg("--config")
            .arg(temp.path().join("config.toml"))
            .arg("--cache-dir")
            .arg(temp.path().join("cache"));
        cmd
    }

    /// Mock config service answering every route of `ROUTES`
    fn serve() -> (ServerGuard, Vec<Mock>) {
        let mut server = Server::new();
        let mocks = ROUTES
            .iter()
            .map(|(path, body)| {
                server
                    .mock("GET", *path)
                    .with_status(200)
                    .with_header("content-type", "application/json")
                    .with_body(*body)
                    .create()
            })
            .collect();
        (server, mocks)
    }

    const ROUTES: &[(&str, &str)] = &[
        (
            "/apps/test/clusters/default/namespaces",
            r#"[{"namespaceName":"application","id":1},{"namespaceName":"db","id":2}]"#,
        ),
        (
            "/apps/test/clusters/default/namespaces/application/releases/latest",
            r#"{"releaseKey":"r1","configurations":"{\"timeout\":\"60\"}"}"#,
        ),
        (
            "/apps/test/clusters/default/namespaces/db/releases/latest",
            r#"{"releaseKey":"d1","configurations":{"host":"pg","port":5432}}"#,
        ),
        ("/apps/test/clusters", r#"[{"name":"default"},{"name":"SHAJQ"}]"#),
    ];

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        confsync(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "configuration cache kept in sync with a remote config service",
            ));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        confsync(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("confsync"));
    }

    #[test]
    fn get_unreachable_server_prints_default() {
        let temp = TempDir::new().unwrap();
        confsync(&temp)
            .args(["get", "timeout", "--default", "30"])
            .args(["--app-id", "test", "--server-url", "http://127.0.0.1:1"])
            .assert()
            .success()
            .stdout("30\n");
    }

    #[test]
    fn get_missing_key_without_default_fails() {
        let temp = TempDir::new().unwrap();
        confsync(&temp)
            .args(["get", "timeout"])
            .args(["--app-id", "test", "--server-url", "http://127.0.0.1:1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not found"));
    }

    #[test]
    fn get_without_app_id_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        confsync(&temp)
            .args(["get", "timeout", "--default", "30"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("app_id"));
    }

    #[test]
    fn get_reads_served_value() {
        let temp = TempDir::new().unwrap();
        let (server, _mocks) = serve();
        let url = server.url();
        confsync(&temp)
            .args(["get", "timeout", "--default", "30"])
            .args(["--app-id", "test", "--server-url", url.as_str()])
            .assert()
            .success()
            .stdout("60\n");
    }

    #[test]
    fn get_falls_back_to_local_record_when_server_is_gone() {
        let temp = TempDir::new().unwrap();
        let (server, _mocks) = serve();
        let url = server.url();
        confsync(&temp)
            .args(["get", "host", "--namespace", "db"])
            .args(["--app-id", "test", "--server-url", url.as_str()])
            .assert()
            .success()
            .stdout("pg\n");
        drop(server);

        assert!(temp
            .path()
            .join("cache")
            .join("test_configuration_db.txt")
            .exists());

        confsync(&temp)
            .args(["get", "host", "--namespace", "db"])
            .args(["--app-id", "test", "--server-url", "http://127.0.0.1:1"])
            .assert()
            .success()
            .stdout("pg\n");
    }

    #[test]
    fn dump_plain_lists_every_namespace() {
        let temp = TempDir::new().unwrap();
        let (server, _mocks) = serve();
        let url = server.url();
        confsync(&temp)
            .args(["dump", "--format", "plain"])
            .args(["--app-id", "test", "--server-url", url.as_str()])
            .assert()
            .success()
            .stdout("application.timeout=60\ndb.host=pg\ndb.port=5432\n");
    }

    #[test]
    fn clusters_lists_names() {
        let temp = TempDir::new().unwrap();
        let (server, _mocks) = serve();
        let url = server.url();
        confsync(&temp)
            .arg("clusters")
            .args(["--app-id", "test", "--server-url", url.as_str()])
            .assert()
            .success()
            .stdout(predicate::str::contains("default").and(predicate::str::contains("SHAJQ")));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        confsync(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        confsync(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[client]"));
    }

    #[test]
    fn config_init_then_show_reads_file() {
        let temp = TempDir::new().unwrap();
        confsync(&temp).args(["config", "init"]).assert().success();
        assert!(temp.path().join("config.toml").exists());

        confsync(&temp)
            .args(["config", "show", "--app-id", "billing"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#"app_id = "billing""#));
    }

    #[test]
    fn invalid_config_file_fails() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.toml"), "[client\n").unwrap();
        confsync(&temp)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }
}
