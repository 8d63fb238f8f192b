// End-to-end tests for the Lexique front end

#[cfg(test)]
mod tests {
    use clap::Parser;
    use lepasserelle::cli::Cli;
    use lepasserelle::{Lexique, ProjectConfig};
    use lerecherche::{SearchOptions, SearchState};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Helper: write a file, creating parent directories
    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    /// Helper: a small mixed-language project
    fn sample_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "src/config/loader.rs",
            "pub struct ConfigLoader { config_path: String }\nlet config_path = default_config;",
        );
        write(
            dir.path(),
            "src/net/http_client.ts",
            "export class HttpClient { private retryCount = 3 }",
        );
        write(dir.path(), "scripts/deploy.py", "deploy_target = 'prod'");
        write(dir.path(), "target/debug/stale.rs", "let config_path = stale_config;");
        dir
    }

    /// Helper: run the CLI against a project
    async fn run(project: &Path, args: &[&str]) -> anyhow::Result<()> {
        let mut argv = vec!["lexique", "-p", project.to_str().unwrap()];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().run().await
    }

    #[tokio::test]
    async fn test_cli_index_then_search() {
        let dir = sample_project();

        run(dir.path(), &["index", "--json"]).await.unwrap();
        run(dir.path(), &["search", "config loader", "--json"]).await.unwrap();
        run(dir.path(), &["status"]).await.unwrap();
        run(dir.path(), &["health"]).await.unwrap();

        let lexique = Lexique::open(dir.path()).unwrap();
        let status = lexique.status().unwrap();
        assert_eq!(status.files, 3);
        assert!(!status.idf_stale);
        assert!(status.last_indexed_at.is_some());
    }

    #[tokio::test]
    async fn test_cli_empty_query_fails() {
        let dir = sample_project();
        assert!(run(dir.path(), &["search", "   "]).await.is_err());
        assert!(run(dir.path(), &["search", "config", "--limit", "0", "--json"])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_cli_clear_then_search_reports_not_indexed() {
        let dir = sample_project();
        let mut config = ProjectConfig::default();
        config.index.auto_reindex = false;
        config.save(dir.path()).unwrap();

        run(dir.path(), &["index"]).await.unwrap();
        run(dir.path(), &["clear"]).await.unwrap();
        run(dir.path(), &["search", "config"]).await.unwrap();

        let lexique = Lexique::open(dir.path()).unwrap();
        let outcome = lexique.search("config", &SearchOptions::default()).unwrap();
        assert_eq!(outcome.state, SearchState::NotIndexed);
    }

    #[tokio::test]
    async fn test_cli_init_config_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        run(dir.path(), &["init-config"]).await.unwrap();
        assert!(dir.path().join(".lexique/config.toml").exists());

        assert!(run(dir.path(), &["init-config"]).await.is_err());
        run(dir.path(), &["init-config", "--force"]).await.unwrap();
    }

    #[test]
    fn test_excluded_dirs_never_indexed() {
        let dir = sample_project();
        let lexique = Lexique::open(dir.path()).unwrap();
        lexique.index(false).unwrap();

        let outcome = lexique
            .search("config path", &SearchOptions::default())
            .unwrap();
        let paths: Vec<_> = outcome.results.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["src/config/loader.rs"]);
    }

    #[test]
    fn test_incremental_edit_and_delete() {
        let dir = sample_project();
        let lexique = Lexique::open(dir.path()).unwrap();
        let first = lexique.index(false).unwrap();
        assert_eq!(first.added, 3);

        write(dir.path(), "scripts/deploy.py", "deploy_target = 'staging'\nretry_count = 5");
        fs::remove_file(dir.path().join("src/net/http_client.ts")).unwrap();

        let second = lexique.index(false).unwrap();
        assert_eq!(second.updated, 1);
        assert_eq!(second.removed, 1);
        assert_eq!(second.unchanged, 1);
        assert!(second.idf_recomputed);

        let outcome = lexique
            .search("retry count", &SearchOptions::default().with_extensions(vec!["py".to_string()]))
            .unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].path, "scripts/deploy.py");
    }

    #[test]
    fn test_filters_from_config_languages() {
        let dir = sample_project();
        let mut config = ProjectConfig::default();
        config.languages.enable_all = false;
        config.languages.enabled = vec!["python".to_string()];

        let lexique = Lexique::with_config(dir.path(), config).unwrap();
        let stats = lexique.index(false).unwrap();
        assert_eq!(stats.added, 1);
    }
}
