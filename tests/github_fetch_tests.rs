use mockito::{Matcher, Server, ServerGuard};
use pretty_assertions::assert_eq;
use repo_analyzer::config::IngestStrategy;
use repo_analyzer::fetchers::fetch_repository;
use repo_analyzer::RepoLocator;
use std::io::Write;

mod common;
use common::test_helpers::*;

fn path(pattern: &str) -> Matcher {
    Matcher::Regex(format!("^{}", pattern))
}

async fn mock_repo(server: &mut ServerGuard) {
    server
        .mock("GET", path("/repos/octo/demo$"))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"name":"demo","default_branch":"main"}"#)
        .create_async()
        .await;
    server
        .mock("GET", path("/repos/octo/demo/git/trees/main$"))
        .match_query(Matcher::UrlEncoded("recursive".into(), "1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"sha":"abc","truncated":false,"tree":[
                {"path":"README.md","type":"blob"},
                {"path":"Cargo.toml","type":"blob"},
                {"path":"src","type":"tree"},
                {"path":"src/main.rs","type":"blob"},
                {"path":"assets/logo.png","type":"blob"}
            ]}"#,
        )
        .create_async()
        .await;
}

async fn mock_file(server: &mut ServerGuard, file: &str, text: &str) -> mockito::Mock {
    server
        .mock("GET", path(&format!("/repos/octo/demo/contents/{}$", regex::escape(file))))
        .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(contents_body(text))
        .create_async()
        .await
}

#[tokio::test]
async fn test_fetches_ranked_files_through_api() {
    setup_test_logger();
    let mut server = Server::new_async().await;
    mock_repo(&mut server).await;
    let readme = mock_file(&mut server, "README.md", "# Demo\nA demo crate.\n").await;
    mock_file(&mut server, "Cargo.toml", "[package]\nname = \"demo\"\n").await;
    mock_file(&mut server, "src/main.rs", "fn main() {\n    println!(\"hi\");\n}\n").await;

    let config = github_config(&server.url());
    let locator = RepoLocator::parse("https://github.com/octo/demo").unwrap();
    let content = fetch_repository(&locator, &config).await.unwrap();

    let mut paths: Vec<&str> = content.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths[0], "README.md");
    paths.sort();
    assert_eq!(paths, vec!["Cargo.toml", "README.md", "src/main.rs"]);

    let main_rs = content.files.iter().find(|f| f.path == "src/main.rs").unwrap();
    assert_eq!(main_rs.content, "fn main() {\n    println!(\"hi\");\n}\n");
    assert_eq!(content.profile.project_type, "rust");
    assert!(content.profile.readme_present);
    readme.assert_async().await;
}

#[tokio::test]
async fn test_unreadable_file_is_skipped() {
    let mut server = Server::new_async().await;
    mock_repo(&mut server).await;
    mock_file(&mut server, "README.md", "# Demo\n").await;
    server
        .mock("GET", path(r"/repos/octo/demo/contents/Cargo\.toml"))
        .with_status(500)
        .create_async()
        .await;
    server
        .mock("GET", path(r"/repos/octo/demo/contents/src/main\.rs"))
        .with_status(404)
        .create_async()
        .await;

    let config = github_config(&server.url());
    let locator = RepoLocator::parse("https://github.com/octo/demo").unwrap();
    let content = fetch_repository(&locator, &config).await.unwrap();

    assert_eq!(content.files.len(), 1);
    assert_eq!(content.files[0].path, "README.md");
}

#[tokio::test]
async fn test_missing_repository_is_fetch_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", path("/repos/octo/missing"))
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;

    let config = github_config(&server.url());
    let locator = RepoLocator::parse("https://github.com/octo/missing").unwrap();
    let err = fetch_repository(&locator, &config).await.unwrap_err();

    assert_eq!(err.kind(), "FetchError");
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn test_rate_limit_is_fetch_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", path("/repos/octo/demo"))
        .with_status(403)
        .with_body(r#"{"message":"API rate limit exceeded"}"#)
        .create_async()
        .await;

    let config = github_config(&server.url());
    let locator = RepoLocator::parse("https://github.com/octo/demo").unwrap();
    let err = fetch_repository(&locator, &config).await.unwrap_err();
    assert!(err.to_string().contains("rate limit"));
}

#[tokio::test]
async fn test_token_is_sent() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", path("/repos/octo/demo"))
        .match_header("authorization", "token s3cret")
        .match_header("accept", "application/vnd.github+json")
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let mut config = github_config(&server.url());
    config.github_token = Some("s3cret".into());
    let locator = RepoLocator::parse("https://github.com/octo/demo").unwrap();

    assert!(fetch_repository(&locator, &config).await.is_err());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_archive_strategy_extracts_zipball() {
    let mut archive = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut archive));
        let options = zip::write::FileOptions::default();
        zip.start_file("octo-demo-abc123/README.md", options).unwrap();
        zip.write_all(b"# Demo\n").unwrap();
        zip.start_file("octo-demo-abc123/package.json", options).unwrap();
        zip.write_all(b"{\"name\":\"demo\"}").unwrap();
        zip.start_file("octo-demo-abc123/index.js", options).unwrap();
        zip.write_all(b"console.log('hi');\n").unwrap();
        zip.finish().unwrap();
    }

    let mut server = Server::new_async().await;
    server
        .mock("GET", path("/repos/octo/demo/zipball"))
        .with_status(200)
        .with_header("content-type", "application/zip")
        .with_body(archive)
        .create_async()
        .await;

    let mut config = github_config(&server.url());
    config.ingest.strategy = IngestStrategy::Archive;
    let locator = RepoLocator::parse("https://github.com/octo/demo").unwrap();
    let content = fetch_repository(&locator, &config).await.unwrap();

    let mut paths: Vec<&str> = content.files.iter().map(|f| f.path.as_str()).collect();
    paths.sort();
    assert_eq!(paths, vec!["README.md", "index.js", "package.json"]);
    assert_eq!(content.profile.project_type, "nodejs");
}

#[tokio::test]
async fn test_file_without_inline_content_is_skipped() {
    let mut server = Server::new_async().await;
    mock_repo(&mut server).await;
    mock_file(&mut server, "README.md", "# Demo\n").await;
    mock_file(&mut server, "src/main.rs", "fn main() {}\n").await;
    server
        .mock("GET", path(r"/repos/octo/demo/contents/Cargo\.toml$"))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"type":"file","size":2097152,"encoding":"none","content":""}"#)
        .create_async()
        .await;

    let config = github_config(&server.url());
    let locator = RepoLocator::parse("https://github.com/octo/demo").unwrap();
    let content = fetch_repository(&locator, &config).await.unwrap();

    let mut paths: Vec<&str> = content.files.iter().map(|f| f.path.as_str()).collect();
    paths.sort();
    assert_eq!(paths, vec!["README.md", "src/main.rs"]);
    assert!(content.files.iter().all(|f| !f.content.is_empty()));
}

#[tokio::test]
async fn test_archive_over_size_limit_is_fetch_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", path("/repos/octo/demo/zipball"))
        .with_status(200)
        .with_header("content-type", "application/zip")
        .with_body(vec![0u8; 4_096])
        .create_async()
        .await;

    let mut config = github_config(&server.url());
    config.ingest.strategy = IngestStrategy::Archive;
    config.ingest.max_archive_bytes = 1_024;
    let locator = RepoLocator::parse("https://github.com/octo/demo").unwrap();
    let err = fetch_repository(&locator, &config).await.unwrap_err();

    assert_eq!(err.kind(), "FetchError");
    assert!(err.to_string().contains("byte limit"));
}
