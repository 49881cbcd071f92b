use anyhow::Result;
use serde_json::Value;
use stack_inventory::core::Pipeline;
use stack_inventory::{
    CliConfig, Dictionary, FieldValue, InventoryEngine, InventoryPipeline, LocalStorage, TomlConfig,
};
use tempfile::TempDir;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn cli_config(output: &str, format: &str) -> CliConfig {
    CliConfig {
        inventory: fixture("multiple.yaml"),
        base_dir: ".".to_string(),
        dictionary: None,
        output: output.to_string(),
        format: format.to_string(),
        root_key: Some("sites".to_string()),
        simple_fields: vec![],
        verbose: false,
        json_logs: false,
    }
}

#[tokio::test]
async fn test_fixture_is_normalized() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    let pipeline = InventoryPipeline::new(storage, cli_config("inventory.json", "json"));

    let document = pipeline.extract().await?;
    let inventory = pipeline.transform(document).await?;

    let domains: Vec<&str> = inventory.domains().iter().map(|d| d.domain.as_str()).collect();
    assert_eq!(
        domains,
        vec![
            "rbbr.io",
            "inem.at",
            "inem.at/jobs",
            "painlessrails.com",
            "app.setyl.com",
            "sitedock.my"
        ]
    );

    let rbbr = inventory.domain("rbbr.io").unwrap();
    assert_eq!(rbbr.services("mail")[0].name(), "gsuite");
    assert_eq!(rbbr.services("registrar")[0].name(), "aws");
    assert_eq!(rbbr.services("dns")[0].name(), "aws");
    assert_eq!(rbbr.services("hosting")[0].name(), "s3");
    assert_eq!(
        rbbr.services("hosting")[0].url(),
        Some("https://s3.amazonaws.com/rbbr.io")
    );

    let painless = inventory.domain("painlessrails.com").unwrap();
    assert_eq!(painless.len(), 7);
    assert_eq!(
        painless.services("repo")[0].url(),
        Some("https://gitlab.com/nemytchenko/projects/painless-rails/painless-rails-group/painless-rails-site")
    );
    assert_eq!(painless.services("repo")[0].name(), "gitlab");
    assert_eq!(painless.services("deploy")[0].name(), "ansible");
    assert_eq!(painless.services("cdn")[0].name(), "cloudlfare");
    assert_eq!(painless.services("cdn")[0].url(), Some("https://cloudflare.com"));
    assert_eq!(painless.services("managed_by")[0].name(), "terraform");

    let setyl = inventory.domain("app.setyl.com").unwrap();
    assert_eq!(
        setyl.get("environment").and_then(FieldValue::as_scalar),
        Some(&Value::String("production".to_string()))
    );
    let hosting = &setyl.services("hosting")[0];
    assert_eq!(hosting.name(), "hosting");
    let children: Vec<&str> = hosting.children().iter().map(|s| s.name()).collect();
    assert_eq!(children, vec!["Frontend", "Api"]);

    let monitoring = &setyl.services("monitoring")[0];
    assert_eq!(monitoring.name(), "Sentry");
    assert_eq!(monitoring.properties().get("plan"), Some(&Value::String("team".to_string())));
    assert!(monitoring.image_url().is_some());

    let ci = &setyl.services("ci")[0];
    let ci_children: Vec<&str> = ci.children().iter().map(|s| s.name()).collect();
    assert_eq!(ci_children, vec!["github", "circleci"]);
    assert!(ci.children()[1].url().is_none());

    let sitedock = inventory.domain("sitedock.my").unwrap();
    let fields: Vec<&str> = sitedock.field_names().collect();
    assert_eq!(fields, vec!["registrar", "bought_at"]);
    assert_eq!(
        sitedock
            .get("bought_at")
            .and_then(FieldValue::as_timestamp)
            .map(|ts| ts.to_string()),
        Some("2025-04-01 01:27:35".to_string())
    );

    let hosting_names: Vec<&str> = inventory
        .services_by_type("hosting")
        .iter()
        .map(|s| s.name())
        .collect();
    assert_eq!(hosting_names, vec!["s3", "hetzner", "carrd", "s3", "hosting"]);

    Ok(())
}

#[tokio::test]
async fn test_engine_writes_json_output() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    let engine = InventoryEngine::new(InventoryPipeline::new(
        storage,
        cli_config("out/inventory.json", "json"),
    ));

    let output_path = engine.run().await?;
    assert_eq!(output_path, "out/inventory.json");

    let written = tokio::fs::read_to_string(temp_dir.path().join("out/inventory.json")).await?;
    let json: Value = serde_json::from_str(&written)?;

    let domains: Vec<&String> = json.as_object().unwrap().keys().collect();
    assert_eq!(domains.first().map(|d| d.as_str()), Some("rbbr.io"));
    assert_eq!(json["inem.at"]["project"], "personal");
    assert_eq!(json["inem.at"]["hosting"][0]["service"], "hetzner");
    assert_eq!(json["inem.at/jobs"]["hosting"][0]["url"], "https://carrd.co");
    assert_eq!(json["sitedock.my"]["bought_at"], "2025-04-01T01:27:35");
    assert_eq!(
        json["app.setyl.com"]["hosting"][0]["children"][1]["url"],
        "https://api.setyl.herokuapp.com"
    );
    assert!(json["app.setyl.com"]["hosting"][0]["children"][0]
        .get("children")
        .is_none());

    Ok(())
}

#[tokio::test]
async fn test_toml_config_with_custom_dictionary() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let base = temp_dir.path();

    tokio::fs::write(
        base.join("sites.json"),
        r#"{"shop.example": {"hosting": "https://shop.myhost.example.net/store", "dns": "acme-dns", "owner": "ops"}}"#,
    )
    .await?;
    tokio::fs::write(
        base.join("providers.yml"),
        "myhost:\n  name: MyHost\n  url_pattern: myhost\\.example\\.net\nacmedns:\n  aliases: acme-dns\n  url: https://dns.acme.example\n",
    )
    .await?;
    tokio::fs::write(
        base.join("inventory.toml"),
        format!(
            r#"
[inventory]
path = "sites.json"
base_dir = "{}"

[dictionary]
path = "{}"

[fields]
simple = ["owner"]

[output]
path = "result.yaml"
format = "yaml"
"#,
            base.to_str().unwrap().replace('\\', "/"),
            base.join("providers.yml").to_str().unwrap().replace('\\', "/"),
        ),
    )
    .await?;

    let config = TomlConfig::from_file(base.join("inventory.toml"))?;
    let storage = LocalStorage::new(config.base_dir().to_string());
    let pipeline = InventoryPipeline::new(storage, config);
    assert_eq!(pipeline.dictionary().len(), 2);

    let output_path = InventoryEngine::new(pipeline).run().await?;
    let written = tokio::fs::read_to_string(base.join(&output_path)).await?;
    let yaml: Value = serde_yaml::from_str(&written)?;

    assert_eq!(yaml["shop.example"]["hosting"][0]["service"], "MyHost");
    assert_eq!(yaml["shop.example"]["dns"][0]["service"], "acme-dns");
    assert_eq!(yaml["shop.example"]["dns"][0]["url"], "https://dns.acme.example");
    assert_eq!(yaml["shop.example"]["owner"], "ops");

    Ok(())
}

#[tokio::test]
async fn test_missing_dictionary_degrades_to_url_names() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    let mut config = cli_config("inventory.json", "json");
    config.dictionary = Some("does-not-exist.yml".to_string());

    let pipeline = InventoryPipeline::new(storage, config);
    assert!(pipeline.dictionary().is_empty());

    let document = pipeline.extract().await?;
    let inventory = pipeline.transform(document).await?;
    let rbbr = inventory.domain("rbbr.io").unwrap();
    // Without providers an unmatched URL takes the field name.
    assert_eq!(rbbr.services("hosting")[0].name(), "hosting");
    assert!(rbbr.services("registrar")[0].url().is_none());

    Ok(())
}

#[tokio::test]
async fn test_missing_inventory_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    let mut config = cli_config("inventory.json", "json");
    config.inventory = "absent.yml".to_string();

    let err = InventoryEngine::new(InventoryPipeline::with_dictionary(
        storage,
        config,
        std::sync::Arc::new(Dictionary::empty()),
    ))
    .run()
    .await
    .unwrap_err();

    assert!(matches!(err, stack_inventory::InventoryError::IoError(_)));
}
