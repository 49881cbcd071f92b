use clap::Parser;
use stack_inventory::core::{ConfigProvider, Pipeline};
use stack_inventory::utils::{logger, validation::Validate};
use stack_inventory::{InventoryEngine, InventoryPipeline, LocalStorage, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-inventory")]
#[command(about = "Inventory normalizer driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "inventory.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the output format from config (json or yaml)
    #[arg(long)]
    format: Option<String>,

    /// Dry run - show what would be processed without writing output
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    let verbose = args.verbose || config.verbose_logging();
    if config.json_logging() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(format) = args.format {
        tracing::info!("🔧 Output format overridden to: {}", format);
        config.output.format = Some(format);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    display_config_summary(&config, args.dry_run);

    let storage = LocalStorage::new(config.base_dir().to_string());
    let pipeline = InventoryPipeline::new(storage, config);

    if args.dry_run {
        perform_dry_run(&pipeline).await?;
        return Ok(());
    }

    let engine = InventoryEngine::new(pipeline);
    match engine.run().await {
        Ok(output_path) => println!("📁 Output saved to: {}", output_path),
        Err(e) => {
            tracing::error!(
                "❌ Inventory run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, dry_run: bool) {
    println!("📋 Configuration Summary:");
    println!("  Inventory: {}", config.inventory_path());
    if let Some(root_key) = config.root_key() {
        println!("  Root key: {}", root_key);
    }
    println!(
        "  Dictionary: {}",
        config.dictionary_path().unwrap_or("(bundled)")
    );
    println!("  Simple fields: {}", config.simple_fields().join(", "));
    println!(
        "  Output: {} ({})",
        config.output_file(),
        config.output_format().as_str()
    );

    if dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

/// Resolves the inventory and prints the result instead of writing it.
async fn perform_dry_run(
    pipeline: &InventoryPipeline<LocalStorage, TomlConfig>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Dry Run Analysis:");

    let document = pipeline.extract().await?;
    let inventory = pipeline.transform(document).await?;

    for record in inventory.domains() {
        println!("  {} ({} fields)", record.domain, record.len());
        for (field, value) in record.fields() {
            match value.as_services() {
                Some(services) => {
                    let names: Vec<String> = services
                        .iter()
                        .map(|s| {
                            if s.is_group() {
                                format!("{} ({} services)", s.name(), s.children().len())
                            } else {
                                s.name().to_string()
                            }
                        })
                        .collect();
                    println!("    {} -> {}", field, names.join(", "));
                }
                None => println!("    {} (passthrough)", field),
            }
        }
    }

    println!();
    println!(
        "✅ Dry run complete: {} domains, {} services.",
        inventory.len(),
        inventory.service_count()
    );
    Ok(())
}
