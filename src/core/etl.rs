use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct InventoryEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> InventoryEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting inventory normalization...");

        tracing::info!("Extracting inventory...");
        let document = self.pipeline.extract().await?;
        let domain_count = document.as_object().map(|domains| domains.len()).unwrap_or(0);
        tracing::info!("Extracted {} domains", domain_count);

        tracing::info!("Resolving services...");
        let inventory = self.pipeline.transform(document).await?;
        tracing::info!(
            "Resolved {} services across {} domains",
            inventory.service_count(),
            inventory.len()
        );

        tracing::info!("Writing result...");
        let output_path = self.pipeline.load(inventory).await?;
        tracing::info!("Output saved to: {}", output_path);

        Ok(output_path)
    }
}
