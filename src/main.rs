use anyhow::Result;
use pitchdeck::core::config::Config;
use pitchdeck::services::llm::create_llm;
use pitchdeck::services::workflow::WorkflowManager;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            eprintln!("Please ensure 'config.yml' exists with valid LLM settings.");
            return Err(e);
        }
    };

    config.ensure_directories()?;

    let llm = create_llm(&config.llm)?;

    let manager = WorkflowManager::new(config, llm);
    let report = manager.run().await?;

    for path in &report.generated {
        println!("Pitch deck generated: {}", path.display());
    }
    for (file, reason) in &report.rejected {
        println!("Rejected {}: {}", file, reason);
    }
    println!(
        "{} deck(s) generated, {} form(s) rejected",
        report.generated.len(),
        report.rejected.len()
    );

    Ok(())
}
