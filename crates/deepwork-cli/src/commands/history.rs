use crate::common::open_engine;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine()?;
    let report = engine.history().await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
