use anyhow::Result;
use schemars::schema_for;

pub(crate) fn command() -> Result<()> {
    let schema = schema_for!(trailguard_common::TrailguardConfigStore);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
