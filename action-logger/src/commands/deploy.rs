use std::path::Path;

use action_logger_pipeline::deployer::ContractArtifact;
use tracing::warn;

use crate::config::Dependencies;
use crate::errors::AppError;

/// Deploys a fresh `EventLogger` from a compiled artifact.
pub async fn deploy(deps: &Dependencies, artifact: &Path, force: bool) -> Result<(), AppError> {
    if let Some(address) = deps.config.contract_address {
        if !force {
            return Err(AppError::config(format!(
                "CONTRACT_ADDRESS is already set to {address}; pass --force to deploy anyway"
            )));
        }
        warn!(current = %address, "Deploying although a contract is configured");
    }

    let artifact = ContractArtifact::from_path(artifact)?;
    let deployer = deps.deployer()?;
    deps.session.connect().await?;

    println!("Deploying EventLogger, confirm the transaction in your wallet...");
    let address = deployer.deploy(&artifact).await?;

    println!("Deployed at {address}");
    println!("Set CONTRACT_ADDRESS={address} to start logging actions");
    Ok(())
}
