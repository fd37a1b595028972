//! Docker network controller

use crate::{NetworkController, ProviderError, Result};
use async_trait::async_trait;
use bollard::network::CreateNetworkOptions;
use bollard::service::{Ipam, IpamConfig};
use bollard::Docker;
use std::sync::Mutex;

/// A bridge network with a fixed subnet
pub struct DockerNetwork {
    client: Docker,
    /// Last created (or configured) network name; `remove` targets it
    name: Mutex<String>,
}

impl DockerNetwork {
    pub fn new(client: Docker, name: impl Into<String>) -> Self {
        Self {
            client,
            name: Mutex::new(name.into()),
        }
    }

    fn name(&self) -> String {
        self.name.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl NetworkController for DockerNetwork {
    async fn network_create(&self, name: &str, cidr: &str, gateway: &str) -> Result<()> {
        let options = CreateNetworkOptions {
            name,
            driver: "bridge",
            check_duplicate: true,
            ipam: Ipam {
                config: Some(vec![IpamConfig {
                    subnet: Some(cidr.to_string()),
                    gateway: Some(gateway.to_string()),
                    ..Default::default()
                }]),
                ..Default::default()
            },
            ..Default::default()
        };

        self.client
            .create_network(options)
            .await
            .map_err(|e| ProviderError::NetworkError(format!("create {}: {}", name, e)))?;

        tracing::info!("network {} created ({} via {})", name, cidr, gateway);
        *self.name.lock().unwrap_or_else(|e| e.into_inner()) = name.to_string();
        Ok(())
    }

    async fn remove(&self) -> Result<()> {
        let name = self.name();
        match self.client.remove_network(&name).await {
            Ok(()) => {
                tracing::info!("network {} removed", name);
                Ok(())
            }
            Err(e) => {
                let err = ProviderError::from(e);
                if err.is_not_found() {
                    tracing::debug!("network {} not present", name);
                    Ok(())
                } else {
                    Err(ProviderError::NetworkError(format!("remove {}: {}", name, err)))
                }
            }
        }
    }
}
