//! Entity mesh server
//!
//! Main entry point for the polyglot entity service's gRPC server.

use std::sync::Arc;

use tonic::transport::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use entity_mesh::config::ServiceConfig;
use entity_mesh::dispatcher::{
    AttributeDispatcher, InMemoryAttributeBodyStore, InMemoryAttributeLookupStore,
};
use entity_mesh::proto::entity_service_server::EntityServiceServer;
use entity_mesh::server::EntityGrpcService;
use entity_mesh::service::EntityService;
use entity_mesh::store::{InMemoryDocumentStore, InMemoryGraphStore, RelationalStore};
use entity_mesh::tabular::TabularEngine;

/// Default configuration path
const DEFAULT_CONFIG_PATH: &str = "config/entity_mesh.yaml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "entity_mesh=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting entity mesh server");

    let config_path =
        std::env::var("ENTITY_MESH_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    tracing::info!(path = %config_path, "Loading configuration");
    let config = ServiceConfig::from_file(&config_path)?;

    let database_url = config.database_url()?;
    tracing::info!("Connecting to relational store");
    let relational = Arc::new(
        RelationalStore::connect_with(
            &database_url,
            config.relational.max_connections,
            config.relational.min_connections,
            config.relational.idle_timeout_secs,
            config.relational.max_lifetime_secs,
        )
        .await?,
    );

    let graph = Arc::new(InMemoryGraphStore::new());
    let document = Arc::new(InMemoryDocumentStore::new());
    let tabular = Arc::new(TabularEngine::new(relational));
    let dispatcher = Arc::new(AttributeDispatcher::new(
        Arc::new(InMemoryAttributeLookupStore::new()),
        Arc::new(InMemoryAttributeBodyStore::new()),
        tabular,
    ));

    let service = EntityService::new(graph, document, dispatcher);
    let grpc_service = EntityGrpcService::new(service);

    let addr = config.bind_addr()?;
    tracing::info!(%addr, "Starting gRPC server");

    Server::builder()
        .timeout(std::time::Duration::from_secs(
            config.service.request_timeout_secs,
        ))
        .add_service(EntityServiceServer::new(grpc_service))
        .serve(addr)
        .await?;

    Ok(())
}
