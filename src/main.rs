use ragserve::{api, blobstore, config, embedding, generation, loader, logging, pipeline, qdrant};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    config::init_config();
    logging::init_tracing();

    let coordinator = Arc::new(build_coordinator().expect("Failed to construct pipeline"));
    coordinator.initialize().await;
    let app = api::create_router(coordinator);

    let (listener, port) = bind_listener().await.expect("Failed to bind listener");
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await.unwrap();
}

fn build_coordinator() -> anyhow::Result<pipeline::PipelineCoordinator> {
    let config = config::get_config();

    let blob_client = blobstore::BlobContainerClient::new()?;
    let source = Arc::new(loader::DocumentLoader::new(blob_client));

    let embedder = Arc::new(embedding::OllamaEmbedder::new(
        config.ollama_url.clone(),
        config.embedding_model.clone(),
    ));
    let generator = Arc::new(generation::OllamaGenerator::new(
        config.ollama_url.clone(),
        config.generation_model.clone(),
    ));

    let qdrant = Arc::new(qdrant::QdrantService::new()?);
    let index = Arc::new(pipeline::QdrantIndex::new(
        qdrant,
        config.qdrant_collection_name.clone(),
        config.embedding_dimension as u64,
    ));

    let settings = pipeline::PipelineSettings {
        chunk_size: config.chunk_size,
        chunk_overlap: config.chunk_overlap,
        embedding_dimension: config.embedding_dimension,
        top_k: config.search_top_k,
        score_threshold: config.search_score_threshold,
        sampling: generation::SamplingParams {
            max_tokens: config.generation_max_tokens,
            temperature: config.generation_temperature,
            top_p: config.generation_top_p,
        },
    };

    Ok(pipeline::PipelineCoordinator::new(
        source, embedder, generator, index, settings,
    ))
}

async fn bind_listener() -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    let config = config::get_config();
    if let Some(port) = config.server_port {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 8000..=8099;
    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "No available port found in range 8000-8099",
    ))
}
