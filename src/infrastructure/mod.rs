// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod http_response;
pub mod ndjson_stream;
pub mod rpc_client;
pub mod rpc_repository;
pub mod wire;
