//! The gRPC transport layer (§6), wrapping C9 for wire traffic.

pub mod grpc;

pub use grpc::EntityGrpcService;
